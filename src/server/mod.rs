//! The user-facing JSON web server. It accepts image uploads, hands them to
//! the `Classifier` and reports the result (or a uniform error envelope).

use crate::classifier::{ClassifyError, Classifier};
use actix_multipart::MultipartError;
use actix_web::error::BlockingError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use anyhow::anyhow;

mod protocol;
pub mod routes;

pub use protocol::{ErrorBody, PredictResponse};

/// Shared, read-only state handed to every request
pub struct AppState {
    pub classifier: Classifier,
    pub max_upload_bytes: usize,
}

/// Any failure while serving a request. Rendered as `{"error": <message>}`
/// with a 500 status
#[derive(Debug)]
pub struct WebError {
    err: anyhow::Error,
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody::new(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> WebError {
        WebError { err }
    }
}

impl From<ClassifyError> for WebError {
    fn from(err: ClassifyError) -> Self {
        WebError { err: anyhow!(err) }
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        WebError {
            err: anyhow!("failed to read upload: {err}"),
        }
    }
}

impl From<BlockingError> for WebError {
    fn from(err: BlockingError) -> Self {
        WebError { err: anyhow!(err) }
    }
}
