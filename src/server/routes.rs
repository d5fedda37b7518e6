//! HTTP routes: the upload page and the prediction endpoint

use super::{AppState, ErrorBody, PredictResponse, WebError};
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentType};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use anyhow::anyhow;
use image::RgbImage;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

type Result<T> = std::result::Result<T, WebError>;

/// Multipart field the image is uploaded under
pub const FILE_FIELD: &str = "file";

pub const NO_FILE_UPLOADED: &str = "No file uploaded";

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// The upload page
#[get("/")]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

/// Classify an uploaded image
#[post("/predict")]
pub async fn predict(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> impl Responder {
    match run_predict(req, payload, state).await {
        Ok(Some(response)) => HttpResponse::Ok().json(response),
        // Missing upload is reported to the caller, not treated as a failure
        Ok(None) => HttpResponse::Ok().json(ErrorBody::new(NO_FILE_UPLOADED)),
        Err(e) => {
            error!("error in predict route: {e}");
            actix_web::ResponseError::error_response(&e)
        }
    }
}

async fn run_predict(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<Option<PredictResponse>> {
    let Some(upload) = read_upload(&req, payload, state.max_upload_bytes).await? else {
        debug!("predict request without a file");
        return Ok(None);
    };

    // Decode off the async workers
    let image: RgbImage = web::block(move || image::load_from_memory(&upload))
        .await?
        .map_err(|e| anyhow!("failed to decode image: {e}"))?
        .to_rgb8();

    let result = state.classifier.classify(&image).await?;
    info!(
        prediction = %result.category,
        confidence = result.confidence,
        "served predict request"
    );

    Ok(Some(result.into()))
}

/// Pull the bytes of the `file` field out of a multipart body. Returns
/// `None` if the body is not multipart or has no such field.
async fn read_upload(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<Option<Vec<u8>>> {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(is_multipart_form)
        .unwrap_or(false);
    if !is_form {
        return Ok(None);
    }

    let mut multipart = Multipart::new(req.headers(), payload);
    while let Some(field) = multipart.next().await {
        let field = field?;
        if field.content_disposition().get_name() == Some(FILE_FIELD) {
            return read_field(field, limit).await.map(Some);
        }
        // Other fields are drained by the next call to `next`
    }

    Ok(None)
}

/// A `multipart/form-data` content type that carries a boundary. Without
/// one the body cannot hold any parts, so it is treated as an empty form.
fn is_multipart_form(content_type: &str) -> bool {
    let mut params = content_type.split(';').map(str::trim);
    let is_form = params
        .next()
        .map(|essence| essence.eq_ignore_ascii_case("multipart/form-data"))
        .unwrap_or(false);

    is_form
        && params.any(|param| {
            param
                .split_once('=')
                .map(|(name, value)| {
                    name.trim().eq_ignore_ascii_case("boundary")
                        && !value.trim().trim_matches('"').is_empty()
                })
                .unwrap_or(false)
        })
}

async fn read_field(mut field: Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = web::BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            return Err(anyhow!("uploaded file exceeds the {limit} byte limit").into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes.to_vec())
}
