//! Waste classification on top of a hosted multimodal model

use crate::category::{Category, UnknownCategory};
use crate::reply;
use async_trait::async_trait;
use image::{ImageOutputFormat, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::{debug, error, info};

/// Value every category starts at before the prediction is written in
pub const FILLER: f64 = 0.1;

/// The mime type images are sent to the model as
pub const IMAGE_MIME: &str = "image/png";

pub const PROMPT: &str = r#"Analyze this waste item image and classify it into ONE of these categories:
battery, biological, cardboard, clothes, glass, metal, paper, plastic, shoes, trash

Provide ONLY a JSON response in this exact format:
{
    "category": "category_name",
    "confidence": 0.95,
    "explanation": "brief explanation"
}"#;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("model request failed: {0}")]
    ModelTransport(String),

    /// `raw` is kept for logging; it is not part of the message
    #[error("invalid response format: {reason}")]
    Parse { reason: String, raw: String },

    #[error("model predicted an {0}")]
    UnknownCategory(#[from] UnknownCategory),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        ClassifyError::ModelTransport(err.to_string())
    }
}

/// A hosted model that answers a text prompt about an image
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send `prompt` and the encoded `image` and return the full reply text
    async fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ClassifyError>;
}

/// Per-category scores summing to 1.
///
/// This is a display heuristic, not a calibrated probability: the model only
/// reports one confidence, which is placed on the predicted category while
/// every other category gets `FILLER`, and the vector is then normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution(BTreeMap<Category, f64>);

impl Distribution {
    /// The unnormalized scores: `FILLER` everywhere, `confidence` at `predicted`
    pub fn raw(predicted: Category, confidence: f64) -> BTreeMap<Category, f64> {
        let mut scores: BTreeMap<Category, f64> =
            Category::ALL.into_iter().map(|c| (c, FILLER)).collect();
        scores.insert(predicted, confidence);
        scores
    }

    pub fn synthesize(predicted: Category, confidence: f64) -> Self {
        let mut scores = Self::raw(predicted, confidence);
        let total: f64 = scores.values().sum();
        scores.values_mut().for_each(|v| *v /= total);
        Distribution(scores)
    }

    pub fn get(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(c, p)| (*c, *p))
    }
}

/// The outcome of classifying one image
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: Category,
    /// As reported by the model, in [0, 1]
    pub confidence: f64,
    pub explanation: String,
    pub distribution: Distribution,
}

/// Classifies images by asking a `GenerativeModel`
pub struct Classifier {
    model: Box<dyn GenerativeModel>,
}

impl Classifier {
    pub fn new(model: Box<dyn GenerativeModel>) -> Self {
        Classifier { model }
    }

    pub async fn classify(&self, image: &RgbImage) -> Result<ClassificationResult, ClassifyError> {
        let png = encode_png(image)?;
        debug!(
            width = image.width(),
            height = image.height(),
            bytes = png.len(),
            "sending image to model"
        );

        let raw = self.model.generate(PROMPT, &png, IMAGE_MIME).await?;

        let reply = reply::parse(&raw).map_err(|e| {
            error!(raw = %raw, "error parsing model response: {e}");
            ClassifyError::Parse {
                reason: e.to_string(),
                raw: raw.clone(),
            }
        })?;

        if !reply.confidence.is_finite() || !(0.0..=1.0).contains(&reply.confidence) {
            error!(raw = %raw, "model reported confidence out of range");
            return Err(ClassifyError::Parse {
                reason: format!("confidence {} is outside [0, 1]", reply.confidence),
                raw,
            });
        }

        let category: Category = reply.category.trim().to_lowercase().parse()?;
        let distribution = Distribution::synthesize(category, reply.confidence);

        info!(%category, confidence = reply.confidence, "classified image");

        Ok(ClassificationResult {
            category,
            confidence: reply.confidence,
            explanation: reply.explanation,
            distribution,
        })
    }
}

/// Losslessly re-encode a decoded bitmap for the model request
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ClassifyError> {
    let mut bytes: Vec<u8> = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}
