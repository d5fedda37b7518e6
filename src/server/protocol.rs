use crate::category::Category;
use crate::classifier::ClassificationResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Body of a successful `/predict` response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Category,
    /// Percent, two decimals
    pub confidence: f64,
    pub suggestion: &'static str,
    pub explanation: String,
    /// Percent per category, two decimals
    pub probabilities: BTreeMap<Category, f64>,
}

impl From<ClassificationResult> for PredictResponse {
    fn from(result: ClassificationResult) -> Self {
        PredictResponse {
            prediction: result.category,
            confidence: percent(result.confidence),
            suggestion: result.category.suggestion(),
            explanation: result.explanation,
            probabilities: result
                .distribution
                .iter()
                .map(|(category, p)| (category, percent(p)))
                .collect(),
        }
    }
}

/// `{"error": ...}`, the body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
        }
    }
}

/// A fraction in [0, 1] as a percentage rounded to two decimals
fn percent(fraction: f64) -> f64 {
    (fraction * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Distribution;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.92), 92.0);
        assert_eq!(percent(1.0), 100.0);
        assert_eq!(percent(0.0), 0.0);
        assert_eq!(percent(0.123456), 12.35);
        assert_eq!(percent(0.1 / 1.82), 5.49);
    }

    #[test]
    fn test_predict_response_json() {
        let result = ClassificationResult {
            category: Category::Plastic,
            confidence: 0.92,
            explanation: "Clear plastic bottle shape detected".into(),
            distribution: Distribution::synthesize(Category::Plastic, 0.92),
        };
        let json = serde_json::to_value(PredictResponse::from(result)).unwrap();

        assert_eq!(json["prediction"], "plastic");
        assert_eq!(json["confidence"], 92.0);
        assert_eq!(json["suggestion"], Category::Plastic.suggestion());
        assert_eq!(json["explanation"], "Clear plastic bottle shape detected");

        let probabilities = json["probabilities"].as_object().unwrap();
        assert_eq!(probabilities.len(), 10);
        assert_eq!(probabilities["plastic"], 50.55);
        for category in Category::ALL {
            if category != Category::Plastic {
                assert_eq!(probabilities[category.as_str()], 5.49);
            }
        }
    }

    #[test]
    fn test_probabilities_in_label_order() {
        let result = ClassificationResult {
            category: Category::Trash,
            confidence: 0.5,
            explanation: String::new(),
            distribution: Distribution::synthesize(Category::Trash, 0.5),
        };
        let json = serde_json::to_string(&PredictResponse::from(result)).unwrap();
        let positions: Vec<usize> = Category::ALL
            .iter()
            .map(|c| json.find(&format!("\"{}\":", c.as_str())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_error_body() {
        let json = serde_json::to_string(&ErrorBody::new("No file uploaded")).unwrap();
        assert_eq!(json, r#"{"error":"No file uploaded"}"#);
    }
}
