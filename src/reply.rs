//! Parsing of the model's free-text reply. Models are asked for bare JSON
//! but often wrap it in a markdown code fence, sometimes with a language tag
//! or a sentence of prose around it.

use serde::{Deserialize, Deserializer};

/// The JSON object the classification prompt asks the model for
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelReply {
    pub category: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub confidence: f64,
    pub explanation: String,
}

/// Returns the contents of the first fenced code block in `text`, or the
/// whole (trimmed) text if there is no fence. An unterminated fence runs to
/// the end of the text.
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the info string (`json`, `JSON`, `json5`, ...) if there is one
    let after = &trimmed[open + 3..];
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after.len());
    let body = &after[tag_len..];

    // Prefer a closing fence on its own line so backticks inside the JSON
    // strings are left alone
    let close = body
        .match_indices("```")
        .map(|(i, _)| i)
        .find(|&i| body[..i].trim_end_matches([' ', '\t']).ends_with('\n'))
        .or_else(|| body.rfind("```"));

    match close {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse `raw` as a `ModelReply`, stripping a fence only when the text is
/// not already a valid reply. Bare JSON may carry backticks in its strings.
pub fn parse(raw: &str) -> serde_json::Result<ModelReply> {
    serde_json::from_str(raw.trim()).or_else(|_| serde_json::from_str(strip_fence(raw)))
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Confidence {
        Number(f64),
        Text(String),
    }

    match Confidence::deserialize(deserializer)? {
        Confidence::Number(n) => Ok(n),
        Confidence::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("confidence {s:?} is not a number"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str =
        r#"{"category": "glass", "confidence": 0.8, "explanation": "Green bottle"}"#;

    fn expected() -> ModelReply {
        ModelReply {
            category: "glass".into(),
            confidence: 0.8,
            explanation: "Green bottle".into(),
        }
    }

    #[test]
    fn test_unfenced() {
        assert_eq!(strip_fence(BARE), BARE);
        assert_eq!(strip_fence("\n  {\"a\": 1}\n\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_replies_parse_like_bare_json() {
        let replies = [
            format!("```json\n{BARE}\n```"),
            format!("```JSON\n{BARE}\n```\n"),
            format!("```\n{BARE}\n```"),
            format!("```{BARE}```"),
            format!("  \n```json\n  {BARE}  \n```  \n"),
            format!("Here is the result:\n```json\n{BARE}\n```\nHope this helps."),
            format!("```json\n{BARE}"),
        ];

        for reply in replies {
            assert_eq!(parse(&reply).unwrap(), expected(), "reply: {reply:?}");
        }
    }

    #[test]
    fn test_backticks_inside_bare_json() {
        let reply = r#"{"category": "paper", "confidence": 0.7, "explanation": "a receipt printed with ```code``` text"}"#;
        let parsed = parse(reply).unwrap();
        assert_eq!(parsed.category, "paper");
        assert_eq!(parsed.explanation, "a receipt printed with ```code``` text");

        let fenced = format!("```json\n{reply}\n```");
        assert_eq!(parse(&fenced).unwrap(), parsed);
    }

    #[test]
    fn test_multiline_json() {
        let reply = "```json\n{\n    \"category\": \"glass\",\n    \"confidence\": 0.8,\n    \"explanation\": \"Green bottle\"\n}\n```";
        assert_eq!(parse(reply).unwrap(), expected());
    }

    #[test]
    fn test_confidence_as_string() {
        let reply = r#"{"category": "glass", "confidence": " 0.8 ", "explanation": "Green bottle"}"#;
        assert_eq!(parse(reply).unwrap(), expected());

        let reply = r#"{"category": "glass", "confidence": "high", "explanation": "x"}"#;
        assert!(parse(reply).is_err());
    }

    #[test]
    fn test_malformed() {
        // truncated
        assert!(parse(r#"{"category": "glass", "confidence": 0.8"#).is_err());
        // missing keys
        assert!(parse(r#"{"confidence": 0.8, "explanation": "x"}"#).is_err());
        assert!(parse(r#"{"category": "glass", "explanation": "x"}"#).is_err());
        assert!(parse(r#"{"category": "glass", "confidence": 0.8}"#).is_err());
        // not json at all
        assert!(parse("I think this is glass.").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_extra_keys_ignored() {
        let reply = r#"{"category": "glass", "confidence": 0.8, "explanation": "Green bottle", "alternatives": ["plastic"]}"#;
        assert_eq!(parse(reply).unwrap(), expected());
    }
}
