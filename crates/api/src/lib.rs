//! Wire types for the upload-and-evaluate endpoint, shared by host and ui.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Multipart field name carrying the uploaded protocol document.
pub const UPLOAD_FIELD: &str = "protocol";

/// Endpoint path the ui posts to and the host serves.
pub const UPLOAD_ENDPOINT: &str = "/upload-and-evaluate";

/// Compliance score as returned by the evaluator.
///
/// The wire format allows either form: the evaluator emits a number when
/// the completion carries one, and falls back to text (`"N/A"`) otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Successful evaluation of an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub score: Score,
    pub executive_summary: String,
    pub improvement_points: Vec<String>,
}

/// Error reply carrying a user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Reply union for the endpoint.
///
/// `Error` is listed first: any object carrying an `error` field decodes
/// as an error, even if other fields are present alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerReply {
    Error(ErrorReply),
    Report(EvaluationReport),
}

impl ServerReply {
    /// Decode a reply body.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_report() {
        let reply = ServerReply::from_json(
            r#"{"score": 87, "executive_summary": "Good protocol",
                "improvement_points": ["Add timeouts", "Validate inputs"]}"#,
        )
        .unwrap();
        match reply {
            ServerReply::Report(report) => {
                assert_eq!(report.score, Score::Number(87.0));
                assert_eq!(report.executive_summary, "Good protocol");
                assert_eq!(
                    report.improvement_points,
                    vec!["Add timeouts", "Validate inputs"]
                );
            }
            ServerReply::Error(_) => panic!("decoded as error"),
        }
    }

    #[test]
    fn test_decode_error() {
        let reply = ServerReply::from_json(r#"{"error": "File too large"}"#).unwrap();
        assert_eq!(
            reply,
            ServerReply::Error(ErrorReply::new("File too large"))
        );
    }

    #[test]
    fn test_error_field_wins() {
        // Mirrors the client branch order: an error field makes the reply
        // an error no matter what else came along.
        let reply = ServerReply::from_json(
            r#"{"error": "boom", "score": 10, "executive_summary": "x",
                "improvement_points": []}"#,
        )
        .unwrap();
        assert!(matches!(reply, ServerReply::Error(e) if e.error == "boom"));
    }

    #[test]
    fn test_score_as_text() {
        let reply = ServerReply::from_json(
            r#"{"score": "N/A", "executive_summary": "", "improvement_points": []}"#,
        )
        .unwrap();
        match reply {
            ServerReply::Report(report) => {
                assert_eq!(report.score, Score::Text("N/A".into()));
            }
            ServerReply::Error(_) => panic!("decoded as error"),
        }
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::Number(87.0).to_string(), "87");
        assert_eq!(Score::Number(87.5).to_string(), "87.5");
        assert_eq!(Score::Text("N/A".into()).to_string(), "N/A");
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(ServerReply::from_json("<html>oops</html>").is_err());
    }

    #[test]
    fn test_report_roundtrip() {
        let report = EvaluationReport {
            score: Score::Number(72.0),
            executive_summary: "Mostly compliant".into(),
            improvement_points: vec!["Clarify consent flow".into()],
        };
        let json = serde_json::to_string(&ServerReply::Report(report.clone())).unwrap();
        assert_eq!(
            ServerReply::from_json(&json).unwrap(),
            ServerReply::Report(report)
        );
    }
}
