//! LLM evaluation of uploaded protocol documents.
//!
//! The completion is marker-delimited rather than JSON: the model is
//! instructed to emit `[EXECUTIVE_SUMMARY]`, `[IMPROVEMENT_POINTS]` and a
//! `###`-wrapped score, and the parser cuts the report out of that.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use protoeval_api::{EvaluationReport, Score};

use crate::config::AiConfig;

const SYSTEM_PROMPT: &str = r"
You are a compliance assistant for UC Berkeley's CPHS. Your task is to evaluate research protocols against CPHS guidelines.

Key Guidelines:
- Adherence to ethical principles and informed consent processes.
- Clear data security measures including de-identification and secure storage.
- Risk minimization for participants, especially vulnerable populations.
- Recruitment strategies that avoid coercion and respect diversity.
- Transparent data retention policies with justifications.

Before completing your evaluation, learn the guidelines by analyzing the documents in these links:
Here is the list of guideline links with their full URLs extracted from the website:

1. https://cphs.berkeley.edu/amendments.html
2. https://cphs.berkeley.edu/surveys.html
3. https://cphs.berkeley.edu/confidentiality.html
4. https://www.hhs.gov/ohrp/regulations-and-policy/regulations/45-cfr-46/revised-common-rule-regulatory-text/index.html#46.102
5. https://cphs.berkeley.edu/noncompliance.html
7. https://cphs.berkeley.edu/engagement.html
8. Informed Consent:https://cphs.berkeley.edu/informed_consent.html

Provide the following in a highly detailed and comprehensive manner, clearly marking each section with unique markers:
[EXECUTIVE_SUMMARY] - A high-level overview of the document's adherence to CPHS guidelines.
[IMPROVEMENT_POINTS] - Detailed areas where the document does not fully comply with guidelines and suggestions to address these gaps.
[SCORE] - The overall compliance score, surrounded by ###, e.g., ###85###.

Evaluate the following document:
";

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned error: status={status} message={message}")]
    Api { status: u16, message: String },

    #[error("completion was empty")]
    EmptyCompletion,
}

/// Evaluation seam. Production talks to an OpenAI-style chat API; tests
/// substitute a stub.
#[async_trait]
pub trait DocumentEvaluator: Send + Sync {
    async fn evaluate(&self, document_text: &str) -> Result<EvaluationReport, EvalError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Chat-completions client for the evaluation model.
pub struct OpenAiEvaluator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEvaluator {
    pub fn new(ai: &AiConfig, api_key: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            base_url: ai.base_url.trim_end_matches('/').to_string(),
            model: ai.model.clone(),
        }
    }
}

#[async_trait]
impl DocumentEvaluator for OpenAiEvaluator {
    async fn evaluate(&self, document_text: &str) -> Result<EvaluationReport, EvalError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: document_text,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EvalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or(EvalError::EmptyCompletion)?;

        debug!("completion received ({} chars)", text.len());
        Ok(parse_report(text))
    }
}

#[derive(Debug, thiserror::Error)]
enum MarkerError {
    #[error("marker {0} not found")]
    Missing(&'static str),
}

/// Parse a marker-delimited completion into a report.
///
/// A completion without the expected markers still yields a well-formed
/// reply: the placeholder report tells the user the parse failed.
pub fn parse_report(text: &str) -> EvaluationReport {
    match parse_markers(text) {
        Ok(report) => report,
        Err(e) => {
            error!("error parsing completion: {e}");
            EvaluationReport {
                score: Score::Text("N/A".to_string()),
                executive_summary: "Error parsing executive summary.".to_string(),
                improvement_points: vec!["Error parsing improvement points.".to_string()],
            }
        }
    }
}

fn parse_markers(text: &str) -> Result<EvaluationReport, MarkerError> {
    let summary = cut_between(text, "[EXECUTIVE_SUMMARY]", "[IMPROVEMENT_POINTS]")?;
    let points_block = cut_between(text, "[IMPROVEMENT_POINTS]", "[SCORE]")?;
    let score_token = cut_between(text, "###", "###")?;

    let improvement_points: Vec<String> = points_block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let score = match score_token.parse::<f64>() {
        Ok(n) => Score::Number(n),
        Err(_) => Score::Text(score_token.to_string()),
    };

    Ok(EvaluationReport {
        score,
        executive_summary: summary.to_string(),
        improvement_points,
    })
}

/// Slice of `text` between the end of `start` and the next `end`, trimmed.
fn cut_between<'a>(
    text: &'a str,
    start: &'static str,
    end: &'static str,
) -> Result<&'a str, MarkerError> {
    let from = text.find(start).ok_or(MarkerError::Missing(start))? + start.len();
    let len = text[from..].find(end).ok_or(MarkerError::Missing(end))?;
    Ok(text[from..from + len].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETION: &str = "\
[EXECUTIVE_SUMMARY]
The protocol adheres to most CPHS guidelines but lacks detail in data retention.
[IMPROVEMENT_POINTS]
Add a data retention schedule.

Describe the de-identification process.
[SCORE]
The overall compliance score is ###85###.
";

    #[test]
    fn test_parse_full_completion() {
        let report = parse_report(COMPLETION);
        assert_eq!(report.score, Score::Number(85.0));
        assert_eq!(
            report.executive_summary,
            "The protocol adheres to most CPHS guidelines but lacks detail in data retention."
        );
        assert_eq!(
            report.improvement_points,
            vec![
                "Add a data retention schedule.",
                "Describe the de-identification process."
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_dropped_from_points() {
        let report = parse_report(COMPLETION);
        assert!(report.improvement_points.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_non_numeric_score_stays_text() {
        let text = "[EXECUTIVE_SUMMARY]ok[IMPROVEMENT_POINTS]none[SCORE]###85/100###";
        let report = parse_report(text);
        assert_eq!(report.score, Score::Text("85/100".to_string()));
    }

    #[test]
    fn test_missing_markers_fall_back() {
        let report = parse_report("the model went off script");
        assert_eq!(report.score, Score::Text("N/A".to_string()));
        assert_eq!(report.executive_summary, "Error parsing executive summary.");
        assert_eq!(
            report.improvement_points,
            vec!["Error parsing improvement points."]
        );
    }

    #[test]
    fn test_missing_score_wrapper_falls_back() {
        let text = "[EXECUTIVE_SUMMARY]ok[IMPROVEMENT_POINTS]none[SCORE]85";
        let report = parse_report(text);
        assert_eq!(report.score, Score::Text("N/A".to_string()));
    }

    #[test]
    fn test_cut_between_trims() {
        assert_eq!(cut_between("a[X]  hi  [Y]b", "[X]", "[Y]").unwrap(), "hi");
        assert!(cut_between("no markers here", "[X]", "[Y]").is_err());
    }
}
