//! HTTP [`Classifier`] backed by the Gemini `generateContent` endpoint.
//!
//! The request pairs the classification policy (system instruction) with the
//! serialised hierarchy (user turn) and asks for JSON conforming to
//! [`prompt::response_schema`]. The reply is parsed strictly: an empty answer
//! or a payload that does not match [`OptimizationReport`] is an error, never
//! a partially filled report.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::config::ClassifierConfig;
use crate::contract::{AnalysisMode, Classifier};
use crate::error::AnalysisError;
use crate::model::{Hierarchy, OptimizationReport};
use crate::prompt;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn text_content(text: String) -> Content {
    Content {
        role: None,
        parts: vec![Part { text: Some(text) }],
    }
}

/// Builds the `generateContent` body for one analysis.
pub fn build_request(
    hierarchy: &Hierarchy,
    mode: AnalysisMode,
) -> Result<GenerateRequest, AnalysisError> {
    let user = prompt::user_prompt(hierarchy).map_err(|e| {
        AnalysisError::Schema(format!("failed to serialise hierarchy: {e}"))
    })?;
    Ok(GenerateRequest {
        system_instruction: text_content(prompt::system_instruction(mode)),
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part { text: Some(user) }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: prompt::response_schema(),
        },
    })
}

/// Pulls the report out of a raw `generateContent` response body.
pub fn extract_report(body: &str) -> Result<OptimizationReport, AnalysisError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AnalysisError::Schema(format!("malformed response envelope: {e}")))?;

    let (text, finish_reason) = match response.candidates.into_iter().next() {
        Some(candidate) => {
            let text = candidate
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            (text, candidate.finish_reason)
        }
        None => (String::new(), None),
    };

    if text.trim().is_empty() {
        warn!(?finish_reason, "Classifier produced no text");
        return Err(AnalysisError::EmptyResponse { finish_reason });
    }

    parse_report(&text)
}

/// Strictly parses the JSON report text produced by the model.
pub fn parse_report(text: &str) -> Result<OptimizationReport, AnalysisError> {
    let report: OptimizationReport = serde_json::from_str(text.trim())?;
    let mut seen = HashSet::new();
    if let Some(dup) = report
        .recommendations
        .iter()
        .find(|r| !seen.insert(r.id.as_str()))
    {
        return Err(AnalysisError::Schema(format!(
            "recommendation id {} appears more than once",
            dup.id
        )));
    }
    if let Some(bad) = report
        .recommendations
        .iter()
        .find(|r| !(1.0..=100.0).contains(&r.impact_score))
    {
        return Err(AnalysisError::Schema(format!(
            "recommendation {} has impactScore {} outside 1..=100",
            bad.id, bad.impact_score
        )));
    }
    Ok(report)
}

pub struct GeminiClient {
    client: Client,
    config: ClassifierConfig,
}

impl GeminiClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(GeminiClient { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn analyze(
        &self,
        hierarchy: &Hierarchy,
        mode: AnalysisMode,
    ) -> Result<OptimizationReport, AnalysisError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            error!("Classifier API key missing; refusing to analyze");
            return Err(AnalysisError::MissingCredential);
        };

        let request = build_request(hierarchy, mode)?;
        info!(
            model = %self.config.model,
            %mode,
            folders = hierarchy.folders.len(),
            files = hierarchy.files.len(),
            "Sending hierarchy to classifier"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Classifier request failed");
                AnalysisError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %message, "Classifier returned an error");
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let report = extract_report(&body).map_err(|e| {
            error!(error = %e, "Classifier response rejected");
            e
        })?;

        let violations = report.ownership_violations(hierarchy);
        if !violations.is_empty() {
            let ids: Vec<&str> = violations.iter().map(|r| r.id.as_str()).collect();
            warn!(?ids, "Classifier suggested changes to items not owned by the user");
        }

        info!(
            recommendations = report.recommendations.len(),
            redundant_folders = report.stats.redundant_folders,
            misnamed_files = report.stats.misnamed_files,
            "Classifier analysis complete"
        );
        debug!(?report, "Classifier report (full debug)");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_drive;
    use serde_json::json;

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    const REPORT: &str = r#"{
        "summary": "Two copies of the Pegasus plan.",
        "stats": { "redundantFolders": 1, "misnamedFiles": 2, "potentialSpaceSaved": "28KB" },
        "recommendations": [
            { "id": "r1", "type": "RENAME", "fileId": "file1",
              "currentPath": "My Drive/Drafts 2023/Untitled-1.docx",
              "suggestedName": "Project Pegasus - Marketing Strategy.docx",
              "reasoning": "Generic name", "impactScore": 90 }
        ]
    }"#;

    #[test]
    fn request_carries_policy_data_and_schema() {
        let h = mock_drive::generate();
        let request = build_request(&h, AnalysisMode::Weekly).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("Weekly Checkup"));
        assert_eq!(body["contents"][0]["role"], "user");
        let user = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(user.contains("Shared Team Assets"));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            prompt::response_schema()
        );
    }

    #[test]
    fn extracts_a_valid_report() {
        let report = extract_report(&envelope(REPORT)).unwrap();
        assert_eq!(report.stats.misnamed_files, 2);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(
            report.recommendations[0].suggested_name.as_deref(),
            Some("Project Pegasus - Marketing Strategy.docx")
        );
    }

    #[test]
    fn joins_split_text_parts() {
        let (a, b) = REPORT.split_at(40);
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": a }, { "text": b }] } }]
        })
        .to_string();
        assert!(extract_report(&body).is_ok());
    }

    #[test]
    fn empty_answers_are_errors() {
        assert!(matches!(
            extract_report(r#"{"candidates": []}"#),
            Err(AnalysisError::EmptyResponse {
                finish_reason: None
            })
        ));
        assert!(matches!(
            extract_report(&envelope("   ")),
            Err(AnalysisError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn empty_answer_keeps_the_finish_reason() {
        let err = extract_report(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap_err();
        match &err {
            AnalysisError::EmptyResponse { finish_reason } => {
                assert_eq!(finish_reason.as_deref(), Some("SAFETY"));
            }
            other => panic!("expected EmptyResponse, got {other:?}"),
        }
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn missing_required_fields_are_schema_errors() {
        let no_stats = r#"{"summary": "x", "recommendations": []}"#;
        assert!(matches!(
            extract_report(&envelope(no_stats)),
            Err(AnalysisError::Schema(_))
        ));

        let no_reasoning = r#"{"summary": "x",
            "stats": {"redundantFolders": 0, "misnamedFiles": 0, "potentialSpaceSaved": "0KB"},
            "recommendations": [{"id": "r1", "type": "MOVE", "impactScore": 10}]}"#;
        assert!(matches!(
            extract_report(&envelope(no_reasoning)),
            Err(AnalysisError::Schema(_))
        ));
    }

    #[test]
    fn unknown_type_and_bad_scores_are_rejected() {
        let unknown = REPORT.replace("\"RENAME\"", "\"DELETE\"");
        assert!(matches!(
            extract_report(&envelope(&unknown)),
            Err(AnalysisError::Schema(_))
        ));

        let too_high = REPORT.replace("\"impactScore\": 90", "\"impactScore\": 140");
        assert!(matches!(
            extract_report(&envelope(&too_high)),
            Err(AnalysisError::Schema(_))
        ));
    }

    #[test]
    fn non_json_text_is_a_schema_error() {
        assert!(matches!(
            extract_report(&envelope("Sure! Here is your report:")),
            Err(AnalysisError::Schema(_))
        ));
        assert!(matches!(
            extract_report("<html>"),
            Err(AnalysisError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let config = ClassifierConfig {
            api_key: None,
            // Unroutable; reaching the network would surface as Transport instead.
            base_url: "http://127.0.0.1:9".into(),
            ..ClassifierConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        let result = client
            .analyze(&mock_drive::generate(), AnalysisMode::Deep)
            .await;
        assert!(matches!(result, Err(AnalysisError::MissingCredential)));
    }

    #[test]
    fn endpoint_includes_model() {
        let config = ClassifierConfig {
            base_url: "https://example.test/".into(),
            model: "m1".into(),
            ..ClassifierConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/m1:generateContent"
        );
    }

    #[test]
    fn duplicate_recommendation_ids_are_rejected() {
        let report = r#"{
            "summary": "x",
            "stats": { "redundantFolders": 0, "misnamedFiles": 1, "potentialSpaceSaved": "0KB" },
            "recommendations": [
                { "id": "1", "type": "RENAME", "fileId": "file1",
                  "suggestedName": "Plan.docx", "reasoning": "Generic name", "impactScore": 50 },
                { "id": "1", "type": "MOVE", "fileId": "file2",
                  "suggestedFolderId": "f4", "reasoning": "Invoice", "impactScore": 60 }
            ]
        }"#;
        match parse_report(report) {
            Err(AnalysisError::Schema(msg)) => assert!(msg.contains("id 1"), "{msg}"),
            other => panic!("expected a schema error, got {other:?}"),
        }
    }

    mod http {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        /// Reads one request (headers plus `content-length` bytes of body).
        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        /// Serves a single canned response and returns the base URL plus the
        /// request the client sent.
        async fn serve_once(
            status_line: &'static str,
            body: String,
        ) -> (String, tokio::task::JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
                request
            });
            (format!("http://{addr}"), handle)
        }

        fn client_for(base_url: String) -> GeminiClient {
            GeminiClient::new(ClassifierConfig {
                api_key: Some("test-key".into()),
                base_url,
                model: "m1".into(),
                ..ClassifierConfig::default()
            })
            .unwrap()
        }

        #[tokio::test]
        async fn error_envelope_becomes_service_error() {
            let (base, server) = serve_once(
                "429 Too Many Requests",
                r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#.into(),
            )
            .await;
            let result = client_for(base)
                .analyze(&mock_drive::generate(), AnalysisMode::Deep)
                .await;
            match result {
                Err(AnalysisError::Service { status, message }) => {
                    assert_eq!(status, 429);
                    assert_eq!(message, "quota");
                }
                other => panic!("expected a service error, got {other:?}"),
            }

            let request = server.await.unwrap();
            assert!(request.starts_with("POST /v1beta/models/m1:generateContent"));
            assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
        }

        #[tokio::test]
        async fn plain_error_body_is_kept_verbatim() {
            let (base, _server) =
                serve_once("500 Internal Server Error", "upstream exploded".into()).await;
            let result = client_for(base)
                .analyze(&mock_drive::generate(), AnalysisMode::Weekly)
                .await;
            match result {
                Err(AnalysisError::Service { status, message }) => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "upstream exploded");
                }
                other => panic!("expected a service error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn success_without_candidates_is_empty() {
            let (base, _server) = serve_once("200 OK", r#"{"candidates":[]}"#.into()).await;
            let result = client_for(base)
                .analyze(&mock_drive::generate(), AnalysisMode::Deep)
                .await;
            assert!(matches!(
                result,
                Err(AnalysisError::EmptyResponse { finish_reason: None })
            ));
        }

        #[tokio::test]
        async fn success_returns_the_parsed_report() {
            let (base, _server) = serve_once("200 OK", envelope(REPORT)).await;
            let report = client_for(base)
                .analyze(&mock_drive::generate(), AnalysisMode::Deep)
                .await
                .unwrap();
            assert_eq!(report.recommendations[0].id, "r1");
        }

        #[tokio::test]
        async fn refused_connection_is_a_transport_error() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let result = client_for(format!("http://{addr}"))
                .analyze(&mock_drive::generate(), AnalysisMode::Deep)
                .await;
            assert!(matches!(result, Err(AnalysisError::Transport(_))));
        }
    }
}
