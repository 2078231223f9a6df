use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tradesim_domain::repositories::summarizer::{SummarizeError, Summarizer};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Ollama-style generation endpoint client. Calls are blocking and bounded
/// by the configured timeout; callers run them off the async runtime.
pub struct HttpSummarizer {
    url: String,
    model: String,
    client: Client,
}

impl HttpSummarizer {
    pub fn new(url: String, model: String, timeout_ms: u64) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self { url, model, client })
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    SummarizeError::Timeout(err.to_string())
                } else {
                    SummarizeError::Upstream(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Upstream(format!(
                "summarizer returned status {status}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|err| SummarizeError::Upstream(format!("invalid response body: {err}")))?;

        metrics::histogram!("summarizer_call_duration_ms")
            .record(started.elapsed().as_millis() as f64);
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "summarizer call complete");

        match body.response {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(SummarizeError::Upstream(
                "summarizer returned an empty response".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_the_generate_schema() {
        let request = GenerateRequest {
            model: "llama3",
            prompt: "say hi",
            stream: false,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["prompt"], "say hi");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn response_body_tolerates_a_missing_field() {
        let body: GenerateResponse = serde_json::from_str("{}").expect("parse");
        assert!(body.response.is_none());

        let body: GenerateResponse =
            serde_json::from_str(r#"{"response": "ok", "done": true}"#).expect("parse");
        assert_eq!(body.response.as_deref(), Some("ok"));
    }

    #[test]
    fn unreachable_endpoint_maps_to_an_upstream_error() {
        let summarizer =
            HttpSummarizer::new("http://127.0.0.1:9".to_string(), "llama3".to_string(), 500)
                .expect("build");
        let err = summarizer.summarize("hello").expect_err("no server");
        assert!(matches!(
            err,
            SummarizeError::Upstream(_) | SummarizeError::Timeout(_)
        ));
    }
}
