#[derive(Debug, Clone, PartialEq)]
pub enum SummarizeError {
    Upstream(String),
    Timeout(String),
}

impl std::fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizeError::Upstream(msg) => write!(f, "summarizer upstream error: {msg}"),
            SummarizeError::Timeout(msg) => write!(f, "summarizer timed out: {msg}"),
        }
    }
}

/// Port for the language model that turns a headline into alert copy.
pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizeError>;
}
