use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("status body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("status widget already started")]
    AlreadyStarted,
    #[error("terminal error: {message}")]
    Terminal { message: String },
    #[error("runtime error: {message}")]
    Runtime { message: String },
}

impl StatusError {
    pub(crate) fn request(url: &str, err: impl std::fmt::Display) -> Self {
        StatusError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn terminal(err: impl std::fmt::Display) -> Self {
        StatusError::Terminal {
            message: err.to_string(),
        }
    }
}
