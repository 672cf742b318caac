#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL template: {message}")]
    Template { message: String },

    #[error("Invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http returns {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Script error: {0}")]
    Script(#[from] harvest_script::Error),

    #[error("Marshal error: {0}")]
    Marshal(#[from] harvest_structmap::Error),
}

impl Error {
    /// Server-side failures are worth retrying; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UnexpectedStatus { status, .. } if *status >= 500)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_server_errors_retry() {
        let unavailable = Error::UnexpectedStatus {
            status: 503,
            body: "try later".to_string(),
        };
        assert!(unavailable.is_retryable());
        assert_eq!(unavailable.to_string(), "http returns 503: try later");

        let bad_request = Error::UnexpectedStatus {
            status: 400,
            body: String::new(),
        };
        assert!(!bad_request.is_retryable());
        assert!(!Error::InvalidMethod {
            method: "FETCH".to_string()
        }
        .is_retryable());
    }
}
