//! Collaborator seams for the network and the clock.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HttpError(pub String);

#[allow(async_fn_in_trait)]
pub trait HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;

    /// POST `body` with `Content-Type: application/json`.
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError>;
}

#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep_ms(&self, ms: u64);
}

#[cfg(test)]
mod tests {
    use super::HttpResponse;

    #[test]
    fn only_2xx_is_success() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
