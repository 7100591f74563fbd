use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTENT_ENDPOINT: &str = "/api/content";
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://api.opencagedata.com/geocode/v1/json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub content_endpoint: String,
    pub geocode_endpoint: String,
    /// Empty skips the lookup; places resolve to the placeholder names.
    pub geocode_api_key: String,
    /// How long "Submitted!" stays up before the form resets.
    pub success_delay_ms: u64,
    /// Start a position fix as soon as the form mounts.
    pub locate_on_mount: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            content_endpoint: DEFAULT_CONTENT_ENDPOINT.to_string(),
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            geocode_api_key: String::new(),
            success_delay_ms: 2000,
            locate_on_mount: true,
        }
    }
}
