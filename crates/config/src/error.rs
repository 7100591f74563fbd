/// Errors from loading or validating a [`ViewerConfig`](crate::ViewerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid globe: {0}")]
    Scene(#[from] scene::SceneError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
