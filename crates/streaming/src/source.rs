/// Errors from fetching or decoding a texture. Never surfaced to the viewer:
/// the cache turns them into an absent surface map.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture fetch failed for {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    #[error("texture decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("texture has no pixels")]
    Empty,
}

/// Where texture bytes come from (HTTP in the browser, the filesystem in
/// tools, canned bytes in tests).
#[allow(async_fn_in_trait)]
pub trait TextureSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, TextureError>;
}
