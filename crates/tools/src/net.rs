//! Native collaborators: reqwest for HTTP, tokio for time and files.

use std::path::PathBuf;
use std::time::Duration;

use foundation::math::Coordinates;
use overlay::{GeoError, HttpClient, HttpError, HttpResponse, PositionSource, Sleeper};
use reqwest::header::CONTENT_TYPE;
use streaming::{TextureError, TextureSource};

#[derive(Debug, Clone, Default)]
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpClient for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        Ok(HttpResponse::new(status, body))
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse::new(status, body))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Resolves texture uris against a directory; a leading `/` is the root.
#[derive(Debug, Clone)]
pub struct FsTextureSource {
    root: PathBuf,
}

impl FsTextureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, uri: &str) -> PathBuf {
        self.root.join(uri.trim_start_matches('/'))
    }
}

impl TextureSource for FsTextureSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, TextureError> {
        tokio::fs::read(self.path_for(uri))
            .await
            .map_err(|e| TextureError::Fetch {
                uri: uri.to_string(),
                reason: e.to_string(),
            })
    }
}

/// A position given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(GeoError::PermissionOrTimeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedPosition, FsTextureSource};
    use foundation::math::Coordinates;
    use overlay::{GeoError, PositionSource};
    use streaming::{TextureError, TextureSource};

    #[test]
    fn uris_resolve_under_the_root() {
        let source = FsTextureSource::new("/srv/assets");
        assert_eq!(
            source.path_for("/textures/earth-day.jpg"),
            std::path::Path::new("/srv/assets/textures/earth-day.jpg")
        );
        assert_eq!(
            source.path_for("clouds.png"),
            std::path::Path::new("/srv/assets/clouds.png")
        );
    }

    #[tokio::test]
    async fn reads_files_and_reports_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("textures")).unwrap();
        std::fs::write(dir.path().join("textures/a.bin"), [1u8, 2, 3]).unwrap();

        let source = FsTextureSource::new(dir.path());
        assert_eq!(source.fetch("/textures/a.bin").await.unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            source.fetch("/textures/missing.png").await,
            Err(TextureError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn out_of_range_position_fails_like_a_denied_fix() {
        let ok = FixedPosition(Coordinates::new(-33.9, 18.4));
        assert_eq!(ok.current_position().await, Ok(Coordinates::new(-33.9, 18.4)));
        let bad = FixedPosition(Coordinates::new(120.0, 0.0));
        assert_eq!(
            bad.current_position().await,
            Err(GeoError::PermissionOrTimeout)
        );
    }
}
