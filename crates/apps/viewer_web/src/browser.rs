//! Browser-backed collaborators for the overlay drivers and the texture cache.

use foundation::math::Coordinates;
use gloo_net::http::Request;
use js_sys::{Promise, Reflect, Uint8Array};
use overlay::{FileReader, GeoError, HttpClient, HttpError, HttpResponse, MediaError};
use overlay::{PositionSource, SelectedFile, Sleeper};
use streaming::{TextureError, TextureSource};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// `navigator.geolocation` with the browser's default options.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserPosition;

impl PositionSource for BrowserPosition {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        let window = web_sys::window().ok_or(GeoError::Unsupported)?;
        let navigator = window.navigator();
        if !Reflect::has(&navigator, &JsValue::from_str("geolocation")).unwrap_or(false) {
            return Err(GeoError::Unsupported);
        }
        let geolocation = navigator
            .geolocation()
            .map_err(|_| GeoError::Unsupported)?;

        let promise = Promise::new(&mut |resolve, reject| {
            if geolocation
                .get_current_position_with_error_callback(&resolve, Some(&reject))
                .is_err()
            {
                let _ = reject.call0(&JsValue::NULL);
            }
        });
        let position = JsFuture::from(promise)
            .await
            .map_err(|_| GeoError::PermissionOrTimeout)?;

        let coords = Reflect::get(&position, &JsValue::from_str("coords"))
            .map_err(|_| GeoError::PermissionOrTimeout)?;
        let read = |field: &str| {
            Reflect::get(&coords, &JsValue::from_str(field))
                .ok()
                .and_then(|v| v.as_f64())
        };
        match (read("latitude"), read("longitude")) {
            (Some(lat), Some(lng)) => {
                let coords = Coordinates::new(lat, lng);
                if coords.is_valid() {
                    Ok(coords)
                } else {
                    Err(GeoError::PermissionOrTimeout)
                }
            }
            _ => Err(GeoError::PermissionOrTimeout),
        }
    }
}

/// `fetch` through gloo-net.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooHttp;

impl HttpClient for GlooHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = Request::get(url)
            .send()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        Ok(HttpResponse::new(status, body))
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError> {
        let response = Request::post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .map_err(|e| HttpError(e.to_string()))?
            .send()
            .await
            .map_err(|e| HttpError(e.to_string()))?;
        let status = response.status();
        // The body is not interpreted; a failed read still has a status.
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse::new(status, body))
    }
}

impl TextureSource for GlooHttp {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, TextureError> {
        let fetch_err = |reason: String| TextureError::Fetch {
            uri: uri.to_string(),
            reason,
        };
        let response = Request::get(uri)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.ok() {
            return Err(fetch_err(format!("status {}", response.status())));
        }
        response
            .binary()
            .await
            .map_err(|e| fetch_err(e.to_string()))
    }
}

/// `setTimeout` as a future.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeoutSleeper;

impl Sleeper for TimeoutSleeper {
    async fn sleep_ms(&self, ms: u64) {
        let delay = ms.min(i32::MAX as u64) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
                    .is_ok()
            });
            if !scheduled {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}

/// A file from an `<input type="file">` selection.
#[derive(Debug, Clone)]
pub struct BrowserFile(pub web_sys::File);

impl BrowserFile {
    pub fn selected(&self) -> SelectedFile {
        SelectedFile {
            name: self.0.name(),
            mime: self.0.type_(),
            size: self.0.size().max(0.0) as u64,
        }
    }
}

impl FileReader for BrowserFile {
    async fn read(&self, file: &SelectedFile) -> Result<Vec<u8>, MediaError> {
        let buffer = JsFuture::from(self.0.array_buffer())
            .await
            .map_err(|e| MediaError::Read {
                name: file.name.clone(),
                reason: format!("{e:?}"),
            })?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}
