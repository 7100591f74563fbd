use std::cell::RefCell;
use std::collections::BTreeMap;

use foundation::HandleAllocator;
use tracing::{debug, info, warn};

use crate::request::Request;
use crate::residency::ResidencyState;
use crate::source::{TextureError, TextureSource};
use crate::texture::{DecodedImage, TextureHandle, WrapMode, decode_image};

#[derive(Debug)]
struct CacheEntry {
    state: ResidencyState,
    request: Option<Request>,
    texture: Option<(TextureHandle, DecodedImage)>,
}

/// Outcome of asking the cache for a uri.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadStart {
    /// First request for this uri; the caller must fetch and report back
    /// through [`TextureCache::finish_load`].
    Fetch(Request),
    /// Another caller is already fetching this uri. Pending, not failed:
    /// the uri becomes `Ready` once the first fetch reports back, so callers
    /// should poll [`TextureCache::get`] later rather than give up on it.
    InFlight,
    Ready(TextureHandle),
    /// A previous attempt failed; the surface renders unmapped.
    Absent,
}

/// Texture cache keyed by uri, scoped to one scene lifetime.
///
/// Each distinct uri is fetched at most once. Failures resolve to an absent
/// entry rather than an error. All handles are released together by
/// [`TextureCache::teardown`]; completions that arrive afterwards are dropped.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: BTreeMap<String, CacheEntry>,
    requests: BTreeMap<Request, String>,
    handles: HandleAllocator,
    next_request: u64,
    wrap: (WrapMode, WrapMode),
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            next_request: 1,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self, uri: &str) -> Option<ResidencyState> {
        self.entries.get(uri).map(|e| e.state)
    }

    /// Handle for a resident uri. This is what the per-frame path reads.
    pub fn get(&self, uri: &str) -> Option<TextureHandle> {
        self.entries
            .get(uri)
            .and_then(|e| e.texture.as_ref())
            .map(|(handle, _)| *handle)
    }

    /// Pixels behind a handle, if the handle is still live.
    pub fn image(&self, handle: TextureHandle) -> Option<&DecodedImage> {
        if !self.handles.is_live(handle.id) {
            return None;
        }
        self.entries
            .values()
            .filter_map(|e| e.texture.as_ref())
            .find(|(h, _)| h.id == handle.id)
            .map(|(_, img)| img)
    }

    pub fn resident(&self) -> impl Iterator<Item = (&str, TextureHandle)> {
        self.entries
            .iter()
            .filter_map(|(uri, e)| e.texture.as_ref().map(|(h, _)| (uri.as_str(), *h)))
    }

    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    pub fn begin_load(&mut self, uri: &str) -> LoadStart {
        if let Some(entry) = self.entries.get(uri) {
            return match (entry.state, &entry.texture) {
                (ResidencyState::Resident, Some((handle, _))) => LoadStart::Ready(*handle),
                (ResidencyState::Requested, _) => LoadStart::InFlight,
                _ => LoadStart::Absent,
            };
        }

        let req = Request(self.next_request);
        self.next_request += 1;
        self.requests.insert(req, uri.to_string());
        self.entries.insert(
            uri.to_string(),
            CacheEntry {
                state: ResidencyState::Requested,
                request: Some(req),
                texture: None,
            },
        );
        debug!(uri, request = req.0, "texture requested");
        LoadStart::Fetch(req)
    }

    /// Complete a fetch started by [`TextureCache::begin_load`].
    ///
    /// Returns the new handle, or `None` when the fetch or decode failed or
    /// the request no longer belongs to this cache.
    pub fn finish_load(
        &mut self,
        req: Request,
        fetched: Result<Vec<u8>, TextureError>,
    ) -> Option<TextureHandle> {
        let Some(uri) = self.requests.remove(&req) else {
            debug!(request = req.0, "dropping texture completion for a stale request");
            return None;
        };
        let entry = self.entries.get_mut(&uri)?;
        if entry.request != Some(req) {
            return None;
        }
        entry.request = None;

        let decoded = fetched.and_then(|bytes| decode_image(&bytes));
        match decoded {
            Ok(image) => {
                let handle = TextureHandle {
                    id: self.handles.allocate(),
                    wrap_s: self.wrap.0,
                    wrap_t: self.wrap.1,
                    width: image.width,
                    height: image.height,
                };
                info!(uri = %uri, width = image.width, height = image.height, "texture resident");
                entry.state = ResidencyState::Resident;
                entry.texture = Some((handle, image));
                Some(handle)
            }
            Err(err) => {
                warn!(uri = %uri, error = %err, "texture unavailable, rendering unmapped");
                entry.state = ResidencyState::Absent;
                None
            }
        }
    }

    /// Release every handle and forget every entry. Returns how many
    /// textures were resident.
    pub fn teardown(&mut self) -> usize {
        let resident = self.handles.live_count();
        self.handles.release_all();
        for entry in self.entries.values_mut() {
            entry.state = ResidencyState::Released;
            entry.texture = None;
        }
        self.entries.clear();
        self.requests.clear();
        info!(resident, "texture cache torn down");
        resident
    }
}

/// Load `uri` through `cache`, fetching from `source` only if nobody has
/// asked for it before.
///
/// The cache is borrowed only around the synchronous bookkeeping, never
/// across the fetch, so per-frame readers are never blocked. A uri already in
/// flight yields `None` straight away. That `None` means pending, not failed;
/// [`TextureCache::state`] tells `Requested` apart from `Absent`.
pub async fn load_texture<S: TextureSource>(
    cache: &RefCell<TextureCache>,
    source: &S,
    uri: &str,
) -> Option<TextureHandle> {
    let start = cache.borrow_mut().begin_load(uri);
    match start {
        LoadStart::Ready(handle) => Some(handle),
        LoadStart::InFlight | LoadStart::Absent => None,
        LoadStart::Fetch(req) => {
            let fetched = source.fetch(uri).await;
            cache.borrow_mut().finish_load(req, fetched)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadStart, TextureCache, load_texture};
    use crate::residency::ResidencyState;
    use crate::source::{TextureError, TextureSource};
    use crate::texture::{WrapMode, encode_test_png};
    use std::cell::{Cell, RefCell};

    struct CountingSource {
        fetches: Cell<u32>,
        fail: bool,
    }

    impl CountingSource {
        fn ok() -> Self {
            Self {
                fetches: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fetches: Cell::new(0),
                fail: true,
            }
        }
    }

    impl TextureSource for CountingSource {
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>, TextureError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail {
                return Err(TextureError::Fetch {
                    uri: uri.to_string(),
                    reason: "404".to_string(),
                });
            }
            Ok(encode_test_png(2, 2))
        }
    }

    #[test]
    fn repeated_loads_fetch_once() {
        let cache = RefCell::new(TextureCache::new());
        let source = CountingSource::ok();

        let a = pollster::block_on(load_texture(&cache, &source, "earth.png")).unwrap();
        let b = pollster::block_on(load_texture(&cache, &source, "earth.png")).unwrap();
        assert_eq!(a, b);
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(a.wrap_s, WrapMode::Repeat);
        assert_eq!(a.wrap_t, WrapMode::Repeat);
        assert_eq!(cache.borrow().state("earth.png"), Some(ResidencyState::Resident));
    }

    #[test]
    fn second_request_while_in_flight_does_not_fetch() {
        let mut cache = TextureCache::new();
        let first = cache.begin_load("clouds.png");
        assert!(matches!(first, LoadStart::Fetch(_)));
        assert_eq!(cache.begin_load("clouds.png"), LoadStart::InFlight);
        assert!(cache.get("clouds.png").is_none());
    }

    #[test]
    fn in_flight_none_is_pending_and_resolves_later() {
        let cache = RefCell::new(TextureCache::new());
        let source = CountingSource::ok();
        let LoadStart::Fetch(req) = cache.borrow_mut().begin_load("clouds.png") else {
            panic!("expected fetch");
        };

        assert!(pollster::block_on(load_texture(&cache, &source, "clouds.png")).is_none());
        assert_eq!(source.fetches.get(), 0);
        assert_eq!(cache.borrow().state("clouds.png"), Some(ResidencyState::Requested));

        let handle = cache
            .borrow_mut()
            .finish_load(req, Ok(encode_test_png(2, 2)))
            .unwrap();
        assert_eq!(cache.borrow().get("clouds.png"), Some(handle));
        assert_eq!(cache.borrow().state("clouds.png"), Some(ResidencyState::Resident));
        assert_eq!(
            pollster::block_on(load_texture(&cache, &source, "clouds.png")),
            Some(handle)
        );
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn failure_resolves_to_absent_and_is_not_retried() {
        let cache = RefCell::new(TextureCache::new());
        let source = CountingSource::failing();

        assert!(pollster::block_on(load_texture(&cache, &source, "missing.png")).is_none());
        assert!(pollster::block_on(load_texture(&cache, &source, "missing.png")).is_none());
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(cache.borrow().state("missing.png"), Some(ResidencyState::Absent));
    }

    #[test]
    fn undecodable_bytes_resolve_to_absent() {
        let mut cache = TextureCache::new();
        let LoadStart::Fetch(req) = cache.begin_load("placeholder.svg") else {
            panic!("expected fetch");
        };
        assert!(cache.finish_load(req, Ok(b"<svg/>".to_vec())).is_none());
        assert_eq!(cache.state("placeholder.svg"), Some(ResidencyState::Absent));
    }

    #[test]
    fn teardown_releases_handles_and_drops_late_completions() {
        let cache = RefCell::new(TextureCache::new());
        let source = CountingSource::ok();
        let handle = pollster::block_on(load_texture(&cache, &source, "earth.png")).unwrap();

        let late = match cache.borrow_mut().begin_load("clouds.png") {
            LoadStart::Fetch(req) => req,
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(cache.borrow().live_handles(), 1);
        assert_eq!(cache.borrow_mut().teardown(), 1);
        assert_eq!(cache.borrow().live_handles(), 0);
        assert!(cache.borrow().image(handle).is_none());
        assert!(cache.borrow().is_empty());

        assert!(cache
            .borrow_mut()
            .finish_load(late, Ok(encode_test_png(1, 1)))
            .is_none());
        assert!(cache.borrow().is_empty());
    }

    #[test]
    fn image_lookup_by_handle() {
        let cache = RefCell::new(TextureCache::new());
        let source = CountingSource::ok();
        let handle = pollster::block_on(load_texture(&cache, &source, "earth.png")).unwrap();
        let cache = cache.borrow();
        let img = cache.image(handle).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(cache.resident().count(), 1);
    }
}
