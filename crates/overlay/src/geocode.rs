//! Reverse geocoding against an OpenCage-shaped endpoint.

use foundation::math::Coordinates;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GeocodeError;
use crate::geo::Place;
use crate::http::HttpClient;

#[derive(Debug, Default, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

/// `{endpoint}?q={lat}+{lng}&key={key}`, annotations off.
pub fn geocode_url(endpoint: &str, api_key: &str, coords: Coordinates) -> String {
    format!(
        "{endpoint}?q={}+{}&key={api_key}&no_annotations=1",
        coords.lat_deg, coords.lng_deg
    )
}

/// Pull the place out of the first result. City falls back to town, then
/// village; missing names use the placeholders.
pub fn parse_place(body: &str) -> Result<Place, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResults)?;
    let c = first.components;
    let fallback = Place::placeholder();
    Ok(Place {
        city: c.city.or(c.town).or(c.village).or(fallback.city),
        country: c.country.or(fallback.country),
    })
}

pub struct ReverseGeocoder<'a, H> {
    http: &'a H,
    endpoint: &'a str,
    api_key: &'a str,
}

impl<'a, H: HttpClient> ReverseGeocoder<'a, H> {
    pub fn new(http: &'a H, endpoint: &'a str, api_key: &'a str) -> Self {
        Self {
            http,
            endpoint,
            api_key,
        }
    }

    pub async fn lookup(&self, coords: Coordinates) -> Result<Place, GeocodeError> {
        if self.api_key.is_empty() {
            return Err(GeocodeError::MissingKey);
        }
        let url = geocode_url(self.endpoint, self.api_key, coords);
        debug!(lat = coords.lat_deg, lng = coords.lng_deg, "reverse geocoding");
        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| GeocodeError::Transport(e.0))?;
        if !response.is_success() {
            return Err(GeocodeError::Status(response.status));
        }
        parse_place(&response.body)
    }

    /// Like [`lookup`](Self::lookup) but never fails: any error degrades to
    /// the placeholder place.
    pub async fn resolve(&self, coords: Coordinates) -> Place {
        match self.lookup(coords).await {
            Ok(place) => place,
            Err(err) => {
                warn!(error = %err, "reverse geocode degraded to placeholder");
                Place::placeholder()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::{ReverseGeocoder, geocode_url, parse_place};
    use crate::error::GeocodeError;
    use crate::geo::Place;
    use crate::http::{HttpClient, HttpError, HttpResponse};
    use foundation::math::Coordinates;
    use pretty_assertions::assert_eq;

    /// Replays one canned reply and records every url.
    pub(crate) struct CannedHttp {
        pub reply: Result<HttpResponse, HttpError>,
        pub calls: RefCell<Vec<String>>,
    }

    impl CannedHttp {
        pub(crate) fn new(reply: Result<HttpResponse, HttpError>) -> Self {
            Self {
                reply,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpClient for CannedHttp {
        async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            self.calls.borrow_mut().push(url.to_string());
            self.reply.clone()
        }

        async fn post_json(&self, url: &str, _body: &str) -> Result<HttpResponse, HttpError> {
            self.calls.borrow_mut().push(url.to_string());
            self.reply.clone()
        }
    }

    fn place(city: &str, country: &str) -> Place {
        Place {
            city: Some(city.to_string()),
            country: Some(country.to_string()),
        }
    }

    #[test]
    fn city_falls_back_to_town_then_village() {
        let town = r#"{"results":[{"components":{"town":"Hallstatt","country":"Austria"}}]}"#;
        assert_eq!(parse_place(town).unwrap(), place("Hallstatt", "Austria"));

        let village = r#"{"results":[{"components":{"village":"Giethoorn","country":"Netherlands"}}]}"#;
        assert_eq!(parse_place(village).unwrap(), place("Giethoorn", "Netherlands"));

        let both = r#"{"results":[{"components":{"city":"Lyon","town":"x","country":"France"}}]}"#;
        assert_eq!(parse_place(both).unwrap(), place("Lyon", "France"));
    }

    #[test]
    fn empty_and_malformed_bodies_are_errors() {
        assert_eq!(parse_place(r#"{"results":[]}"#), Err(GeocodeError::NoResults));
        assert!(matches!(parse_place("<html>"), Err(GeocodeError::Malformed(_))));
        assert_eq!(
            parse_place(r#"{"results":[{"components":{}}]}"#).unwrap(),
            Place::placeholder()
        );
    }

    #[test]
    fn non_ok_response_degrades_to_placeholder() {
        let http = CannedHttp::new(Ok(HttpResponse::new(503, "busy")));
        let geocoder = ReverseGeocoder::new(&http, "https://geo.test/json", "k");
        let place = pollster::block_on(geocoder.resolve(Coordinates::new(48.2, 16.37)));
        assert_eq!(place, Place::placeholder());
        assert_eq!(http.calls.borrow().len(), 1);
    }

    #[test]
    fn missing_key_skips_the_request() {
        let http = CannedHttp::new(Ok(HttpResponse::new(200, "{}")));
        let geocoder = ReverseGeocoder::new(&http, "https://geo.test/json", "");
        let place = pollster::block_on(geocoder.resolve(Coordinates::new(0.0, 0.0)));
        assert_eq!(place, Place::placeholder());
        assert!(http.calls.borrow().is_empty());
    }

    #[test]
    fn url_carries_coordinates_and_key() {
        let url = geocode_url("https://geo.test/json", "abc", Coordinates::new(1.5, -2.25));
        assert_eq!(url, "https://geo.test/json?q=1.5+-2.25&key=abc&no_annotations=1");
    }

    #[test]
    fn transport_error_degrades() {
        let http = CannedHttp::new(Err(HttpError("offline".to_string())));
        let geocoder = ReverseGeocoder::new(&http, "https://geo.test/json", "k");
        let err = pollster::block_on(geocoder.lookup(Coordinates::new(0.0, 0.0))).unwrap_err();
        assert_eq!(err, GeocodeError::Transport("offline".to_string()));
    }
}
