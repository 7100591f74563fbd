use foundation::math::Coordinates;
use tracing::{debug, info, warn};

use crate::error::GeoError;

pub const PLACEHOLDER_CITY: &str = "Unknown";
pub const PLACEHOLDER_COUNTRY: &str = "Location";

/// Human-readable name for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Place {
    /// What a failed lookup resolves to.
    pub fn placeholder() -> Self {
        Self {
            city: Some(PLACEHOLDER_CITY.to_string()),
            country: Some(PLACEHOLDER_COUNTRY.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => format!("{city}, {country}"),
            (Some(one), None) | (None, Some(one)) => one.clone(),
            (None, None) => format!("{PLACEHOLDER_CITY} {PLACEHOLDER_COUNTRY}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoLocation {
    Idle,
    Loading,
    Resolved { coords: Coordinates, place: Place },
    Failed { reason: GeoError },
}

impl GeoLocation {
    pub fn is_loading(&self) -> bool {
        matches!(self, GeoLocation::Loading)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeoLocation::Resolved { coords, .. } => Some(*coords),
            _ => None,
        }
    }

    /// Status line shown under the location control.
    pub fn status_text(&self) -> Option<String> {
        match self {
            GeoLocation::Idle => None,
            GeoLocation::Loading => Some("Getting location...".to_string()),
            GeoLocation::Resolved { place, .. } => Some(place.label()),
            GeoLocation::Failed { reason } => Some(reason.to_string()),
        }
    }
}

/// Single-shot device position.
#[allow(async_fn_in_trait)]
pub trait PositionSource {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeoTicket(u64);

/// Owns the [`GeoLocation`] and admits at most one acquisition at a time.
#[derive(Debug, Clone)]
pub struct Geolocator {
    state: GeoLocation,
    in_flight: Option<GeoTicket>,
    next_ticket: u64,
}

impl Default for Geolocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Geolocator {
    pub fn new() -> Self {
        Self {
            state: GeoLocation::Idle,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &GeoLocation {
        &self.state
    }

    /// Enter `Loading` and hand out the ticket for this attempt. Returns
    /// `None` while an attempt is already in flight.
    pub fn begin(&mut self) -> Option<GeoTicket> {
        if self.in_flight.is_some() {
            debug!("location request already in flight");
            return None;
        }
        let ticket = GeoTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.state = GeoLocation::Loading;
        debug!(ticket = ticket.0, "acquiring location");
        Some(ticket)
    }

    /// Apply the outcome of the attempt `ticket`. Outcomes for any other
    /// ticket are discarded; returns whether the state changed.
    pub fn finish(
        &mut self,
        ticket: GeoTicket,
        outcome: Result<(Coordinates, Place), GeoError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(ticket = ticket.0, "discarding stale location result");
            return false;
        }
        self.in_flight = None;
        self.state = match outcome {
            Ok((coords, place)) => {
                info!(
                    lat = coords.lat_deg,
                    lng = coords.lng_deg,
                    place = %place.label(),
                    "location resolved"
                );
                GeoLocation::Resolved { coords, place }
            }
            Err(reason) => {
                warn!(%reason, "location failed");
                GeoLocation::Failed { reason }
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoLocation, Geolocator, Place};
    use crate::error::GeoError;
    use foundation::math::Coordinates;

    #[test]
    fn second_trigger_while_loading_is_refused() {
        let mut geo = Geolocator::new();
        let first = geo.begin().unwrap();
        assert!(geo.state().is_loading());
        for _ in 0..10 {
            assert!(geo.begin().is_none());
        }
        assert!(geo.finish(first, Err(GeoError::PermissionOrTimeout)));
        assert_eq!(
            geo.state(),
            &GeoLocation::Failed {
                reason: GeoError::PermissionOrTimeout
            }
        );
        assert!(geo.begin().is_some());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut geo = Geolocator::new();
        let first = geo.begin().unwrap();
        geo.finish(first, Err(GeoError::Unsupported));
        let second = geo.begin().unwrap();
        assert!(!geo.finish(first, Ok((Coordinates::new(1.0, 2.0), Place::placeholder()))));
        assert!(geo.state().is_loading());
        assert!(geo.finish(second, Ok((Coordinates::new(1.0, 2.0), Place::placeholder()))));
        assert_eq!(geo.state().coordinates(), Some(Coordinates::new(1.0, 2.0)));
    }

    #[test]
    fn status_text_follows_state() {
        let mut geo = Geolocator::new();
        assert_eq!(geo.state().status_text(), None);
        let t = geo.begin().unwrap();
        assert_eq!(geo.state().status_text().as_deref(), Some("Getting location..."));
        geo.finish(t, Ok((Coordinates::new(0.0, 0.0), Place::placeholder())));
        assert_eq!(geo.state().status_text().as_deref(), Some("Unknown, Location"));
    }
}
