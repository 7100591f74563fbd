use thiserror::Error;

/// Device-level position failures. Both end the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("Failed to get location")]
    PermissionOrTimeout,
}

/// Why a place-name lookup came back empty. Never shown to the viewer; the
/// resolver substitutes placeholder names instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("no geocoding api key configured")]
    MissingKey,
    #[error("geocode request failed: {0}")]
    Transport(String),
    #[error("geocode endpoint returned status {0}")]
    Status(u16),
    #[error("malformed geocode response: {0}")]
    Malformed(String),
    #[error("geocode response had no results")]
    NoResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message is required")]
    EmptyMessage,
    #[error("Coordinates out of range")]
    CoordinatesOutOfRange,
}

/// Submission failures collapse to one viewer-facing message; the detail is
/// only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Failed to submit")]
    Network { reason: String },
    #[error("Failed to submit")]
    Status { status: u16 },
    #[error("Failed to submit")]
    Encode { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("could not read {name}: {reason}")]
    Read { name: String, reason: String },
    #[error("{name} is empty")]
    Empty { name: String },
}
