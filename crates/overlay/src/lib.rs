//! The submission overlay: modal host, content form and the asynchronous
//! collaborators behind it (device position, reverse geocoding, file
//! previews, the content endpoint).
//!
//! Every state machine here is plain data advanced by `begin_*`/`finish_*`
//! pairs. The async drivers in [`form`] borrow state only around those calls
//! and re-check liveness after every await.

pub mod config;
pub mod error;
pub mod form;
pub mod geo;
pub mod geocode;
pub mod http;
pub mod media;
pub mod modal;
pub mod submission;

pub use config::*;
pub use error::*;
pub use form::*;
pub use geo::*;
pub use geocode::*;
pub use http::*;
pub use media::*;
pub use modal::*;
pub use submission::*;
