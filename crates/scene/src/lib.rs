pub mod config;
pub mod globe;
pub mod layer;
pub mod lighting;
pub mod orbit;
pub mod starfield;

pub use config::*;
pub use globe::*;
pub use layer::*;
pub use lighting::*;
pub use orbit::*;
pub use starfield::*;
