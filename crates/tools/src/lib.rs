//! Native tooling around the globe viewer: headless simulation and the
//! overlay's network calls, driven from the `globe` binary.

pub mod cli;
pub mod net;
pub mod simulate;
