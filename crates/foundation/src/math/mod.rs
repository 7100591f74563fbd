pub mod angle;
pub mod geodesy;
pub mod vec;

pub use angle::*;
pub use geodesy::*;
pub use vec::*;
