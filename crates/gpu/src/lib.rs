pub mod camera;
pub mod driver;
pub mod renderer;

pub use camera::*;
pub use driver::*;
pub use renderer::*;
