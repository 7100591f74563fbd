pub mod frame;
pub mod loading;
pub mod render_loop;

pub use frame::*;
pub use loading::*;
pub use render_loop::*;
