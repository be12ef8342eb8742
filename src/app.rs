//! Application module: the presentation model the terminal UI renders and
//! the runtime drives.

mod model;

pub use model::*;
