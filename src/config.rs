//! Settings: the TOML schema, where the file lives, and how environment
//! overrides are layered on top.

mod load;
mod schema;

pub use load::default_log_path;
pub use schema::*;

#[cfg(test)]
mod tests;
