//! Lazy, best-effort tag resolution off the foreground thread.

mod cache;
mod reader;

pub use cache::{MetadataCache, MetadataUpdate, resolve};
pub use reader::{LoftyReader, TagInfo, TagReader};
