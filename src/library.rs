//! Track catalog: folder scanning, the ordered track list and filtered views.

mod display;
mod filter;
mod model;
mod scan;

pub use display::{display_from_fields, format_length, format_mmss};
pub use filter::{CatalogView, filter};
pub use model::{Artwork, Catalog, Track};
pub use scan::scan;
