//! Read-only geography and trade datasets

pub mod format;
pub mod store;

pub use format::format_value;
pub use store::{fold, Direction, ExportRecord, GeoDataStore};
