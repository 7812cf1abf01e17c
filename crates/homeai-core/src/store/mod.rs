// ── Catalog storage ──

mod catalog;
mod device_store;

pub use catalog::{Catalog, CatalogOrigin, SourceOutcome, SourceReport};
pub use device_store::DeviceStore;
