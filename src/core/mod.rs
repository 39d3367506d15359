mod catalog;
mod exporter;
mod iconify;
mod matcher;
mod record;
mod service;
mod svg;

pub use catalog::{detect_source, CollectionSummary};
pub use iconify::RenderOptions;
pub use matcher::{Query, SearchOutcome};
pub use service::IconService;
