pub mod aggregate;
pub mod config;
pub mod direction;
pub mod error;
pub mod extract;
pub mod extractor;
pub mod incidents;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod placemark;
pub mod report;
pub mod sheet;
pub mod store;
