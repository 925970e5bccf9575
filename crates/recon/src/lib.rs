//! `shelfmerge-recon`: multi-source product reconciliation and
//! canonicalization engine.
//!
//! Pure engine crate: receives pre-loaded rows, returns consolidated
//! products, category assignments and audit logs. File and process
//! concerns live in the CLI.

pub mod brand;
pub mod category;
pub mod confidence;
pub mod config;
pub mod consolidate;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod keyer;
pub mod load;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconciler;
pub mod rules;
pub mod size;
pub mod summary;
pub mod tables;
pub mod variants;

pub use config::CatalogConfig;
pub use engine::{run, CatalogEngine, CatalogInput};
pub use error::CatalogError;
pub use model::{CatalogResult, ConsolidatedProduct, RawRecord};
pub use tables::Tables;
