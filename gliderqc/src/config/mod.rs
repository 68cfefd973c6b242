//! Document loading and validation
//!
//! The schema lives in `gliderqc-core`; this module adds the loading
//! pipeline and the semantic checks run against the pipeline's catalogs.

pub mod loader;
pub mod validation;

pub use gliderqc_core::config::*;
pub use loader::{DocumentLimits, DocumentLoader, LoadResult, LoaderOptions, load_catalog, load_qc_definition};
pub use validation::{ValidationContext, ValidationResult, Validator};
