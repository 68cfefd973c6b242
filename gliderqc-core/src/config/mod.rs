//! Configuration schema for derived-variable documents and their
//! supporting files (variable catalogs, QC definitions).

pub mod schema;

pub use schema::*;
