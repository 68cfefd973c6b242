//! `gliderqc` - derived-variable configuration for glider data pipelines
//!
//! Loads and validates the YAML documents that tell a glider processing
//! pipeline which variables to derive, which attributes to attach to them
//! and which QC tests to run, and drives the derivation against an
//! in-memory dataset.

pub mod calculation;
pub mod cli;
pub mod config;
pub mod deployment;
pub mod derive;
pub mod error;
pub mod observability;
pub mod qc;
pub mod suggest;
pub mod units;
