//! `gliderqc` Core - derived-variable schema and shared error types
//!
//! This crate provides the configuration types and error types shared
//! between the `gliderqc` loader/CLI and pipelines that embed the schema
//! directly.

pub mod config;
pub mod error;
