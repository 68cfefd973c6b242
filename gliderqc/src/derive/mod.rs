//! Derivation: turning a document into derived variables.
//!
//! [`DerivationPlan`] resolves a document against the variable catalog and
//! the QC definition files. [`Deriver`] applies the plan to a [`Dataset`]
//! using caller-supplied [`Calculator`](crate::calculation::Calculator) and
//! [`QcRunner`](crate::qc::QcRunner) implementations.

pub mod dataset;
pub mod encoding;
pub mod engine;
pub mod plan;

pub use dataset::{Dataset, Variable};
pub use encoding::{Encoding, FillValue, NcType};
pub use engine::{DerivationReport, Deriver, DeriverBuilder, SkippedVariable};
pub use plan::{DerivationPlan, PlannedQc, PlannedVariable};
