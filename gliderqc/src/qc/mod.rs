//! Quality control: definition lookup, QARTOD flags and the runner seam.
//!
//! A `runqc` entry names a definition file. Each test in the file writes one
//! flag variable, `<nc_var_name>_<module>_<test>`, holding a [`QartodFlag`]
//! per sample.

pub mod flags;
pub mod resolver;

pub use flags::{QartodFlag, flag_attributes};
pub use resolver::{QcDefinitionFile, QcResolver, ResolvedQc};

use crate::derive::{Dataset, Variable};
use crate::error::DerivationError;
use gliderqc_core::config::QcTest;

/// Executes the tests of one QC module (e.g. `qartod`).
pub trait QcRunner: Send + Sync {
    /// Runs `test` against `target`, returning one flag per sample.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError::QcFailed`] if the test cannot run with the
    /// given parameters.
    fn run(
        &self,
        test: &QcTest<'_>,
        target: &Variable,
        dataset: &Dataset,
    ) -> Result<Vec<QartodFlag>, DerivationError>;
}
