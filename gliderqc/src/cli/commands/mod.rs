//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod list_qc;
pub mod plan;
pub mod show;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use crate::calculation::CalculationCatalog;
use crate::cli::args::{Cli, Commands, ContextArgs, DeploymentArgs};
use crate::config::{DocumentLimits, ValidationContext, load_catalog};
use crate::deployment::{DataHome, DeploymentName};
use crate::error::GliderQcError;
use crate::qc::QcResolver;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), GliderQcError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args),
        Commands::Show(args) => show::run(&args),
        Commands::Plan(args) => plan::run(&args),
        Commands::ListQc(args) => list_qc::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Builds the validation context from command-line flags.
///
/// # Errors
///
/// Returns an error if the variable catalog cannot be loaded or the
/// deployment cannot be located.
pub fn validation_context(
    context: &ContextArgs,
    deployment: &DeploymentArgs,
) -> Result<ValidationContext, GliderQcError> {
    let mut calculations = CalculationCatalog::with_defaults();
    calculations.extend_names(context.calculations.iter().cloned());

    let catalog = context
        .variables
        .as_deref()
        .map(load_catalog)
        .transpose()?;

    Ok(ValidationContext {
        calculations,
        catalog,
        known_variables: context.known_vars.clone(),
        qc_resolver: qc_resolver(&context.qc_dirs, deployment)?,
        limits: DocumentLimits::default(),
    })
}

/// Builds the QC resolver from `--qc-dir` flags and the deployment, if any.
///
/// Returns `None` when neither is given.
///
/// # Errors
///
/// Returns a deployment error if the deployment name is invalid or the
/// deployment cannot be located in the data home.
pub fn qc_resolver(
    qc_dirs: &[PathBuf],
    deployment: &DeploymentArgs,
) -> Result<Option<QcResolver>, GliderQcError> {
    if let Some(name) = &deployment.deployment {
        let name = DeploymentName::parse(name)?;
        let located = DataHome::from_env(deployment.test)?.locate(
            &name,
            deployment.level,
            deployment.cdm_data_type,
            deployment.mode,
        )?;
        tracing::info!(deployment = %name, "using deployment QC directories");
        return Ok(Some(QcResolver::for_deployment(&located, qc_dirs)));
    }

    if qc_dirs.is_empty() {
        return Ok(None);
    }
    Ok(Some(QcResolver::new(qc_dirs.to_vec())))
}
