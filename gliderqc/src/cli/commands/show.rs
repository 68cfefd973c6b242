//! `show` command
//!
//! Prints a document re-serialized from the loaded form, with entry and
//! attribute order preserved.

use crate::cli::args::{DocumentFormat, ShowArgs};
use crate::config::DocumentLoader;
use crate::error::GliderQcError;

/// Print a loaded document.
///
/// # Errors
///
/// Returns an error if the document fails to load or cannot be serialized.
pub fn run(args: &ShowArgs) -> Result<(), GliderQcError> {
    let result = DocumentLoader::with_defaults().load(&args.file)?;
    for warning in &result.warnings {
        tracing::warn!(location = %warning.path, "{}", warning.message);
    }

    match args.format {
        DocumentFormat::Yaml => print!("{}", result.document.to_yaml_string()?),
        DocumentFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result.document.as_ref())?);
        }
    }
    Ok(())
}
