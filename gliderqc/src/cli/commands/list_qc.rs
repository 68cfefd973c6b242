//! `list-qc` command
//!
//! Lists the QC definition files a `runqc` name can refer to, per search
//! directory and in lookup order.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::args::{ListQcArgs, OutputFormat};
use crate::cli::commands::qc_resolver;
use crate::error::GliderQcError;
use crate::qc::QcDefinitionFile;

#[derive(Debug, Serialize)]
struct DirectoryListing {
    directory: PathBuf,
    exists: bool,
    files: Vec<QcDefinitionFile>,
}

/// List available QC definition files.
///
/// # Errors
///
/// Returns a usage error if neither `--qc-dir` nor `--deployment` is given,
/// or a deployment error if the deployment cannot be located.
pub fn run(args: &ListQcArgs) -> Result<(), GliderQcError> {
    let resolver = qc_resolver(&args.qc_dirs, &args.deployment)?.ok_or_else(|| {
        GliderQcError::Usage("no QC directories: pass --qc-dir or --deployment".to_string())
    })?;

    let listings: Vec<DirectoryListing> = resolver
        .list()
        .into_iter()
        .map(|(directory, files)| DirectoryListing {
            exists: directory.is_dir(),
            directory,
            files,
        })
        .collect();

    match args.format {
        OutputFormat::Human => {
            for listing in &listings {
                println!("{}:", listing.directory.display());
                if !listing.exists {
                    println!("  (missing)");
                } else if listing.files.is_empty() {
                    println!("  (none)");
                }
                for file in &listing.files {
                    println!("  {}", file.name);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings)?),
    }
    Ok(())
}
