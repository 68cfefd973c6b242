//! `validate` command
//!
//! Loads each document with the full validation context and reports every
//! issue found. Exits non-zero if any document is invalid.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::commands::validation_context;
use crate::config::{DocumentLoader, LoaderOptions};
use crate::error::{ConfigError, GliderQcError, Severity, ValidationIssue};

/// Validation outcome for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// Document path
    pub path: String,
    /// Whether the document loaded
    pub valid: bool,
    /// Errors found
    pub errors: Vec<ValidationIssue>,
    /// Warnings found
    pub warnings: Vec<ValidationIssue>,
}

/// Totals across all files.
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    /// Files checked
    pub files: usize,
    /// Files that loaded
    pub valid: usize,
    /// Files that did not
    pub invalid: usize,
    /// Total errors
    pub errors: usize,
    /// Total warnings
    pub warnings: usize,
}

/// Full `validate` report.
#[derive(Debug, Serialize)]
pub struct ValidateReport {
    /// Per-file results, in argument order
    pub files: Vec<FileReport>,
    /// Totals
    pub summary: Summary,
}

impl ValidateReport {
    fn new(files: Vec<FileReport>) -> Self {
        let summary = files.iter().fold(
            Summary {
                files: files.len(),
                ..Summary::default()
            },
            |mut acc, file| {
                if file.valid {
                    acc.valid += 1;
                } else {
                    acc.invalid += 1;
                }
                acc.errors += file.errors.len();
                acc.warnings += file.warnings.len();
                acc
            },
        );
        Self { files, summary }
    }
}

/// Validate documents.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationFailed`] if any document is invalid, or
/// an error if the validation context cannot be built.
pub fn run(args: &ValidateArgs) -> Result<(), GliderQcError> {
    let validation = validation_context(&args.context, &args.deployment)?;
    let loader = DocumentLoader::new(LoaderOptions {
        validation,
        strict: args.strict,
    });

    let files = args
        .files
        .iter()
        .map(|path| check_file(&loader, path))
        .collect();
    let report = ValidateReport::new(files);

    match args.format {
        OutputFormat::Human => print_human(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.summary.invalid > 0 {
        return Err(ConfigError::ValidationFailed {
            count: report.summary.invalid,
        }
        .into());
    }
    Ok(())
}

/// Loads one document and collects its issues.
pub fn check_file(loader: &DocumentLoader, path: &Path) -> FileReport {
    tracing::info!(file = %path.display(), "validating document");
    let shown = path.display().to_string();

    match loader.load(path) {
        Ok(result) => {
            for warning in &result.warnings {
                tracing::debug!(file = %shown, location = %warning.path, "{}", warning.message);
            }
            FileReport {
                path: shown,
                valid: true,
                errors: Vec::new(),
                warnings: result.warnings,
            }
        }
        Err(ConfigError::ValidationError { errors: issues, .. }) => {
            let (errors, warnings) = issues
                .into_iter()
                .partition(|issue| issue.severity == Severity::Error);
            FileReport {
                path: shown,
                valid: false,
                errors,
                warnings,
            }
        }
        Err(e) => FileReport {
            path: shown,
            valid: false,
            errors: vec![ValidationIssue::error("", e.to_string())],
            warnings: Vec::new(),
        },
    }
}

fn print_human(report: &ValidateReport) {
    for file in &report.files {
        let status = if file.valid { "ok" } else { "FAILED" };
        println!("{}: {status}", file.path);
        for issue in file.errors.iter().chain(&file.warnings) {
            println!("  {issue}");
        }
    }

    let s = &report.summary;
    println!(
        "\n{} file(s) checked: {} valid, {} invalid ({} error(s), {} warning(s))",
        s.files, s.valid, s.invalid, s.errors, s.warnings
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_file_splits_issues() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived.yml");
        fs::write(
            &path,
            "a:\n  calculation: calculate_phh\n  nc_var_name: pH\n  attrs: {long_name: pH}\n",
        )
        .unwrap();

        let report = check_file(&DocumentLoader::with_defaults(), &path);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("Did you mean 'calculate_ph'"));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_check_file_valid_with_warnings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("derived.yml");
        fs::write(
            &path,
            "a:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs: {long_name: pH}\n",
        )
        .unwrap();

        let report = check_file(&DocumentLoader::with_defaults(), &path);
        assert!(report.valid);
        assert_eq!(report.path, path.display().to_string());
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_check_file_missing() {
        let report = check_file(
            &DocumentLoader::with_defaults(),
            Path::new("/nonexistent/derived.yml"),
        );
        assert!(!report.valid);
        assert!(report.errors[0].message.contains("file not found"));
    }

    #[test]
    fn test_summary_totals() {
        let report = ValidateReport::new(vec![
            FileReport {
                path: "a".into(),
                valid: true,
                errors: Vec::new(),
                warnings: vec![ValidationIssue::warning("x", "w")],
            },
            FileReport {
                path: "b".into(),
                valid: false,
                errors: vec![
                    ValidationIssue::error("x", "e"),
                    ValidationIssue::error("y", "e"),
                ],
                warnings: Vec::new(),
            },
        ]);
        assert_eq!(report.summary.files, 2);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.invalid, 1);
        assert_eq!(report.summary.errors, 2);
        assert_eq!(report.summary.warnings, 1);
    }
}
