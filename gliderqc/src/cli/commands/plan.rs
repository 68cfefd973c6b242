//! `plan` command
//!
//! Shows what a document will do to a dataset: output attributes after
//! inheritance, encodings, and the QC flag variables each entry adds.

use std::fmt::Write as _;

use crate::cli::args::{OutputFormat, PlanArgs};
use crate::cli::commands::validation_context;
use crate::config::{DocumentLoader, LoaderOptions};
use crate::derive::DerivationPlan;
use crate::error::GliderQcError;

/// Print the derivation plan for a document.
///
/// # Errors
///
/// Returns an error if the document fails validation or a `runqc` name
/// cannot be resolved.
pub fn run(args: &PlanArgs) -> Result<(), GliderQcError> {
    let validation = validation_context(&args.context, &args.deployment)?;
    let catalog = validation.catalog.clone();
    let resolver = validation.qc_resolver.clone().unwrap_or_default();

    let result = DocumentLoader::new(LoaderOptions {
        validation,
        strict: false,
    })
    .load(&args.file)?;
    for warning in &result.warnings {
        tracing::warn!(location = %warning.path, "{}", warning.message);
    }

    let plan = DerivationPlan::build(&result.document, catalog.as_ref(), &resolver)?;

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

/// Renders a plan as indented text.
#[must_use]
pub fn render_human(plan: &DerivationPlan) -> String {
    let mut out = String::new();
    for (i, step) in plan.steps().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} <- {} [{}]",
            step.output, step.source, step.calculation
        );
        let _ = writeln!(
            out,
            "  encoding: {}, _FillValue {}",
            step.encoding.dtype, step.encoding.fill_value
        );
        if step.use_sourcevar_attrs {
            out.push_str("  inherits source attributes\n");
        }
        out.push_str("  attrs:\n");
        for (key, value) in &step.attrs {
            let _ = writeln!(out, "    {key}: {value}");
        }
        for qc in &step.qc {
            let _ = writeln!(out, "  qc: {} ({})", qc.name, qc.path.display());
            for flag in &qc.flag_variables {
                let _ = writeln!(out, "    {flag}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qc::QcResolver;
    use gliderqc_core::config::DerivedVariableDocument;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_render_human() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("ph.yml"),
            "qartod:\n  gross_range_test:\n    fail_span: [0, 14]\n",
        )
        .unwrap();
        let doc: DerivedVariableDocument = serde_yaml::from_str(
            "v:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs:\n    units: '1'\n  runqc: [ph.yml]\n",
        )
        .unwrap();
        let resolver = QcResolver::new(vec![tmp.path().to_path_buf()]);
        let plan = DerivationPlan::build(&doc, None, &resolver).unwrap();

        let text = render_human(&plan);
        assert!(text.starts_with("pH <- v [calculate_ph]\n"), "{text}");
        assert!(text.contains("  encoding: f8, _FillValue "));
        assert!(text.contains("    units: 1\n"));
        assert!(text.contains("  qc: ph.yml ("));
        assert!(text.contains("    pH_qartod_gross_range_test\n"));
    }
}
