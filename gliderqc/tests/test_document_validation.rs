mod common;

use common::{GliderQcProcess, stderr, stdout};

fn validate(fixture: &str, extra: &[&str]) -> std::process::Output {
    let path = GliderQcProcess::fixture(fixture);
    let mut args = vec!["validate", path.as_str()];
    args.extend_from_slice(extra);
    GliderQcProcess::run(&args)
}

/// Empty documents are rejected with a clear error.
#[test]
fn empty_file_rejected() {
    let output = validate("empty.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(
        stdout(&output).contains("Document is empty"),
        "{}",
        stdout(&output)
    );
}

/// Binary content is not a YAML document.
#[test]
fn binary_content_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.yml");
    std::fs::write(&path, b"\x00\x01\x02\x03\xff\xfe\xfd\xfc").unwrap();

    let output = GliderQcProcess::run(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

/// YAML syntax errors are reported with the line they occur on.
#[test]
fn yaml_syntax_error_has_line() {
    let output = validate("bad_yaml.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("parse error"), "{}", stdout(&output));
    assert!(stdout(&output).contains("(line "), "{}", stdout(&output));
}

#[test]
fn missing_required_field() {
    let output = validate("missing_field.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("missing field `nc_var_name`"), "{out}");
    assert!(out.contains("at sbe41n_ph_ref_voltage_shifted"), "{out}");
}

#[test]
fn duplicate_top_level_keys() {
    let output = validate("duplicate_keys.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(
        out.contains("Duplicate key 'sbe41n_ph_ref_voltage_shifted'"),
        "{out}"
    );
}

#[test]
fn unknown_calculation_suggests() {
    let output = validate("unknown_calculation.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("Unknown calculation 'calculate_phh'"), "{out}");
    assert!(out.contains("Did you mean 'calculate_ph'?"), "{out}");
}

#[test]
fn invalid_units() {
    let output = validate("bad_units.yml", &[]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("Invalid units 'mg furlong-1'"), "{out}");
    assert!(
        out.contains("at oxygen_concentration_shifted.attrs.units"),
        "{out}"
    );
}

/// Without a catalog the input variable set is unknown, so an unresolved
/// ancillary variable only warns.
#[test]
fn unresolved_ancillary_without_catalog_warns() {
    let output = validate("missing_ancillary.yml", &[]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("warning: Ancillary variable 'temperatur'"));
}

#[test]
fn unresolved_ancillary_with_catalog_fails() {
    let catalog = GliderQcProcess::fixture("catalog.yml");
    let output = validate("missing_ancillary.yml", &["--variables", &catalog]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("error: Ancillary variable 'temperatur'"), "{out}");
    assert!(out.contains("Did you mean 'temperature'?"), "{out}");
}

#[test]
fn source_missing_from_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("derived.yml");
    std::fs::write(
        &path,
        "sbe41n_ph_ref_voltage_shift:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs:\n    units: '1'\n",
    )
    .unwrap();
    let catalog = GliderQcProcess::fixture("catalog.yml");

    let output = GliderQcProcess::run(&[
        "validate",
        path.to_str().unwrap(),
        "--variables",
        &catalog,
    ]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("not in the variable catalog"), "{out}");
    assert!(
        out.contains("Did you mean 'sbe41n_ph_ref_voltage_shifted'?"),
        "{out}"
    );
}

#[test]
fn warnings_pass_unless_strict() {
    let output = validate("warnings_only.yml", &[]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("warning: No units declared"));

    let strict = validate("warnings_only.yml", &["--strict"]);
    assert_eq!(strict.status.code(), Some(2));
    assert!(stdout(&strict).contains("error: No units declared"));
}

#[test]
fn missing_qc_definition() {
    let qc = GliderQcProcess::fixture("qc");
    let output = validate("missing_qc.yml", &["--qc-dir", &qc]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("QC definition 'does_not_exist.yml'"), "{out}");
    assert!(out.contains("at sbe41n_ph_ref_voltage_shifted.runqc[0]"), "{out}");
}

/// `runqc` names are not checked unless a QC directory is known.
#[test]
fn qc_definitions_unchecked_without_directories() {
    let output = validate("missing_qc.yml", &[]);
    assert!(output.status.success(), "{}", stdout(&output));
}

#[test]
fn path_traversal_in_runqc_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("derived.yml");
    std::fs::write(
        &path,
        "v:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs:\n    units: '1'\n  runqc: [../ph_qartod.yml]\n",
    )
    .unwrap();
    let qc = GliderQcProcess::fixture("qc");

    let output = GliderQcProcess::run(&["validate", path.to_str().unwrap(), "--qc-dir", &qc]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("runqc"), "{}", stdout(&output));
}

#[test]
fn entry_limit_from_environment() {
    let output = GliderQcProcess::run_with_env(
        &[
            "validate",
            &GliderQcProcess::fixture("derived_variables.yml"),
        ],
        &[("GLIDERQC_MAX_ENTRIES", "2")],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Too many entries: 4 (maximum: 2)"));
}

#[test]
fn document_size_limit_from_environment() {
    let output = GliderQcProcess::run_with_env(
        &[
            "validate",
            &GliderQcProcess::fixture("derived_variables.yml"),
        ],
        &[("GLIDERQC_MAX_DOCUMENT_SIZE", "64")],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("file_size"), "{}", stdout(&output));
}

#[test]
fn all_files_reported_before_failing() {
    let output = GliderQcProcess::run(&[
        "validate",
        &GliderQcProcess::fixture("missing_field.yml"),
        &GliderQcProcess::fixture("warnings_only.yml"),
        &GliderQcProcess::fixture("duplicate_keys.yml"),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let out = stdout(&output);
    assert!(out.contains("missing_field.yml: FAILED"), "{out}");
    assert!(out.contains("warnings_only.yml: ok"), "{out}");
    assert!(out.contains("duplicate_keys.yml: FAILED"), "{out}");
    assert!(out.contains("3 file(s) checked: 1 valid, 2 invalid"), "{out}");
    assert!(stderr(&output).contains("2 file(s) failed validation"));
}

#[test]
fn json_log_format_goes_to_stderr() {
    let output = GliderQcProcess::run(&[
        "validate",
        &GliderQcProcess::fixture("warnings_only.yml"),
        "--format",
        "json",
        "--log-format",
        "json",
        "-v",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    serde_json::from_str::<serde_json::Value>(&stdout(&output))
        .expect("stdout should hold only the JSON report");
    let first_log = stderr(&output).lines().next().unwrap_or_default().to_string();
    serde_json::from_str::<serde_json::Value>(&first_log)
        .expect("log lines should be JSON");
}
