//! Document loader
//!
//! This module implements the document loading pipeline:
//! 1. Size check
//! 2. UTF-8 BOM removal
//! 3. YAML parsing into ordered entries, recording duplicate keys
//! 4. Per-entry deserialization to `DerivedVariable`
//! 5. Validation
//! 6. Freeze with `Arc`
//!
//! Broken entries do not stop the pipeline: each one becomes a validation
//! issue and loading continues so every problem is reported together.

use crate::config::validation::{ValidationContext, ValidationResult, Validator};
use crate::error::{ConfigError, Severity, ValidationIssue};

use gliderqc_core::config::{DerivedVariable, DerivedVariableDocument, QcDefinition, VariableCatalog};
use indexmap::IndexMap;
use serde::de::{Deserialize, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Public API
// ============================================================================

/// Limits on document size to prevent resource exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLimits {
    /// Maximum file size in bytes.
    pub max_document_size: usize,

    /// Maximum number of entries.
    pub max_entries: usize,

    /// Maximum number of attributes per entry.
    pub max_attrs: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_document_size: env_or("GLIDERQC_MAX_DOCUMENT_SIZE", 1024 * 1024),
            max_entries: env_or("GLIDERQC_MAX_ENTRIES", 500),
            max_attrs: env_or("GLIDERQC_MAX_ATTRS", 200),
        }
    }
}

/// Options for the document loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// What documents are validated against.
    pub validation: ValidationContext,

    /// Treat warnings as errors.
    pub strict: bool,
}

/// Result of loading a document.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated document.
    pub document: Arc<DerivedVariableDocument>,

    /// Warnings encountered during loading.
    pub warnings: Vec<ValidationIssue>,
}

/// Document loader.
///
/// Handles the full loading pipeline from YAML file to frozen
/// `DerivedVariableDocument`.
#[derive(Debug, Default)]
pub struct DocumentLoader {
    options: LoaderOptions,
}

impl DocumentLoader {
    /// Creates a new document loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new document loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// The loader's options.
    #[must_use]
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Loads a document file and returns the frozen document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - YAML parsing fails, or the document is empty or not a mapping
    /// - Validation fails (every issue is carried by
    ///   [`ConfigError::ValidationError`])
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let max_size = self.options.validation.limits.max_document_size;

        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > max_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!(
                    "at most {max_size} bytes (set GLIDERQC_MAX_DOCUMENT_SIZE to increase the limit)"
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        tracing::debug!(path = %path.display(), bytes = file_size, "loading document");
        self.load_from_str(&content, path)
    }

    /// Runs the loading pipeline on in-memory text.
    ///
    /// `origin` names the document in errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], minus file access.
    pub fn load_from_str(&self, content: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        // Handle UTF-8 BOM
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        // Stage 1: YAML parsing into ordered entries
        let raw = parse_yaml::<Option<RawEntries>>(content, origin)?.ok_or_else(|| {
            ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: "Document is empty".to_string(),
            }
        })?;

        let mut result = ValidationResult::default();

        // Stage 2: Duplicate keys
        for (key, index) in &raw.duplicates {
            result.push(ValidationIssue::error(
                key.as_str(),
                format!("Duplicate key '{key}' (first defined as entry {})", index + 1),
            ));
        }

        // Stage 3: Per-entry deserialization
        let mut entries = IndexMap::with_capacity(raw.entries.len());
        for (key, value) in raw.entries {
            match serde_yaml::from_value::<DerivedVariable>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => result.push(ValidationIssue::error(
                    key.as_str(),
                    format!("Invalid entry: {e}"),
                )),
            }
        }
        let document = DerivedVariableDocument::from_entries(entries);

        // Stage 4: Validation
        let mut validator = Validator::new();
        let validation = validator.validate(&document, &self.options.validation);
        result.errors.extend(validation.errors);
        result.warnings.extend(validation.warnings);

        if self.options.strict {
            for mut warning in std::mem::take(&mut result.warnings) {
                warning.severity = Severity::Error;
                result.errors.push(warning);
            }
        }

        if result.has_errors() {
            tracing::debug!(
                origin = %origin.display(),
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                "document failed validation"
            );
            let mut issues = result.errors;
            issues.extend(result.warnings);
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: issues,
            });
        }

        // Stage 5: Freeze
        Ok(LoadResult {
            document: Arc::new(document),
            warnings: result.warnings,
        })
    }
}

/// Loads a variable catalog.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] if the file cannot be read and
/// [`ConfigError::ParseError`] if it is empty or not a catalog.
pub fn load_catalog(path: &Path) -> Result<VariableCatalog, ConfigError> {
    load_yaml_file(path)
}

/// Loads a QC definition file.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] if the file cannot be read and
/// [`ConfigError::ParseError`] if it is empty or not a QC definition.
pub fn load_qc_definition(path: &Path) -> Result<QcDefinition, ConfigError> {
    load_yaml_file(path)
}

// ============================================================================
// Ordered Parsing
// ============================================================================

/// Top-level entries in document order, before typed deserialization.
struct RawEntries {
    entries: Vec<(String, Value)>,
    /// Repeated keys with the position of their first definition.
    duplicates: Vec<(String, usize)>,
}

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawEntriesVisitor)
    }
}

struct RawEntriesVisitor;

impl<'de> Visitor<'de> for RawEntriesVisitor {
    type Value = RawEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of source variable names to derived-variable entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        let mut duplicates = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: Value = map.next_value()?;
            if let Some(first) = entries.iter().position(|(k, _)| *k == key) {
                duplicates.push((key, first));
            } else {
                entries.push((key, value));
            }
        }
        Ok(RawEntries {
            entries,
            duplicates,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses YAML text, mapping errors to [`ConfigError::ParseError`].
fn parse_yaml<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, ConfigError> {
    if is_blank(content) {
        return Err(ConfigError::ParseError {
            path: origin.to_path_buf(),
            line: None,
            message: "Document is empty".to_string(),
        });
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })
}

/// Reads and parses a supporting YAML file.
fn load_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    parse_yaml(content, path)
}

/// Returns `true` if the text holds nothing but whitespace and comments.
fn is_blank(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gliderqc_core::config::AttrValue;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const DOCUMENT: &str = "\
oxygen_concentration_shifted:
  calculation: convert_do_mgL
  nc_var_name: oxygen_concentration_shifted_mgL
  attrs:
    units: mg L-1
sbe41n_ph_ref_voltage_shifted:
  calculation: calculate_ph
  nc_var_name: pH
  attrs:
    units: '1'
";

    fn origin() -> PathBuf {
        PathBuf::from("derived.yml")
    }

    fn load(content: &str) -> Result<LoadResult, ConfigError> {
        DocumentLoader::with_defaults().load_from_str(content, &origin())
    }

    fn issue_messages(err: &ConfigError) -> Vec<String> {
        err.issues().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_load_valid_document() {
        let result = load(DOCUMENT).unwrap();
        assert_eq!(result.document.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_bom_is_stripped() {
        let content = format!("\u{feff}{DOCUMENT}");
        assert_eq!(load(&content).unwrap().document.len(), 2);
    }

    #[test]
    fn test_empty_document() {
        for content in ["", "   \n", "# only a comment\n", "---\n"] {
            let err = load(content).unwrap_err();
            assert!(
                matches!(&err, ConfigError::ParseError { message, .. } if message.contains("empty")),
                "{content:?}: {err}"
            );
        }
    }

    #[test]
    fn test_null_document_is_empty() {
        let err = load("~\n").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_non_mapping_document() {
        let err = load("- a\n- b\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_syntax_error_has_line() {
        let err = load("a:\n  calculation: [unclosed\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(_), .. }));
    }

    #[test]
    fn test_duplicate_keys_reported() {
        let content = format!(
            "{DOCUMENT}oxygen_concentration_shifted:\n  calculation: calculate_ph\n  nc_var_name: other\n  attrs: {{units: '1'}}\n"
        );
        let err = load(&content).unwrap_err();
        let messages = issue_messages(&err);
        assert!(
            messages
                .iter()
                .any(|m| m.contains("Duplicate key 'oxygen_concentration_shifted'")),
            "{messages:?}"
        );
    }

    #[test]
    fn test_all_broken_entries_reported() {
        let content = "\
a:
  nc_var_name: x
  attrs: {units: '1'}
b:
  calculation: calculate_ph
  attrs: {units: '1'}
c:
  calculation: calculate_ph
  nc_var_name: z
d:
  calculation: calculate_ph
  nc_varname: w
  attrs: {units: '1'}
";
        let err = load(content).unwrap_err();
        let issues = err.issues();
        for (key, needle) in [
            ("a", "calculation"),
            ("b", "nc_var_name"),
            ("c", "attrs"),
            ("d", "nc_varname"),
        ] {
            assert!(
                issues
                    .iter()
                    .any(|i| i.path == key && i.message.contains(needle)),
                "missing issue for {key}: {issues:?}"
            );
        }
    }

    #[test]
    fn test_warnings_returned() {
        let content = "a:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs: {long_name: pH}\n";
        let result = load(content).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "a.attrs.units");
    }

    #[test]
    fn test_strict_promotes_warnings() {
        let content = "a:\n  calculation: calculate_ph\n  nc_var_name: pH\n  attrs: {long_name: pH}\n";
        let loader = DocumentLoader::new(LoaderOptions {
            strict: true,
            ..LoaderOptions::default()
        });
        let err = loader.load_from_str(content, &origin()).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].severity, Severity::Error);
    }

    #[test]
    fn test_validation_error_carries_warnings_too() {
        let content = "a:\n  calculation: nope\n  nc_var_name: pH\n  attrs: {long_name: pH}\n";
        let err = load(content).unwrap_err();
        let severities: Vec<_> = err.issues().iter().map(|i| i.severity).collect();
        assert_eq!(severities, [Severity::Error, Severity::Warning]);
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let content = "\
z_source:
  calculation: calculate_ph
  nc_var_name: pH
  use_sourcevar_attrs: true
  attrs:
    units: '1'
    valid_min: 0
    valid_max: 14.0
    flag_values: [1, 2, 3]
    comment: 'pH: total scale'
  runqc:
    - b.yml
    - a.yml
a_source:
  calculation: calculate_ta
  nc_var_name: total_alkalinity
  attrs:
    units: umol kg-1
";
        let first = load(content).unwrap().document;
        let yaml = first.to_yaml_string().unwrap();
        let second = load(&yaml).unwrap().document;
        assert_eq!(first, second);
        assert_eq!(
            second.sources().collect::<Vec<_>>(),
            ["z_source", "a_source"]
        );
        let ph = second.get("z_source").unwrap();
        assert_eq!(ph.attrs["valid_max"], AttrValue::Float(14.0));
        assert_eq!(ph.qc_definitions(), ["b.yml", "a.yml"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DocumentLoader::with_defaults()
            .load(Path::new("/nonexistent/derived.yml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let mut options = LoaderOptions::default();
        options.validation.limits.max_document_size = 16;
        let err = DocumentLoader::new(options).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "file_size"));
    }

    #[test]
    fn test_load_catalog_and_qc_definition() {
        let mut catalog = NamedTempFile::new().unwrap();
        catalog
            .write_all(b"temperature:\n  units: degrees_Celsius\n")
            .unwrap();
        assert!(load_catalog(catalog.path()).unwrap().contains("temperature"));

        let mut qc = NamedTempFile::new().unwrap();
        qc.write_all(b"qartod:\n  spike_test:\n    fail_threshold: 0.2\n")
            .unwrap();
        assert_eq!(load_qc_definition(qc.path()).unwrap().test_count(), 1);

        let mut bad = NamedTempFile::new().unwrap();
        bad.write_all(b"qartod: [1, 2\n").unwrap();
        assert!(matches!(
            load_qc_definition(bad.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("GLIDERQC_TEST_UNSET_VARIABLE_XYZ", 42usize), 42);
    }
}
