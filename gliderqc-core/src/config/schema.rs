//! Derived-variable schema types
//!
//! A derived-variable document is a YAML mapping keyed by source variable
//! name. Each entry names the calculation that produces the derived output,
//! the NetCDF variable name of the output, the attributes to attach, and the
//! QC definitions to run against it:
//!
//! ```yaml
//! sbe41n_ph_ref_voltage_shifted:
//!   calculation: calculate_ph
//!   nc_var_name: pH
//!   use_sourcevar_attrs: false
//!   attrs:
//!     long_name: pH
//!     units: "1"
//!     valid_min: 0
//!     valid_max: 14
//!   runqc:
//!     - ph_qartod.yml
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered attribute mapping (`attrs` of an entry, or a catalog variable).
pub type Attributes = IndexMap<String, AttrValue>;

// ============================================================================
// Attribute Values
// ============================================================================

/// A metadata attribute value.
///
/// Most attributes are text. Numeric values (`valid_min`, `valid_max`,
/// `_FillValue`) and numeric lists (`flag_values`) keep their YAML type so a
/// document re-serializes to the same YAML scalars it was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Integer scalar
    Integer(i64),
    /// Floating-point scalar
    Float(f64),
    /// Text scalar
    Text(String),
    /// Sequence of values
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Returns the string view of this value.
    ///
    /// Lists are rendered space-separated, matching how NetCDF tools print
    /// array attributes.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::as_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Returns the numeric value, if this is a number or a numeric string.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// Returns the text if this is a text scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// ============================================================================
// Derived Variable Entry
// ============================================================================

/// Well-known attribute names.
pub mod attr {
    /// Output units
    pub const UNITS: &str = "units";
    /// Whitespace-separated list of supporting variables
    pub const ANCILLARY_VARIABLES: &str = "ancillary_variables";
    /// CF standard name
    pub const STANDARD_NAME: &str = "standard_name";
    /// Descriptive name
    pub const LONG_NAME: &str = "long_name";
    /// Smallest valid value
    pub const VALID_MIN: &str = "valid_min";
    /// Largest valid value
    pub const VALID_MAX: &str = "valid_max";
    /// Explicit fill value
    pub const FILL_VALUE: &str = "_FillValue";
}

/// One derived-variable entry.
///
/// The key the entry is stored under (the source variable) lives in
/// [`DerivedVariableDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedVariable {
    /// Name of the external calculation that produces the output
    pub calculation: String,

    /// Output variable name in the target file
    pub nc_var_name: String,

    /// Inherit the source variable's attributes before applying `attrs`
    #[serde(default)]
    pub use_sourcevar_attrs: bool,

    /// Attributes attached to the output (applied after inherited ones)
    pub attrs: Attributes,

    /// QC definition files to run against the output, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runqc: Option<Vec<String>>,
}

impl DerivedVariable {
    /// Returns the declared `units` attribute.
    #[must_use]
    pub fn units(&self) -> Option<&AttrValue> {
        self.attrs.get(attr::UNITS)
    }

    /// Returns the names listed in `ancillary_variables`.
    #[must_use]
    pub fn ancillary_variables(&self) -> Vec<String> {
        self.attrs
            .get(attr::ANCILLARY_VARIABLES)
            .map(|value| {
                value
                    .as_text()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the QC definition names to run, empty when `runqc` is absent.
    #[must_use]
    pub fn qc_definitions(&self) -> &[String] {
        self.runqc.as_deref().unwrap_or_default()
    }
}

// ============================================================================
// Document
// ============================================================================

/// A derived-variable document: source variable name → entry.
///
/// Entry order is the processing order and is preserved through loading and
/// re-serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedVariableDocument {
    entries: IndexMap<String, DerivedVariable>,
}

impl DerivedVariableDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from ordered entries.
    #[must_use]
    pub const fn from_entries(entries: IndexMap<String, DerivedVariable>) -> Self {
        Self { entries }
    }

    /// Returns the entry derived from `source`.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&DerivedVariable> {
        self.entries.get(source)
    }

    /// Iterates over `(source, entry)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DerivedVariable)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the source variable names in document order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the output variable names in document order.
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|v| v.nc_var_name.as_str())
    }

    /// Returns the position of the entry producing `output`, if any.
    #[must_use]
    pub fn producer_of(&self, output: &str) -> Option<usize> {
        self.entries
            .values()
            .position(|v| v.nc_var_name == output)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-serializes the document as YAML, preserving entry and attribute
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

// ============================================================================
// Variable Catalog
// ============================================================================

/// Pipeline input variables and their attributes.
///
/// Supplies the known variable set for reference checks and the attributes
/// inherited by entries with `use_sourcevar_attrs: true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableCatalog {
    variables: IndexMap<String, Attributes>,
}

impl VariableCatalog {
    /// Creates a catalog from ordered variables.
    #[must_use]
    pub const fn from_variables(variables: IndexMap<String, Attributes>) -> Self {
        Self { variables }
    }

    /// Returns `true` if the catalog declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Returns the attributes of `name`.
    #[must_use]
    pub fn attributes(&self, name: &str) -> Option<&Attributes> {
        self.variables.get(name)
    }

    /// Iterates over declared variable names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

// ============================================================================
// QC Definitions
// ============================================================================

/// A QC test definition file: module → test → parameters.
///
/// ```yaml
/// qartod:
///   gross_range_test:
///     suspect_span: [6.5, 9]
///     fail_span: [0, 14]
///   spike_test:
///     suspect_threshold: 0.1
///     fail_threshold: 0.2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QcDefinition {
    modules: IndexMap<String, IndexMap<String, serde_yaml::Value>>,
}

/// One test of a [`QcDefinition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcTest<'a> {
    /// QC module (e.g. `qartod`)
    pub module: &'a str,
    /// Test name (e.g. `gross_range_test`)
    pub test: &'a str,
    /// Test parameters
    pub params: &'a serde_yaml::Value,
}

impl QcTest<'_> {
    /// Name of the flag variable this test writes for `target`.
    #[must_use]
    pub fn flag_variable(&self, target: &str) -> String {
        format!("{target}_{}_{}", self.module, self.test)
    }
}

impl QcDefinition {
    /// Iterates over all tests in definition order.
    pub fn tests(&self) -> impl Iterator<Item = QcTest<'_>> {
        self.modules.iter().flat_map(|(module, tests)| {
            tests.iter().map(move |(test, params)| QcTest {
                module,
                test,
                params,
            })
        })
    }

    /// Number of tests across all modules.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.modules.values().map(IndexMap::len).sum()
    }

    /// Names of the flag variables the definition produces for `target`.
    #[must_use]
    pub fn flag_variables(&self, target: &str) -> Vec<String> {
        self.tests().map(|t| t.flag_variable(target)).collect()
    }
}

// ============================================================================
// Deployment Layout
// ============================================================================

/// Deployment dataset status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DatasetMode {
    /// Real-time data
    #[default]
    Rt,
    /// Delayed-mode (recovered) data
    Delayed,
}

/// Dataset processing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DatasetLevel {
    /// Science dataset
    #[default]
    Sci,
    /// NGDAC submission dataset
    Ngdac,
}

/// CDM data type of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CdmDataType {
    /// Profile data
    #[default]
    Profile,
}

impl DatasetMode {
    /// Directory name for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rt => "rt",
            Self::Delayed => "delayed",
        }
    }
}

impl DatasetLevel {
    /// Directory prefix for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sci => "sci",
            Self::Ngdac => "ngdac",
        }
    }
}

impl CdmDataType {
    /// Directory suffix for this data type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
