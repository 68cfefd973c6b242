//! Document validation
//!
//! Schema and semantic checks on a loaded `DerivedVariableDocument`.
//! Validation collects every issue rather than stopping at the first, so a
//! maintainer sees everything wrong with a document in one run.

use crate::calculation::CalculationCatalog;
use crate::config::loader::DocumentLimits;
use crate::error::{Severity, ValidationIssue};
use crate::qc::QcResolver;
use crate::suggest;
use crate::units::Unit;

use gliderqc_core::config::{
    AttrValue, DerivedVariable, DerivedVariableDocument, QcDefinition, VariableCatalog, attr,
};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static NETCDF_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static CF_STANDARD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

// ============================================================================
// Public API
// ============================================================================

/// What a document is validated against.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Calculations the pipeline can run.
    pub calculations: CalculationCatalog,

    /// Pipeline input variables. Without a catalog, sources cannot be
    /// checked and unresolved ancillary variables are only warnings.
    pub catalog: Option<VariableCatalog>,

    /// Additional variable names treated as known.
    pub known_variables: Vec<String>,

    /// Where `runqc` names are looked up. Without a resolver, QC
    /// definitions are not checked.
    pub qc_resolver: Option<QcResolver>,

    /// Document size limits.
    pub limits: DocumentLimits,
}

/// Result of document validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an issue to the list matching its severity.
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

/// Document validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a document and returns every issue found.
    pub fn validate(
        &mut self,
        document: &DerivedVariableDocument,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let qc = self.load_qc_definitions(document, ctx);
        let known = known_variables(document, ctx, &qc);

        for (index, (source, entry)) in document.iter().enumerate() {
            self.validate_schema(source, entry);
            self.validate_names(source, entry);
            self.validate_calculation(source, entry, ctx);
            self.validate_units(source, entry, ctx);
            self.validate_range(source, entry);
            self.validate_standard_name(source, entry);
            self.validate_ancillary_variables(source, entry, ctx, &known);
            self.validate_source(index, source, entry, document, ctx);
            self.validate_runqc(source, entry);
        }

        self.validate_unique_outputs(document);
        self.validate_limits(document, &ctx.limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Schema Validation
    // ========================================================================

    fn validate_schema(&mut self, source: &str, entry: &DerivedVariable) {
        if entry.calculation.trim().is_empty() {
            self.add_error(
                &format!("{source}.calculation"),
                "Calculation is required and cannot be empty",
            );
        }
        if entry.nc_var_name.trim().is_empty() {
            self.add_error(
                &format!("{source}.nc_var_name"),
                "Output variable name is required and cannot be empty",
            );
        }
        if entry.attrs.is_empty() {
            self.add_warning(
                &format!("{source}.attrs"),
                "No attributes declared for the output variable",
            );
        }
    }

    fn validate_names(&mut self, source: &str, entry: &DerivedVariable) {
        let name = &entry.nc_var_name;
        if !name.is_empty() && !NETCDF_NAME.is_match(name) {
            self.add_error(
                &format!("{source}.nc_var_name"),
                &format!(
                    "'{name}' is not a valid NetCDF variable name \
                     (letters, digits and underscores, not starting with a digit)"
                ),
            );
        }
        if *name == source {
            self.add_warning(
                &format!("{source}.nc_var_name"),
                &format!("Output '{name}' overwrites its own source variable"),
            );
        }
    }

    fn validate_unique_outputs(&mut self, document: &DerivedVariableDocument) {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (source, entry) in document.iter() {
            if entry.nc_var_name.is_empty() {
                continue;
            }
            if let Some(first) = seen.get(entry.nc_var_name.as_str()) {
                self.add_error(
                    &format!("{source}.nc_var_name"),
                    &format!(
                        "Duplicate output name '{}' (also produced from '{first}')",
                        entry.nc_var_name
                    ),
                );
            } else {
                seen.insert(&entry.nc_var_name, source);
            }
        }
    }

    // ========================================================================
    // Semantic Validation
    // ========================================================================

    fn validate_calculation(&mut self, source: &str, entry: &DerivedVariable, ctx: &ValidationContext) {
        let name = &entry.calculation;
        if name.trim().is_empty() || ctx.calculations.contains(name) {
            return;
        }
        let mut message = format!("Unknown calculation '{name}'");
        if let Some(suggestion) = ctx.calculations.suggest(name) {
            message.push_str(&format!(". Did you mean '{suggestion}'?"));
        }
        self.add_error(&format!("{source}.calculation"), &message);
    }

    fn validate_units(&mut self, source: &str, entry: &DerivedVariable, ctx: &ValidationContext) {
        let path = format!("{source}.attrs.{}", attr::UNITS);
        let Some(value) = entry.units() else {
            self.add_warning(&path, "No units declared for the output variable");
            return;
        };

        let text = value.as_text();
        let unit = match Unit::parse(&text) {
            Ok(unit) => unit,
            Err(e) => {
                self.add_error(&path, &format!("Invalid units '{text}': {e}"));
                return;
            }
        };

        let expected = ctx
            .calculations
            .get(&entry.calculation)
            .and_then(|c| c.output_dimension);
        if let Some(expected) = expected {
            if unit.dimension() != expected {
                self.add_warning(
                    &path,
                    &format!(
                        "Units '{text}' have dimension [{}] but '{}' produces [{expected}]",
                        unit.dimension(),
                        entry.calculation
                    ),
                );
            }
        }
    }

    fn validate_range(&mut self, source: &str, entry: &DerivedVariable) {
        let min = self.numeric_attr(source, entry, attr::VALID_MIN);
        let max = self.numeric_attr(source, entry, attr::VALID_MAX);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                self.add_error(
                    &format!("{source}.attrs"),
                    &format!("valid_min ({min}) is greater than valid_max ({max})"),
                );
            }
        }
    }

    fn numeric_attr(&mut self, source: &str, entry: &DerivedVariable, name: &str) -> Option<f64> {
        let value = entry.attrs.get(name)?;
        let number = value.as_f64();
        if number.is_none() {
            self.add_error(
                &format!("{source}.attrs.{name}"),
                &format!("{name} must be numeric, got '{value}'"),
            );
        }
        number
    }

    fn validate_standard_name(&mut self, source: &str, entry: &DerivedVariable) {
        let Some(value) = entry.attrs.get(attr::STANDARD_NAME) else {
            return;
        };
        let ok = matches!(value, AttrValue::Text(s) if CF_STANDARD_NAME.is_match(s));
        if !ok {
            self.add_warning(
                &format!("{source}.attrs.{}", attr::STANDARD_NAME),
                &format!("'{value}' is not a valid CF standard name"),
            );
        }
    }

    fn validate_ancillary_variables(
        &mut self,
        source: &str,
        entry: &DerivedVariable,
        ctx: &ValidationContext,
        known: &IndexSet<String>,
    ) {
        let path = format!("{source}.attrs.{}", attr::ANCILLARY_VARIABLES);
        for name in entry.ancillary_variables() {
            if known.contains(&name) {
                continue;
            }
            let mut message = format!("Ancillary variable '{name}' does not resolve to a known variable");
            if let Some(suggestion) = suggest::closest(&name, known.iter().map(String::as_str)) {
                message.push_str(&format!(". Did you mean '{suggestion}'?"));
            }
            if ctx.catalog.is_some() {
                self.add_error(&path, &message);
            } else {
                self.add_warning(&path, &message);
            }
        }
    }

    fn validate_source(
        &mut self,
        index: usize,
        source: &str,
        entry: &DerivedVariable,
        document: &DerivedVariableDocument,
        ctx: &ValidationContext,
    ) {
        let Some(catalog) = &ctx.catalog else {
            return;
        };
        if catalog.contains(source) || ctx.known_variables.iter().any(|k| k == source) {
            return;
        }

        match document.producer_of(source) {
            Some(producer) if producer < index => {}
            Some(producer) if producer > index => {
                let producer_key = document.sources().nth(producer).unwrap_or_default();
                self.add_error(
                    source,
                    &format!(
                        "Source '{source}' is produced by a later entry ('{producer_key}'); \
                         entries are processed in document order"
                    ),
                );
            }
            _ if entry.nc_var_name == source => {
                self.add_error(
                    source,
                    &format!("Source '{source}' is not in the variable catalog"),
                );
            }
            _ => {
                let mut message = format!("Source '{source}' is not in the variable catalog");
                if let Some(suggestion) = suggest::closest(source, catalog.names()) {
                    message.push_str(&format!(". Did you mean '{suggestion}'?"));
                }
                self.add_error(source, &message);
            }
        }
    }

    fn validate_runqc(&mut self, source: &str, entry: &DerivedVariable) {
        let Some(runqc) = &entry.runqc else {
            return;
        };
        if runqc.is_empty() {
            self.add_warning(&format!("{source}.runqc"), "runqc is present but lists no QC definitions");
        }
        let mut seen = HashSet::new();
        for (i, name) in runqc.iter().enumerate() {
            if !seen.insert(name) {
                self.add_warning(
                    &format!("{source}.runqc[{i}]"),
                    &format!("QC definition '{name}' is listed more than once"),
                );
            }
        }
    }

    /// Loads every `runqc` definition once. Failures are reported here;
    /// the returned map only holds definitions that loaded with tests.
    fn load_qc_definitions(
        &mut self,
        document: &DerivedVariableDocument,
        ctx: &ValidationContext,
    ) -> IndexMap<String, Vec<String>> {
        let mut flags_by_output = IndexMap::new();
        let Some(resolver) = &ctx.qc_resolver else {
            return flags_by_output;
        };

        let mut cache: HashMap<&str, Option<QcDefinition>> = HashMap::new();
        for (source, entry) in document.iter() {
            let mut flags = Vec::new();
            for (i, name) in entry.qc_definitions().iter().enumerate() {
                let path = format!("{source}.runqc[{i}]");
                let definition = match cache.get(name.as_str()) {
                    Some(cached) => cached.clone(),
                    None => {
                        let loaded = match resolver.load(name) {
                            Ok(resolved) if resolved.definition.test_count() == 0 => {
                                self.add_error(&path, &format!("QC definition '{name}' defines no tests"));
                                None
                            }
                            Ok(resolved) => Some(resolved.definition),
                            Err(e) => {
                                self.add_error(&path, &format!("QC definition '{name}': {e}"));
                                None
                            }
                        };
                        cache.insert(name.as_str(), loaded.clone());
                        loaded
                    }
                };
                if let Some(definition) = definition {
                    flags.extend(definition.flag_variables(&entry.nc_var_name));
                }
            }
            flags_by_output
                .entry(entry.nc_var_name.clone())
                .or_insert_with(Vec::new)
                .extend(flags);
        }
        flags_by_output
    }

    // ========================================================================
    // Limits
    // ========================================================================

    fn validate_limits(&mut self, document: &DerivedVariableDocument, limits: &DocumentLimits) {
        if document.len() > limits.max_entries {
            self.add_error(
                "",
                &format!(
                    "Too many entries: {} (maximum: {}). \
                     Set GLIDERQC_MAX_ENTRIES to increase the limit.",
                    document.len(),
                    limits.max_entries
                ),
            );
        }
        for (source, entry) in document.iter() {
            if entry.attrs.len() > limits.max_attrs {
                self.add_error(
                    &format!("{source}.attrs"),
                    &format!(
                        "Too many attributes: {} (maximum: {}). \
                         Set GLIDERQC_MAX_ATTRS to increase the limit.",
                        entry.attrs.len(),
                        limits.max_attrs
                    ),
                );
            }
        }
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue::error(path, message));
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue::warning(path, message));
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Every variable name an ancillary reference may point at, in suggestion
/// order: sources, outputs, QC flags, catalog, then extra names.
fn known_variables(
    document: &DerivedVariableDocument,
    ctx: &ValidationContext,
    qc_flags: &IndexMap<String, Vec<String>>,
) -> IndexSet<String> {
    let mut known: IndexSet<String> = document
        .sources()
        .chain(document.outputs())
        .map(str::to_string)
        .collect();
    known.extend(qc_flags.values().flatten().cloned());
    if let Some(catalog) = &ctx.catalog {
        known.extend(catalog.names().map(str::to_string));
    }
    known.extend(ctx.known_variables.iter().cloned());
    known
}

// ============================================================================
// Tests
// ============================================================================
