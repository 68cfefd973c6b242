//! Derivation plan: what a document will do, resolved before any data is
//! touched.

use super::encoding::Encoding;
use crate::error::ConfigError;
use crate::qc::{QcResolver, ResolvedQc};
use gliderqc_core::config::{Attributes, DerivedVariableDocument, VariableCatalog, attr};
use serde::Serialize;
use std::path::PathBuf;

/// One QC definition scheduled for an output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedQc {
    /// Name as listed in `runqc`
    pub name: String,
    /// Resolved definition file
    pub path: PathBuf,
    /// Flag variables the definition produces, in test order
    pub flag_variables: Vec<String>,
    #[serde(skip)]
    pub(crate) resolved: ResolvedQc,
}

/// One entry of the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedVariable {
    /// Source variable (document key)
    pub source: String,
    /// Calculation to invoke
    pub calculation: String,
    /// Output variable name
    pub output: String,
    /// Inherit the source variable's attributes
    pub use_sourcevar_attrs: bool,
    /// Output attributes as far as they are known before running
    pub attrs: Attributes,
    /// Output encoding
    pub encoding: Encoding,
    /// QC definitions to run, in order
    pub qc: Vec<PlannedQc>,
    #[serde(skip)]
    pub(crate) overrides: Attributes,
}

/// Ordered plan for a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivationPlan {
    steps: Vec<PlannedVariable>,
}

impl DerivationPlan {
    /// Resolves every entry of `document`.
    ///
    /// Inherited attributes come from `catalog`, or from the planned output
    /// of an earlier entry when the source is itself derived.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of the first `runqc` name that cannot be
    /// resolved or parsed.
    pub fn build(
        document: &DerivedVariableDocument,
        catalog: Option<&VariableCatalog>,
        resolver: &QcResolver,
    ) -> Result<Self, ConfigError> {
        let mut steps: Vec<PlannedVariable> = Vec::with_capacity(document.len());

        for (source, entry) in document.iter() {
            let inherited = if entry.use_sourcevar_attrs {
                catalog
                    .and_then(|c| c.attributes(source))
                    .or_else(|| {
                        steps
                            .iter()
                            .rev()
                            .find(|s| s.output == source)
                            .map(|s| &s.attrs)
                    })
            } else {
                None
            };
            let (attrs, encoding) = merge_attributes(inherited, &entry.attrs, Encoding::derived());

            let mut qc = Vec::with_capacity(entry.qc_definitions().len());
            for name in entry.qc_definitions() {
                let resolved = resolver.load(name)?;
                qc.push(PlannedQc {
                    name: name.clone(),
                    path: resolved.path.clone(),
                    flag_variables: resolved.definition.flag_variables(&entry.nc_var_name),
                    resolved,
                });
            }

            steps.push(PlannedVariable {
                source: source.to_string(),
                calculation: entry.calculation.clone(),
                output: entry.nc_var_name.clone(),
                use_sourcevar_attrs: entry.use_sourcevar_attrs,
                attrs,
                encoding,
                qc,
                overrides: entry.attrs.clone(),
            });
        }

        tracing::debug!(steps = steps.len(), "built derivation plan");
        Ok(Self { steps })
    }

    /// Planned entries, in document order.
    #[must_use]
    pub fn steps(&self) -> &[PlannedVariable] {
        &self.steps
    }

    /// Distinct calculation names, in first-use order.
    #[must_use]
    pub fn calculations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !names.contains(&step.calculation.as_str()) {
                names.push(&step.calculation);
            }
        }
        names
    }

    /// Distinct QC module names, in first-use order.
    #[must_use]
    pub fn qc_modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for test in self
            .steps
            .iter()
            .flat_map(|s| &s.qc)
            .flat_map(|q| q.resolved.definition.tests())
        {
            if !modules.contains(&test.module) {
                modules.push(test.module);
            }
        }
        modules
    }
}

/// Merges inherited attributes with an entry's overrides.
///
/// Inherited attributes come first; an override replaces the inherited
/// value in place and new attributes follow in the entry's order.
/// `_FillValue` is moved out of the attributes into the encoding, replacing
/// the fill value of `base`.
pub(crate) fn merge_attributes(
    inherited: Option<&Attributes>,
    overrides: &Attributes,
    base: Encoding,
) -> (Attributes, Encoding) {
    let mut attrs = inherited.cloned().unwrap_or_default();
    for (key, value) in overrides {
        attrs.insert(key.clone(), value.clone());
    }
    let fill = attrs.shift_remove(attr::FILL_VALUE);
    let encoding = base.with_fill_attr(fill.as_ref());
    (attrs, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::encoding::FillValue;
    use gliderqc_core::config::AttrValue;
    use std::fs;
    use tempfile::TempDir;

    const DOCUMENT: &str = r"
oxygen_concentration_shifted:
  calculation: convert_do_mgL
  nc_var_name: oxygen_concentration_shifted_mgL
  use_sourcevar_attrs: true
  attrs:
    units: mg L-1
    comment: converted
  runqc:
    - oxygen_qartod.yml
pH:
  calculation: calculate_omega
  nc_var_name: aragonite_saturation_state
  use_sourcevar_attrs: true
  attrs:
    long_name: Aragonite Saturation State
    _FillValue: -999.0
sbe41n_ph_ref_voltage_shifted:
  calculation: calculate_ph
  nc_var_name: pH
  attrs:
    units: '1'
";

    const CATALOG: &str = r"
oxygen_concentration_shifted:
  long_name: Oxygen Concentration Shifted
  units: umol L-1
  _FillValue: -999.0
  sensor: instrument_optode
";

    fn fixtures() -> (TempDir, DerivedVariableDocument, VariableCatalog, QcResolver) {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("oxygen_qartod.yml"),
            "qartod:\n  gross_range_test:\n    fail_span: [0, 500]\n  spike_test:\n    fail_threshold: 20\n",
        )
        .unwrap();
        let doc = serde_yaml::from_str(DOCUMENT).unwrap();
        let catalog = serde_yaml::from_str(CATALOG).unwrap();
        let resolver = QcResolver::new(vec![tmp.path().to_path_buf()]);
        (tmp, doc, catalog, resolver)
    }

    #[test]
    fn test_source_attributes_merge_before_overrides() {
        let (_tmp, doc, catalog, resolver) = fixtures();
        let plan = DerivationPlan::build(&doc, Some(&catalog), &resolver).unwrap();
        let oxy = &plan.steps()[0];

        let keys: Vec<_> = oxy.attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["long_name", "units", "sensor", "comment"]);
        assert_eq!(oxy.attrs["units"], AttrValue::from("mg L-1"));
        assert_eq!(oxy.encoding.fill_value, FillValue::Float(-999.0));
    }

    #[test]
    fn test_no_inheritance_without_flag() {
        let (_tmp, doc, catalog, resolver) = fixtures();
        let plan = DerivationPlan::build(&doc, Some(&catalog), &resolver).unwrap();
        let ph = &plan.steps()[2];
        assert_eq!(ph.attrs.len(), 1);
        assert_eq!(ph.encoding, Encoding::derived());
    }

    #[test]
    fn test_qc_flag_variables() {
        let (_tmp, doc, catalog, resolver) = fixtures();
        let plan = DerivationPlan::build(&doc, Some(&catalog), &resolver).unwrap();
        let qc = &plan.steps()[0].qc;
        assert_eq!(qc.len(), 1);
        assert_eq!(
            qc[0].flag_variables,
            [
                "oxygen_concentration_shifted_mgL_qartod_gross_range_test",
                "oxygen_concentration_shifted_mgL_qartod_spike_test"
            ]
        );
        assert_eq!(plan.qc_modules(), ["qartod"]);
    }

    #[test]
    fn test_calculations_in_first_use_order() {
        let (_tmp, doc, catalog, resolver) = fixtures();
        let plan = DerivationPlan::build(&doc, Some(&catalog), &resolver).unwrap();
        assert_eq!(
            plan.calculations(),
            ["convert_do_mgL", "calculate_omega", "calculate_ph"]
        );
    }

    #[test]
    fn test_unresolvable_runqc_fails() {
        let (_tmp, doc, catalog, _resolver) = fixtures();
        let empty = QcResolver::new(Vec::new());
        assert!(matches!(
            DerivationPlan::build(&doc, Some(&catalog), &empty),
            Err(ConfigError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_explicit_fill_value_leaves_attrs() {
        let (_tmp, doc, catalog, resolver) = fixtures();
        let plan = DerivationPlan::build(&doc, Some(&catalog), &resolver).unwrap();
        let omega = &plan.steps()[1];
        assert!(!omega.attrs.contains_key("_FillValue"));
        assert_eq!(omega.encoding.fill_value, FillValue::Float(-999.0));
    }
}
