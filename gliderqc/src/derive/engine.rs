//! Applies a derivation plan to a dataset.

use super::dataset::{Dataset, Variable};
use super::encoding::Encoding;
use super::plan::{DerivationPlan, PlannedVariable, merge_attributes};
use crate::calculation::Calculator;
use crate::error::DerivationError;
use crate::qc::{QcRunner, flag_attributes};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// An entry that was not derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedVariable {
    /// Source variable
    pub source: String,
    /// Output that was not produced
    pub output: String,
    /// Why
    pub reason: String,
}

/// Outcome of [`Deriver::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationReport {
    /// Outputs written, in order
    pub derived: Vec<String>,
    /// Entries whose source was missing
    pub skipped: Vec<SkippedVariable>,
    /// QC flag variables written, in order
    pub qc_variables: Vec<String>,
}

/// Runs the calculations and QC tests of a plan.
///
/// Built with [`Deriver::builder`]; construction checks that every
/// calculation and QC module the plan uses has an implementation.
pub struct Deriver {
    plan: DerivationPlan,
    calculators: HashMap<String, Arc<dyn Calculator>>,
    qc_runners: HashMap<String, Arc<dyn QcRunner>>,
}

impl std::fmt::Debug for Deriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deriver")
            .field("steps", &self.plan.steps().len())
            .field("calculators", &self.calculators.keys().collect::<Vec<_>>())
            .field("qc_runners", &self.qc_runners.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Deriver`].
pub struct DeriverBuilder {
    plan: DerivationPlan,
    calculators: HashMap<String, Arc<dyn Calculator>>,
    qc_runners: HashMap<String, Arc<dyn QcRunner>>,
}

impl DeriverBuilder {
    /// Registers the implementation of calculation `name`.
    #[must_use]
    pub fn calculator(mut self, name: impl Into<String>, calculator: impl Calculator + 'static) -> Self {
        self.calculators.insert(name.into(), Arc::new(calculator));
        self
    }

    /// Registers the runner for QC module `module`.
    #[must_use]
    pub fn qc_runner(mut self, module: impl Into<String>, runner: impl QcRunner + 'static) -> Self {
        self.qc_runners.insert(module.into(), Arc::new(runner));
        self
    }

    /// Finishes the deriver.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError::UnknownCalculation`] or
    /// [`DerivationError::UnknownQcModule`] for the first name in the plan
    /// with nothing registered.
    pub fn build(self) -> Result<Deriver, DerivationError> {
        if let Some(name) = self
            .plan
            .calculations()
            .into_iter()
            .find(|name| !self.calculators.contains_key(*name))
        {
            return Err(DerivationError::UnknownCalculation(name.to_string()));
        }
        if let Some(module) = self
            .plan
            .qc_modules()
            .into_iter()
            .find(|module| !self.qc_runners.contains_key(*module))
        {
            return Err(DerivationError::UnknownQcModule(module.to_string()));
        }

        Ok(Deriver {
            plan: self.plan,
            calculators: self.calculators,
            qc_runners: self.qc_runners,
        })
    }
}

impl Deriver {
    /// Starts a deriver for `plan`.
    #[must_use]
    pub fn builder(plan: DerivationPlan) -> DeriverBuilder {
        DeriverBuilder {
            plan,
            calculators: HashMap::new(),
            qc_runners: HashMap::new(),
        }
    }

    /// The plan being applied.
    #[must_use]
    pub const fn plan(&self) -> &DerivationPlan {
        &self.plan
    }

    /// Derives every planned output into `dataset`, in document order.
    ///
    /// Entries whose source variable is missing are skipped and reported.
    /// Outputs of earlier entries are visible to later ones.
    ///
    /// # Errors
    ///
    /// Returns the first calculation or QC failure, or
    /// [`DerivationError::LengthMismatch`] when an implementation returns
    /// the wrong number of values. Variables written before the failure
    /// stay in `dataset`.
    pub fn apply(&self, dataset: &mut Dataset) -> Result<DerivationReport, DerivationError> {
        let mut report = DerivationReport::default();

        for step in self.plan.steps() {
            let Some(source) = dataset.get(&step.source) else {
                tracing::warn!(
                    source = %step.source,
                    output = %step.output,
                    "source variable not found, skipping"
                );
                report.skipped.push(SkippedVariable {
                    source: step.source.clone(),
                    output: step.output.clone(),
                    reason: "source variable not found".to_string(),
                });
                continue;
            };

            let output = self.derive_one(step, source, dataset)?;
            let flags = self.run_qc(step, &output, dataset)?;

            tracing::info!(
                source = %step.source,
                output = %step.output,
                calculation = %step.calculation,
                qc_variables = flags.len(),
                "derived variable"
            );

            dataset.insert(output);
            report.derived.push(step.output.clone());
            for flag in flags {
                report.qc_variables.push(flag.name().to_string());
                dataset.insert(flag);
            }
        }

        Ok(report)
    }

    fn derive_one(
        &self,
        step: &PlannedVariable,
        source: &Variable,
        dataset: &Dataset,
    ) -> Result<Variable, DerivationError> {
        let calculator = self
            .calculators
            .get(&step.calculation)
            .ok_or_else(|| DerivationError::UnknownCalculation(step.calculation.clone()))?;

        let values = calculator.calculate(source, dataset)?;
        check_length(&step.output, source.len(), values.len())?;

        // Inheriting outputs also take the source's storage type and fill
        let (inherited, base) = if step.use_sourcevar_attrs {
            (Some(source.attrs()), *source.encoding())
        } else {
            (None, Encoding::derived())
        };
        let (attrs, encoding) = merge_attributes(inherited, &step.overrides, base);

        Ok(Variable::new(&step.output, values)
            .with_attrs(attrs)
            .with_encoding(encoding))
    }

    fn run_qc(
        &self,
        step: &PlannedVariable,
        target: &Variable,
        dataset: &Dataset,
    ) -> Result<Vec<Variable>, DerivationError> {
        let mut flags = Vec::new();

        for planned in &step.qc {
            for test in planned.resolved.definition.tests() {
                let runner = self
                    .qc_runners
                    .get(test.module)
                    .ok_or_else(|| DerivationError::UnknownQcModule(test.module.to_string()))?;

                let name = test.flag_variable(target.name());
                tracing::debug!(definition = %planned.name, test = test.test, flag = %name, "running QC test");

                let results = runner.run(&test, target, dataset)?;
                check_length(&name, target.len(), results.len())?;

                let values = results.iter().map(|f| f64::from(f.value())).collect();
                flags.push(
                    Variable::new(name, values)
                        .with_attrs(flag_attributes(&test, target.name()))
                        .with_encoding(Encoding::qc_flag()),
                );
            }
        }

        Ok(flags)
    }
}

fn check_length(variable: &str, expected: usize, actual: usize) -> Result<(), DerivationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DerivationError::LengthMismatch {
            variable: variable.to_string(),
            expected,
            actual,
        })
    }
}
