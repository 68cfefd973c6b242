//! Calculation catalog and the calculator seam.
//!
//! A derived-variable entry names its calculation by string. The catalog
//! holds the names the pipeline knows along with the physical dimension each
//! one produces, so units can be checked before anything runs. The actual
//! numerics live behind [`Calculator`], implemented by the embedding
//! pipeline.

use crate::derive::{Dataset, Variable};
use crate::error::DerivationError;
use crate::units::Dimension;
use indexmap::IndexMap;

/// What the pipeline knows about a calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationDescriptor {
    /// Calculation name as written in `calculation:`
    pub name: String,
    /// One-line description
    pub description: String,
    /// Dimension of the output, when fixed
    pub output_dimension: Option<Dimension>,
}

impl CalculationDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        output_dimension: Option<Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            output_dimension,
        }
    }
}

/// Known calculation names.
#[derive(Debug, Clone)]
pub struct CalculationCatalog {
    calculations: IndexMap<String, CalculationDescriptor>,
}

impl Default for CalculationCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CalculationCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            calculations: IndexMap::new(),
        }
    }

    /// Creates the catalog of calculations shipped with the glider pipeline.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::empty();
        catalog.register(CalculationDescriptor::new(
            "convert_do_mgL",
            "Dissolved oxygen converted from umol L-1 to mg L-1",
            Some(Dimension::MASS_CONCENTRATION),
        ));
        catalog.register(CalculationDescriptor::new(
            "calculate_ph",
            "pH on the total scale from reference voltage, temperature, salinity and pressure",
            Some(Dimension::DIMENSIONLESS),
        ));
        catalog.register(CalculationDescriptor::new(
            "calculate_ta",
            "Total alkalinity estimated from salinity",
            Some(Dimension::AMOUNT_PER_MASS),
        ));
        catalog.register(CalculationDescriptor::new(
            "calculate_omega",
            "Aragonite saturation state from the carbonate system",
            Some(Dimension::DIMENSIONLESS),
        ));
        catalog
    }

    /// Adds or replaces a calculation.
    pub fn register(&mut self, descriptor: CalculationDescriptor) {
        self.calculations
            .insert(descriptor.name.clone(), descriptor);
    }

    /// Adds names with no declared output dimension.
    ///
    /// Names already present keep their descriptor.
    pub fn extend_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.calculations.contains_key(&name) {
                self.register(CalculationDescriptor::new(name, "", None));
            }
        }
    }

    /// Returns the descriptor for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CalculationDescriptor> {
        self.calculations.get(name)
    }

    /// Returns `true` if `name` is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.calculations.contains_key(name)
    }

    /// Known names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calculations.keys().map(String::as_str)
    }

    /// Closest known name to `input`, for "did you mean" hints.
    #[must_use]
    pub fn suggest(&self, input: &str) -> Option<&str> {
        crate::suggest::closest(input, self.names())
    }
}

/// An implementation of a named calculation.
///
/// Implementations receive the source variable and the whole dataset (pH
/// needs temperature, salinity and pressure alongside the reference
/// voltage) and return one value per source sample.
pub trait Calculator: Send + Sync {
    /// Computes the derived values for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError::CalculationFailed`] when the inputs cannot
    /// be used.
    fn calculate(&self, source: &Variable, dataset: &Dataset) -> Result<Vec<f64>, DerivationError>;
}

impl<F> Calculator for F
where
    F: Fn(&Variable, &Dataset) -> Result<Vec<f64>, DerivationError> + Send + Sync,
{
    fn calculate(&self, source: &Variable, dataset: &Dataset) -> Result<Vec<f64>, DerivationError> {
        self(source, dataset)
    }
}
