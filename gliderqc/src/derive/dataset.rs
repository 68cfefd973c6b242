//! In-memory stand-in for a glider NetCDF file.

use super::encoding::Encoding;
use gliderqc_core::config::Attributes;
use indexmap::IndexMap;

/// A named one-dimensional variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    values: Vec<f64>,
    attrs: Attributes,
    encoding: Encoding,
}

impl Variable {
    /// Creates a variable with no attributes and `f8` encoding.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            attrs: Attributes::new(),
            encoding: Encoding::derived(),
        }
    }

    /// Sets the attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Sets the encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Attributes.
    #[must_use]
    pub const fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Encoding.
    #[must_use]
    pub const fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the variable has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Variables of one file, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: IndexMap<String, Variable>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a variable, returning the one it replaced.
    pub fn insert(&mut self, variable: Variable) -> Option<Variable> {
        self.variables.insert(variable.name.clone(), variable)
    }

    /// Returns the variable called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Returns `true` if the dataset has a variable called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Variable names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns `true` if the dataset has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl FromIterator<Variable> for Dataset {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for variable in iter {
            dataset.insert(variable);
        }
        dataset
    }
}
