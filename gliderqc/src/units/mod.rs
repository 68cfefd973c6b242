//! Units of measure carried in the `units` attribute.
//!
//! Derived variables declare their units as UDUNITS-style strings such as
//! `mg L-1`, `umol kg-1` or `seconds since 1970-01-01T00:00:00Z`. This module
//! parses them, resolves their physical dimension and exposes the SI
//! conversion factor so the validator can check them against what a
//! calculation produces.

pub mod dimension;
pub mod parser;
pub mod registry;

pub use dimension::Dimension;
pub use parser::{ParseError, ParsedUnit};
pub use registry::{UNIT_REGISTRY, UnitInfo, UnitRegistry};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

const SINCE: &str = " since ";

/// A unit string, parsed.
///
/// Time units may carry a reference epoch (`days since 2000-01-01`).
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    original: String,
    parsed: ParsedUnit,
    reference: Option<NaiveDateTime>,
}

impl Unit {
    /// Parses a unit string, including an optional `since` clause.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the expression is malformed, a symbol is
    /// unknown, or the `since` clause is invalid.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let (expr, reference) = match trimmed.split_once(SINCE) {
            Some((expr, epoch)) => (expr, Some(epoch)),
            None => (trimmed, None),
        };

        let parsed = ParsedUnit::parse(expr)?;
        let dimension = parsed.dimension()?;

        let reference = match reference {
            Some(epoch) => {
                if dimension != Dimension::TIME {
                    return Err(ParseError::NotATimeUnit(expr.trim().to_string()));
                }
                Some(parse_reference_time(epoch)?)
            }
            None => None,
        };

        Ok(Self {
            original: trimmed.to_string(),
            parsed,
            reference,
        })
    }

    /// The string as written.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The parsed unit expression.
    #[must_use]
    pub const fn parsed(&self) -> &ParsedUnit {
        &self.parsed
    }

    /// The `since` reference time, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<NaiveDateTime> {
        self.reference
    }

    /// Physical dimension.
    ///
    /// Symbols were resolved during [`Self::parse`], so this cannot fail on
    /// a constructed `Unit`; an unresolvable symbol falls back to
    /// dimensionless.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.parsed.dimension().unwrap_or_default()
    }

    /// Multiplier converting a value in this unit to SI.
    #[must_use]
    pub fn to_si_factor(&self) -> f64 {
        self.parsed.to_si_factor().unwrap_or(1.0)
    }

    /// Returns `true` if both units measure the same kind of quantity.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.dimension() == other.dimension()
    }
}

impl FromStr for Unit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Parses the epoch of a `since` clause.
///
/// Accepts RFC 3339, `YYYY-mm-ddTHH:MM:SS[.f]`, `YYYY-mm-dd HH:MM:SS[.f]`
/// and bare dates. A trailing `Z` or ` UTC` is ignored.
fn parse_reference_time(input: &str) -> Result<NaiveDateTime, ParseError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }

    let naive = input
        .strip_suffix(" UTC")
        .or_else(|| input.strip_suffix('Z'))
        .unwrap_or(input)
        .trim();

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ParseError::InvalidReferenceTime(input.to_string()))
}
