//! Unit string parser.
//!
//! Parses the unit strings used in glider NetCDF attributes into a product
//! of symbols with integer exponents. Syntactic variants normalize to the
//! same representation:
//!
//! - Exponents: `m^2`, `m**2`, `m2`, `m-1`
//! - Multiplication: `kg m`, `kg*m`, `kg·m`
//! - Division: `W/m^2`, `W m^-2`, `W per m^2`
//!
//! ```text
//! unit_expr  = term (('/' | 'per') term)*
//! term       = factor (('*' | '·' | ' ') factor)*
//! factor     = symbol (('^' | '**')? exponent)? | '(' unit_expr ')' exponent?
//! symbol     = [letters digits _ %]+
//! exponent   = ('-' | '+')? [0-9]+
//! ```

use super::dimension::Dimension;
use super::registry::UNIT_REGISTRY;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unit parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Empty unit string.
    #[error("empty unit string")]
    EmptyUnit,
    /// Symbol not in the unit registry.
    #[error("unknown unit: '{0}'")]
    UnknownUnit(String),
    /// Exponent is not a valid integer.
    #[error("invalid exponent: '{0}'")]
    InvalidExponent(String),
    /// Character not allowed at this position.
    #[error("unexpected character: '{0}'")]
    UnexpectedChar(char),
    /// Reference time of a `since` clause could not be parsed.
    #[error("invalid reference time: '{0}'")]
    InvalidReferenceTime(String),
    /// `since` clause on a unit that is not a time unit.
    #[error("'{0}' is not a time unit and cannot have a reference time")]
    NotATimeUnit(String),
    /// Any other syntax error.
    #[error("parse failed: {0}")]
    ParseFailed(String),
}

/// A parsed unit expression: symbol → exponent.
///
/// `mg L-1` is `{L: -1, mg: 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUnit {
    components: BTreeMap<String, i32>,
}

impl ParsedUnit {
    /// The dimensionless unit `1`.
    #[must_use]
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// Creates a parsed unit from components, dropping zero exponents.
    #[must_use]
    pub fn from_components(components: BTreeMap<String, i32>) -> Self {
        Self {
            components: components.into_iter().filter(|(_, e)| *e != 0).collect(),
        }
    }

    /// Parses a unit string (without a `since` clause).
    ///
    /// Only syntax is checked; symbols are resolved by [`Self::dimension`].
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first syntax error.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyUnit);
        }
        if input == "1" || input.eq_ignore_ascii_case("dimensionless") {
            return Ok(Self::dimensionless());
        }

        let mut parser = UnitParser::new(input);
        let unit = parser.parse_expression()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(unit),
            Some(c) => Err(ParseError::UnexpectedChar(c)),
        }
    }

    /// Symbol → exponent map.
    #[must_use]
    pub const fn components(&self) -> &BTreeMap<String, i32> {
        &self.components
    }

    /// Resolves every symbol and returns the overall dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownUnit`] for the first unknown symbol and
    /// [`ParseError::InvalidExponent`] when an exponent overflows.
    pub fn dimension(&self) -> Result<Dimension, ParseError> {
        self.components
            .iter()
            .try_fold(Dimension::DIMENSIONLESS, |acc, (symbol, &exp)| {
                let info = UNIT_REGISTRY
                    .lookup(symbol)
                    .ok_or_else(|| ParseError::UnknownUnit(symbol.clone()))?;
                let overflow = || ParseError::InvalidExponent(exp.to_string());
                let exp = i8::try_from(exp).map_err(|_| overflow())?;
                info.dimension
                    .checked_pow(exp)
                    .and_then(|d| acc.checked_mul(d))
                    .ok_or_else(overflow)
            })
    }

    /// Returns the factor converting a value in this unit to SI.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownUnit`] for the first unknown symbol.
    pub fn to_si_factor(&self) -> Result<f64, ParseError> {
        self.components
            .iter()
            .try_fold(1.0, |acc, (symbol, &exp)| {
                let info = UNIT_REGISTRY
                    .lookup(symbol)
                    .ok_or_else(|| ParseError::UnknownUnit(symbol.clone()))?;
                Ok(acc * info.to_si_factor.powi(exp))
            })
    }

    fn combine(&self, other: &Self, sign: i32) -> Result<Self, ParseError> {
        let mut components = self.components.clone();
        for (symbol, exp) in &other.components {
            let current = components.entry(symbol.clone()).or_insert(0);
            let updated = sign
                .checked_mul(*exp)
                .and_then(|e| current.checked_add(e))
                .ok_or_else(|| ParseError::InvalidExponent(format!("{symbol}^{exp}")))?;
            *current = updated;
        }
        Ok(Self::from_components(components))
    }

    fn pow(&self, exp: i32) -> Result<Self, ParseError> {
        let components = self
            .components
            .iter()
            .map(|(k, v)| {
                v.checked_mul(exp)
                    .map(|e| (k.clone(), e))
                    .ok_or_else(|| ParseError::InvalidExponent(format!("({k}^{v})^{exp}")))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::from_components(components))
    }

    /// Canonical form: positive exponents, then negative ones, each group
    /// sorted by symbol, written in UDUNITS style (`mg L-1`).
    #[must_use]
    pub fn normalized(&self) -> String {
        if self.components.is_empty() {
            return "1".to_string();
        }
        let positive = self.components.iter().filter(|(_, e)| **e > 0);
        let negative = self.components.iter().filter(|(_, e)| **e < 0);
        positive
            .chain(negative)
            .map(|(s, e)| {
                if *e == 1 {
                    s.clone()
                } else {
                    format!("{s}{e}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// Recursive-descent parser over a unit string.
struct UnitParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> UnitParser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_expression(&mut self) -> Result<ParsedUnit, ParseError> {
        self.skip_whitespace();
        let mut result = self.parse_term()?;

        loop {
            self.skip_whitespace();
            if self.peek() == Some('/') {
                self.advance();
            } else if self.at_keyword("per") {
                self.pos += "per".len();
            } else {
                break;
            }
            self.skip_whitespace();
            let divisor = self.parse_term()?;
            result = result.combine(&divisor, -1)?;
        }

        Ok(result)
    }

    fn parse_term(&mut self) -> Result<ParsedUnit, ParseError> {
        let mut result = self.parse_factor()?;

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('*' | '\u{b7}') => {
                    self.advance();
                    self.skip_whitespace();
                }
                Some(c) if is_symbol_char(c) || c == '(' => {
                    if self.at_keyword("per") {
                        break;
                    }
                }
                _ => break,
            }
            let factor = self.parse_factor()?;
            result = result.combine(&factor, 1)?;
        }

        Ok(result)
    }

    fn parse_factor(&mut self) -> Result<ParsedUnit, ParseError> {
        self.skip_whitespace();

        if self.peek() == Some('(') {
            self.advance();
            let inner = self.parse_expression()?;
            self.skip_whitespace();
            if self.peek() != Some(')') {
                return Err(ParseError::ParseFailed(
                    "missing closing parenthesis".into(),
                ));
            }
            self.advance();
            let exp = self.parse_optional_exponent()?;
            return inner.pow(exp);
        }

        let symbol = self.parse_symbol()?;
        let exp = self.parse_optional_exponent()?;
        Ok(ParsedUnit::from_components(BTreeMap::from([(symbol, exp)])))
    }

    fn parse_symbol(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_symbol_char(c) {
                break;
            }
            self.advance();
        }

        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(ParseError::UnexpectedChar(c)),
                None => Err(ParseError::ParseFailed("expected unit symbol".into())),
            };
        }

        let symbol = &self.input[start..self.pos];
        if symbol.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseError::ParseFailed(format!(
                "unit symbol cannot start with a digit: '{symbol}'"
            )));
        }

        // Trailing digits are an exponent ("m2"), unless the whole symbol
        // is a registered unit
        let digits = symbol.len() - symbol.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 && UNIT_REGISTRY.lookup(symbol).is_none() {
            self.pos -= digits;
            return Ok(symbol[..symbol.len() - digits].to_string());
        }

        Ok(symbol.to_string())
    }

    fn parse_optional_exponent(&mut self) -> Result<i32, ParseError> {
        // Explicit operators may be surrounded by spaces ("m ^ 2")
        let before = self.pos;
        self.skip_whitespace();
        if self.input[self.pos..].starts_with("**") {
            self.pos += 2;
            self.skip_whitespace();
            return self.parse_exponent();
        }
        if self.peek() == Some('^') {
            self.advance();
            self.skip_whitespace();
            return self.parse_exponent();
        }
        self.pos = before;

        match self.peek() {
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.parse_exponent(),
            _ => Ok(1),
        }
    }

    fn parse_exponent(&mut self) -> Result<i32, ParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        let text = &self.input[start..self.pos];
        text.parse::<i32>()
            .map_err(|_| ParseError::InvalidExponent(text.to_string()))
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let rest = &self.input[self.pos..];
        rest.starts_with(keyword)
            && rest[keyword.len()..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '%'
}
