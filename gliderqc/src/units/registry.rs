//! Registry of unit symbols found in glider NetCDF files.
//!
//! Conversion factors multiply a value in the registered unit to obtain the
//! SI value (`dbar` → 1e4 Pa, `mg` → 1e-6 kg). Offset units (`degC`) are
//! registered with factor 1; only their dimension matters for validation.
//! SI prefixes apply only to SI symbols (`mg`, `dbar`, `uS`), never to
//! glider vocabulary such as `psu` or `degC`.

use super::dimension::Dimension;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Information about a known unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInfo {
    /// Canonical symbol.
    pub symbol: String,
    /// Physical dimension.
    pub dimension: Dimension,
    /// Multiplier to SI base units.
    pub to_si_factor: f64,
}

/// SI prefix.
#[derive(Debug, Clone, Copy)]
struct SiPrefix {
    symbol: &'static str,
    factor: f64,
}

/// Prefixes accepted in front of registered symbols.
const SI_PREFIXES: &[SiPrefix] = &[
    SiPrefix { symbol: "da", factor: 1e1 },
    SiPrefix { symbol: "G", factor: 1e9 },
    SiPrefix { symbol: "M", factor: 1e6 },
    SiPrefix { symbol: "k", factor: 1e3 },
    SiPrefix { symbol: "h", factor: 1e2 },
    SiPrefix { symbol: "d", factor: 1e-1 },
    SiPrefix { symbol: "c", factor: 1e-2 },
    SiPrefix { symbol: "m", factor: 1e-3 },
    SiPrefix { symbol: "u", factor: 1e-6 },
    SiPrefix { symbol: "\u{b5}", factor: 1e-6 },
    SiPrefix { symbol: "\u{3bc}", factor: 1e-6 },
    SiPrefix { symbol: "n", factor: 1e-9 },
    SiPrefix { symbol: "p", factor: 1e-12 },
];

/// The global unit registry.
pub static UNIT_REGISTRY: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

/// Known units and their aliases.
#[derive(Debug)]
pub struct UnitRegistry {
    units: HashMap<&'static str, (Dimension, f64, bool)>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Creates a registry populated with the glider unit vocabulary.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            units: HashMap::new(),
            aliases: HashMap::new(),
        };
        registry.register_base_units();
        registry.register_time_units();
        registry.register_ocean_units();
        registry.register_dimensionless_units();
        registry
    }

    /// Looks up a symbol, resolving aliases and SI prefixes.
    #[must_use]
    pub fn lookup(&self, symbol: &str) -> Option<UnitInfo> {
        if let Some(info) = self.exact(symbol) {
            return Some(info);
        }

        // Longest prefix first so "da" wins over "d"
        for prefix in SI_PREFIXES {
            let Some(base) = symbol.strip_prefix(prefix.symbol) else {
                continue;
            };
            if base.is_empty() {
                continue;
            }
            if !self.accepts_prefix(base) {
                continue;
            }
            if let Some(info) = self.exact(base) {
                return Some(UnitInfo {
                    symbol: symbol.to_string(),
                    dimension: info.dimension,
                    to_si_factor: info.to_si_factor * prefix.factor,
                });
            }
        }
        None
    }

    /// Returns `true` if `symbol` is a unit of time.
    #[must_use]
    pub fn is_time_unit(&self, symbol: &str) -> bool {
        self.lookup(symbol)
            .is_some_and(|info| info.dimension == Dimension::TIME)
    }

    fn exact(&self, symbol: &str) -> Option<UnitInfo> {
        let canonical = self.aliases.get(symbol).copied().unwrap_or(symbol);
        self.units
            .get_key_value(canonical)
            .map(|(key, &(dimension, to_si_factor, _))| UnitInfo {
                symbol: (*key).to_string(),
                dimension,
                to_si_factor,
            })
    }

    fn accepts_prefix(&self, symbol: &str) -> bool {
        let canonical = self.aliases.get(symbol).copied().unwrap_or(symbol);
        self.units
            .get(canonical)
            .is_some_and(|&(_, _, prefixable)| prefixable)
    }

    fn insert(&mut self, symbol: &'static str, dimension: Dimension, factor: f64) {
        self.units.insert(symbol, (dimension, factor, false));
    }

    fn insert_si(&mut self, symbol: &'static str, dimension: Dimension, factor: f64) {
        self.units.insert(symbol, (dimension, factor, true));
    }

    fn alias(&mut self, alias: &'static str, canonical: &'static str) {
        self.aliases.insert(alias, canonical);
    }

    fn register_base_units(&mut self) {
        self.insert_si("g", Dimension::MASS, 1e-3);
        self.insert_si("m", Dimension::LENGTH, 1.0);
        self.alias("meter", "m");
        self.alias("meters", "m");
        self.alias("metre", "m");
        self.insert_si("L", Dimension::VOLUME, 1e-3);
        self.alias("l", "L");
        self.alias("liter", "L");
        self.alias("litre", "L");
        self.insert_si("mol", Dimension::AMOUNT, 1.0);
        self.alias("mole", "mol");
        self.insert_si("K", Dimension::TEMPERATURE, 1.0);
        self.alias("kelvin", "K");
        self.insert_si("A", Dimension::CURRENT, 1.0);
    }

    fn register_time_units(&mut self) {
        self.insert_si("s", Dimension::TIME, 1.0);
        self.alias("sec", "s");
        self.alias("second", "s");
        self.alias("seconds", "s");
        self.insert("min", Dimension::TIME, 60.0);
        self.alias("minute", "min");
        self.alias("minutes", "min");
        self.insert("hour", Dimension::TIME, 3600.0);
        self.alias("hours", "hour");
        self.alias("hr", "hour");
        self.insert("day", Dimension::TIME, 86400.0);
        self.alias("days", "day");
    }

    fn register_ocean_units(&mut self) {
        self.insert("degC", Dimension::TEMPERATURE, 1.0);
        for alias in [
            "Celsius",
            "celsius",
            "deg_C",
            "degree_Celsius",
            "degrees_Celsius",
            "degree_C",
            "degrees_C",
        ] {
            self.alias(alias, "degC");
        }
        self.insert_si("Pa", Dimension::PRESSURE, 1.0);
        self.insert_si("bar", Dimension::PRESSURE, 1e5);
        self.insert("decibar", Dimension::PRESSURE, 1e4);
        self.insert_si("S", Dimension::CONDUCTANCE, 1.0);
        self.alias("siemens", "S");
        self.insert_si("V", Dimension::VOLTAGE, 1.0);
        self.alias("volt", "V");
        self.alias("volts", "V");
        self.insert_si("W", Dimension::POWER, 1.0);
    }

    fn register_dimensionless_units(&mut self) {
        self.insert("percent", Dimension::DIMENSIONLESS, 1e-2);
        self.alias("%", "percent");
        self.insert("psu", Dimension::DIMENSIONLESS, 1e-3);
        self.alias("PSU", "psu");
        self.insert("ppm", Dimension::DIMENSIONLESS, 1e-6);
        self.insert("ppb", Dimension::DIMENSIONLESS, 1e-9);
        self.insert("degree", Dimension::DIMENSIONLESS, std::f64::consts::PI / 180.0);
        for alias in [
            "degrees",
            "degree_north",
            "degrees_north",
            "degree_east",
            "degrees_east",
            "degree_N",
            "degrees_N",
            "degree_E",
            "degrees_E",
        ] {
            self.alias(alias, "degree");
        }
        self.insert("rad", Dimension::DIMENSIONLESS, 1.0);
        self.insert("count", Dimension::DIMENSIONLESS, 1.0);
        self.alias("counts", "count");
    }
}
