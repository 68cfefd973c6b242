//! Physical dimensions as integer exponents of base quantities.

use std::fmt;

/// Dimension of a unit: exponents of mass, length, time, temperature,
/// amount of substance and electric current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    /// Mass exponent (M)
    pub mass: i8,
    /// Length exponent (L)
    pub length: i8,
    /// Time exponent (T)
    pub time: i8,
    /// Temperature exponent (Θ)
    pub temperature: i8,
    /// Amount of substance exponent (N)
    pub amount: i8,
    /// Electric current exponent (I)
    pub current: i8,
}

impl Dimension {
    /// No dimension.
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0, 0, 0);
    /// Mass.
    pub const MASS: Self = Self::new(1, 0, 0, 0, 0, 0);
    /// Length.
    pub const LENGTH: Self = Self::new(0, 1, 0, 0, 0, 0);
    /// Time.
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0);
    /// Temperature.
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 1, 0, 0);
    /// Amount of substance.
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 1, 0);
    /// Electric current.
    pub const CURRENT: Self = Self::new(0, 0, 0, 0, 0, 1);
    /// Volume (L^3).
    pub const VOLUME: Self = Self::new(0, 3, 0, 0, 0, 0);
    /// Pressure (M L^-1 T^-2).
    pub const PRESSURE: Self = Self::new(1, -1, -2, 0, 0, 0);
    /// Power (M L^2 T^-3).
    pub const POWER: Self = Self::new(1, 2, -3, 0, 0, 0);
    /// Electric potential (M L^2 T^-3 I^-1).
    pub const VOLTAGE: Self = Self::new(1, 2, -3, 0, 0, -1);
    /// Electric conductance (M^-1 L^-2 T^3 I^2).
    pub const CONDUCTANCE: Self = Self::new(-1, -2, 3, 0, 0, 2);
    /// Mass concentration (M L^-3), e.g. `mg L-1`.
    pub const MASS_CONCENTRATION: Self = Self::new(1, -3, 0, 0, 0, 0);
    /// Amount concentration (N L^-3), e.g. `umol L-1`.
    pub const AMOUNT_CONCENTRATION: Self = Self::new(0, -3, 0, 0, 1, 0);
    /// Amount per mass (N M^-1), e.g. `umol kg-1`.
    pub const AMOUNT_PER_MASS: Self = Self::new(-1, 0, 0, 0, 1, 0);

    /// Creates a dimension from its exponents.
    #[must_use]
    pub const fn new(
        mass: i8,
        length: i8,
        time: i8,
        temperature: i8,
        amount: i8,
        current: i8,
    ) -> Self {
        Self {
            mass,
            length,
            time,
            temperature,
            amount,
            current,
        }
    }

    /// Raises the dimension to an integer power, or `None` if an exponent
    /// overflows.
    #[must_use]
    pub fn checked_pow(self, exp: i8) -> Option<Self> {
        Some(Self::new(
            self.mass.checked_mul(exp)?,
            self.length.checked_mul(exp)?,
            self.time.checked_mul(exp)?,
            self.temperature.checked_mul(exp)?,
            self.amount.checked_mul(exp)?,
            self.current.checked_mul(exp)?,
        ))
    }

    /// Product of two dimensions, or `None` if an exponent overflows.
    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(Self::new(
            self.mass.checked_add(rhs.mass)?,
            self.length.checked_add(rhs.length)?,
            self.time.checked_add(rhs.time)?,
            self.temperature.checked_add(rhs.temperature)?,
            self.amount.checked_add(rhs.amount)?,
            self.current.checked_add(rhs.current)?,
        ))
    }

    /// Quotient of two dimensions, or `None` if an exponent overflows.
    #[must_use]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.checked_mul(rhs.checked_pow(-1)?)
    }

    /// Returns `true` if all exponents are zero.
    #[must_use]
    pub fn is_dimensionless(self) -> bool {
        self == Self::DIMENSIONLESS
    }

    const fn exponents(self) -> [(&'static str, i8); 6] {
        [
            ("M", self.mass),
            ("L", self.length),
            ("T", self.time),
            ("Θ", self.temperature),
            ("N", self.amount),
            ("I", self.current),
        ]
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("1");
        }
        let parts: Vec<String> = self
            .exponents()
            .iter()
            .filter(|(_, e)| *e != 0)
            .map(|(s, e)| {
                if *e == 1 {
                    (*s).to_string()
                } else {
                    format!("{s}^{e}")
                }
            })
            .collect();
        f.write_str(&parts.join(" "))
    }
}
