//! On-disk encoding of derived variables.
//!
//! Every variable written by the pipeline carries a storage type and a
//! `_FillValue`. Unless the entry sets `_FillValue` explicitly, the netCDF
//! library default for the storage type is used.

use gliderqc_core::config::AttrValue;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// NetCDF storage type, named by numpy kind and byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NcType {
    /// `byte`
    I1,
    /// `ubyte`
    U1,
    /// `short`
    I2,
    /// `ushort`
    U2,
    /// `int`
    I4,
    /// `uint`
    U4,
    /// `int64`
    I8,
    /// `uint64`
    U8,
    /// `float`
    F4,
    /// `double`
    F8,
}

impl NcType {
    /// Short code (`f8`, `i1`, ...).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::I1 => "i1",
            Self::U1 => "u1",
            Self::I2 => "i2",
            Self::U2 => "u2",
            Self::I4 => "i4",
            Self::U4 => "u4",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::F4 => "f4",
            Self::F8 => "f8",
        }
    }

    /// The netCDF library default fill value.
    #[must_use]
    pub const fn default_fill(self) -> FillValue {
        match self {
            Self::I1 => FillValue::Int(-127),
            Self::U1 => FillValue::UInt(255),
            Self::I2 => FillValue::Int(-32767),
            Self::U2 => FillValue::UInt(65535),
            Self::I4 => FillValue::Int(-2_147_483_647),
            Self::U4 => FillValue::UInt(4_294_967_295),
            Self::I8 => FillValue::Int(-9_223_372_036_854_775_806),
            Self::U8 => FillValue::UInt(18_446_744_073_709_551_614),
            Self::F4 | Self::F8 => FillValue::Float(9.969_209_968_386_869e36),
        }
    }
}

impl fmt::Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i1" => Ok(Self::I1),
            "u1" => Ok(Self::U1),
            "i2" => Ok(Self::I2),
            "u2" => Ok(Self::U2),
            "i4" => Ok(Self::I4),
            "u4" => Ok(Self::U4),
            "i8" => Ok(Self::I8),
            "u8" => Ok(Self::U8),
            "f4" => Ok(Self::F4),
            "f8" => Ok(Self::F8),
            other => Err(format!("unknown netCDF type code '{other}'")),
        }
    }
}

/// A fill value, wide enough for every storage type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    /// Signed integer fill
    Int(i64),
    /// Unsigned integer fill
    UInt(u64),
    /// Floating-point fill
    Float(f64),
}

impl FillValue {
    /// Reads an explicit `_FillValue` attribute.
    #[must_use]
    pub fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Integer(i) => Some(Self::Int(*i)),
            AttrValue::Float(f) => Some(Self::Float(*f)),
            AttrValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Self::Int)
                    .or_else(|_| s.parse::<f64>().map(Self::Float))
                    .ok()
            }
            AttrValue::List(_) => None,
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x:e}"),
        }
    }
}

/// Storage type and fill value of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Encoding {
    /// Storage type
    pub dtype: NcType,
    /// `_FillValue`
    #[serde(rename = "_FillValue")]
    pub fill_value: FillValue,
}

impl Encoding {
    /// Encoding with the default fill value of `dtype`.
    #[must_use]
    pub const fn for_type(dtype: NcType) -> Self {
        Self {
            dtype,
            fill_value: dtype.default_fill(),
        }
    }

    /// Encoding of calculated outputs (`f8`).
    #[must_use]
    pub const fn derived() -> Self {
        Self::for_type(NcType::F8)
    }

    /// Encoding of QC flag variables (`i1`).
    #[must_use]
    pub const fn qc_flag() -> Self {
        Self::for_type(NcType::I1)
    }

    /// Replaces the fill value with an explicit `_FillValue`, if it parses.
    #[must_use]
    pub fn with_fill_attr(self, value: Option<&AttrValue>) -> Self {
        match value.and_then(FillValue::from_attr) {
            Some(fill_value) => Self { fill_value, ..self },
            None => self,
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::derived()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fills() {
        assert_eq!(NcType::I1.default_fill(), FillValue::Int(-127));
        assert_eq!(NcType::U2.default_fill(), FillValue::UInt(65535));
        assert_eq!(
            NcType::U8.default_fill(),
            FillValue::UInt(18_446_744_073_709_551_614)
        );
        assert_eq!(NcType::F8.default_fill(), FillValue::Float(9.969_209_968_386_869e36));
    }

    #[test]
    fn test_type_codes_round_trip() {
        for code in ["i1", "u1", "i2", "u2", "i4", "u4", "i8", "u8", "f4", "f8"] {
            let ty: NcType = code.parse().unwrap();
            assert_eq!(ty.to_string(), code);
        }
        assert!("f16".parse::<NcType>().is_err());
    }

    #[test]
    fn test_explicit_fill_overrides_default() {
        let enc = Encoding::derived().with_fill_attr(Some(&AttrValue::Float(-999.0)));
        assert_eq!(enc.fill_value, FillValue::Float(-999.0));
        assert_eq!(enc.dtype, NcType::F8);

        let enc = Encoding::derived().with_fill_attr(Some(&AttrValue::from("-9999")));
        assert_eq!(enc.fill_value, FillValue::Int(-9999));

        let enc = Encoding::derived().with_fill_attr(Some(&AttrValue::from("none")));
        assert_eq!(enc, Encoding::derived());
    }

    #[test]
    fn test_qc_flag_encoding() {
        let enc = Encoding::qc_flag();
        assert_eq!(enc.dtype, NcType::I1);
        assert_eq!(enc.fill_value, FillValue::Int(-127));
    }
}
