//! QARTOD flag values and QC variable attributes.

use gliderqc_core::config::{AttrValue, Attributes, QcTest, attr};
use serde_yaml::Value;

/// QARTOD quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum QartodFlag {
    /// Data passed the test
    Good = 1,
    /// Test not evaluated
    Unknown = 2,
    /// Data is suspect
    Suspect = 3,
    /// Data failed the test
    Fail = 4,
    /// Data is missing
    Missing = 9,
}

impl QartodFlag {
    /// All flags, in `flag_values` order.
    pub const ALL: [Self; 5] = [
        Self::Good,
        Self::Unknown,
        Self::Suspect,
        Self::Fail,
        Self::Missing,
    ];

    /// Stored flag value.
    #[must_use]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Name used in `flag_meanings`.
    #[must_use]
    pub const fn meaning(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Unknown => "UNKNOWN",
            Self::Suspect => "SUSPECT",
            Self::Fail => "FAIL",
            Self::Missing => "MISSING",
        }
    }

    /// Parses a stored flag value.
    #[must_use]
    pub const fn from_value(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::Good),
            2 => Some(Self::Unknown),
            3 => Some(Self::Suspect),
            4 => Some(Self::Fail),
            9 => Some(Self::Missing),
            _ => None,
        }
    }
}

/// Attributes of the flag variable written by `test` for `target`.
///
/// `flag_configurations` records the test parameters and is omitted when the
/// test has none. Parameters are written as JSON, or as YAML text when JSON
/// cannot hold them (non-string keys, non-finite numbers).
#[must_use]
pub fn flag_attributes(test: &QcTest<'_>, target: &str) -> Attributes {
    let values: Vec<AttrValue> = QartodFlag::ALL
        .iter()
        .map(|f| AttrValue::Integer(i64::from(f.value())))
        .collect();
    let meanings: Vec<&str> = QartodFlag::ALL.iter().map(|f| f.meaning()).collect();

    let configured = has_params(test.params);
    let mut comment = format!("{} applied to {target}", title_case(test.test));
    if configured {
        comment.push_str(", with thresholds found in flag_configurations");
    }

    let mut attrs = Attributes::new();
    attrs.insert("comment".to_string(), format!("{comment}.").into());
    attrs.insert(
        attr::STANDARD_NAME.to_string(),
        format!("{}_quality_flag", test.test).into(),
    );
    attrs.insert(
        attr::LONG_NAME.to_string(),
        format!("{} Quality Flag", title_case(test.test)).into(),
    );
    attrs.insert("flag_values".to_string(), AttrValue::List(values));
    attrs.insert("flag_meanings".to_string(), meanings.join(" ").into());
    attrs.insert(
        attr::VALID_MIN.to_string(),
        AttrValue::Integer(i64::from(QartodFlag::Good.value())),
    );
    attrs.insert(
        attr::VALID_MAX.to_string(),
        AttrValue::Integer(i64::from(QartodFlag::Missing.value())),
    );
    attrs.insert("qc_target".to_string(), target.into());

    if configured {
        attrs.insert(
            "flag_configurations".to_string(),
            configuration_text(test.params).into(),
        );
    }
    attrs
}

/// `gross_range_test` → `Gross Range Test`.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_params(params: &Value) -> bool {
    match params {
        Value::Null => false,
        Value::Mapping(m) => !m.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        _ => true,
    }
}

/// JSON when it round-trips to the same YAML value, YAML text otherwise.
fn configuration_text(params: &Value) -> String {
    let json = serde_json::to_value(params)
        .ok()
        .filter(|json| serde_yaml::to_value(json).is_ok_and(|back| back == *params));
    match json {
        Some(json) => json.to_string(),
        None => serde_yaml::to_string(params)
            .map_or_else(|_| format!("{params:?}"), |text| text.trim_end().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gliderqc_core::config::QcDefinition;

    fn definition() -> QcDefinition {
        serde_yaml::from_str(
            "qartod:\n  gross_range_test:\n    suspect_span: [6.5, 9]\n    fail_span: [0, 14]\n  location_test: ~\n",
        )
        .unwrap()
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(QartodFlag::Good.value(), 1);
        assert_eq!(QartodFlag::Missing.value(), 9);
        assert_eq!(QartodFlag::from_value(3), Some(QartodFlag::Suspect));
        assert_eq!(QartodFlag::from_value(5), None);
    }

    #[test]
    fn test_flag_attributes() {
        let def = definition();
        let test = def.tests().next().unwrap();
        let attrs = flag_attributes(&test, "pH");

        assert_eq!(attrs["standard_name"], AttrValue::from("gross_range_test_quality_flag"));
        assert_eq!(attrs["long_name"], AttrValue::from("Gross Range Test Quality Flag"));
        assert_eq!(attrs["flag_meanings"], AttrValue::from("GOOD UNKNOWN SUSPECT FAIL MISSING"));
        assert_eq!(attrs["flag_values"].as_text(), "1 2 3 4 9");
        assert_eq!(attrs["valid_min"], AttrValue::Integer(1));
        assert_eq!(attrs["valid_max"], AttrValue::Integer(9));
        assert_eq!(attrs["qc_target"], AttrValue::from("pH"));

        let config: serde_json::Value =
            serde_json::from_str(attrs["flag_configurations"].as_str().unwrap()).unwrap();
        assert_eq!(config["fail_span"], serde_json::json!([0, 14]));
        assert_eq!(config["suspect_span"], serde_json::json!([6.5, 9]));
    }

    #[test]
    fn test_no_configuration_without_params() {
        let def = definition();
        let test = def.tests().nth(1).unwrap();
        let attrs = flag_attributes(&test, "pH");
        assert!(!attrs.contains_key("flag_configurations"));
        assert_eq!(attrs["comment"], AttrValue::from("Location Test applied to pH."));
    }

    #[test]
    fn test_comment_points_at_configuration() {
        let def = definition();
        let test = def.tests().next().unwrap();
        let attrs = flag_attributes(&test, "pH");
        assert_eq!(
            attrs["comment"],
            AttrValue::from(
                "Gross Range Test applied to pH, with thresholds found in flag_configurations."
            )
        );
    }

    #[test]
    fn test_configuration_keeps_non_string_keys() {
        let def: QcDefinition = serde_yaml::from_str(
            "qartod:\n  climatology_test:\n    1: [10, 20]\n    7: [15, 25]\n    depth: 100\n",
        )
        .unwrap();
        let test = def.tests().next().unwrap();
        let attrs = flag_attributes(&test, "temperature");

        let text = attrs["flag_configurations"].as_str().unwrap();
        let back: Value = serde_yaml::from_str(text).unwrap();
        assert_eq!(&back, test.params);
    }

    #[test]
    fn test_configuration_keeps_non_finite_numbers() {
        let def: QcDefinition =
            serde_yaml::from_str("qartod:\n  gross_range_test:\n    fail_span: [-.inf, 14]\n")
                .unwrap();
        let test = def.tests().next().unwrap();
        let attrs = flag_attributes(&test, "pH");

        let text = attrs["flag_configurations"].as_str().unwrap();
        assert!(text.contains("-.inf"), "{text}");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("spike_test"), "Spike Test");
        assert_eq!(title_case("ctd__hysteresis"), "Ctd Hysteresis");
    }
}
