//! Render inputs and outputs.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Largest integer a double holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Magnitude from which numbers are written in exponent form.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// A scalar value substituted into a template placeholder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateVariable {
    Text(String),
    Number(serde_json::Number),
    Boolean(bool),
}

/// How a number is handed to the template registry.
enum NumberForm {
    Integer(serde_json::Number),
    Literal(String),
}

/// Integral floats in the safe range become integers (`1.0` is `1`, `-0.0`
/// is `0`). Everything else is written out in its shortest decimal form.
fn number_form(n: &serde_json::Number) -> NumberForm {
    let value = match n.as_f64() {
        Some(value) if !(n.is_i64() || n.is_u64()) => value,
        _ => return NumberForm::Integer(n.clone()),
    };

    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return NumberForm::Integer((value as i64).into());
    }
    NumberForm::Literal(format_float(value))
}

fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if (1e-6..EXPONENT_THRESHOLD).contains(&magnitude) {
        return value.to_string();
    }

    // `{:e}` writes `1e21`; a positive exponent carries an explicit sign.
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

impl Serialize for TemplateVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TemplateVariable::Text(s) => serializer.serialize_str(s),
            TemplateVariable::Boolean(b) => serializer.serialize_bool(*b),
            TemplateVariable::Number(n) => match number_form(n) {
                NumberForm::Integer(i) => i.serialize(serializer),
                NumberForm::Literal(text) => serializer.serialize_str(&text),
            },
        }
    }
}

impl fmt::Display for TemplateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateVariable::Text(s) => write!(f, "{}", s),
            TemplateVariable::Number(n) => match number_form(n) {
                NumberForm::Integer(i) => write!(f, "{}", i),
                NumberForm::Literal(text) => write!(f, "{}", text),
            },
            TemplateVariable::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for TemplateVariable {
    fn from(value: &str) -> Self {
        TemplateVariable::Text(value.to_string())
    }
}

impl From<String> for TemplateVariable {
    fn from(value: String) -> Self {
        TemplateVariable::Text(value)
    }
}

impl From<i64> for TemplateVariable {
    fn from(value: i64) -> Self {
        TemplateVariable::Number(value.into())
    }
}

impl From<bool> for TemplateVariable {
    fn from(value: bool) -> Self {
        TemplateVariable::Boolean(value)
    }
}

/// Variable name to value mapping supplied by the caller.
pub type TemplateVariables = HashMap<String, TemplateVariable>;

/// Request payload for rendering a stored template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderTemplateRequest {
    #[serde(default)]
    pub variables: TemplateVariables,
}

/// Final text produced from a template and a variable set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
    pub language: String,
    pub version: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_deserialize_scalars() {
        let request: RenderTemplateRequest = serde_json::from_str(
            r#"{"variables": {"name": "Ada", "count": 3, "ratio": 1.5, "vip": true}}"#,
        )
        .unwrap();

        let vars = request.variables;
        assert_eq!(vars["name"], TemplateVariable::Text("Ada".into()));
        assert_eq!(vars["count"].to_string(), "3");
        assert_eq!(vars["ratio"].to_string(), "1.5");
        assert_eq!(vars["vip"], TemplateVariable::Boolean(true));
    }

    #[test]
    fn test_variables_reject_nested_values() {
        let result: Result<RenderTemplateRequest, _> =
            serde_json::from_str(r#"{"variables": {"user": {"name": "Ada"}}}"#);
        assert!(result.is_err());

        let result: Result<RenderTemplateRequest, _> =
            serde_json::from_str(r#"{"variables": {"missing": null}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_variables_default_to_empty() {
        let request: RenderTemplateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.variables.is_empty());
    }

    #[test]
    fn test_integral_floats_display_as_integers() {
        let vars: TemplateVariables = serde_json::from_str(
            r#"{"one": 1.0, "zero": -0.0, "big": 1e20, "digits": 100000000000000000000}"#,
        )
        .unwrap();

        assert_eq!(vars["one"].to_string(), "1");
        assert_eq!(vars["zero"].to_string(), "0");
        assert_eq!(vars["big"].to_string(), "100000000000000000000");
        assert_eq!(vars["digits"].to_string(), "100000000000000000000");
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        let vars: TemplateVariables =
            serde_json::from_str(r#"{"huge": 1e21, "tiny": 1.5e-7, "small": 0.000001}"#).unwrap();

        assert_eq!(vars["huge"].to_string(), "1e+21");
        assert_eq!(vars["tiny"].to_string(), "1.5e-7");
        assert_eq!(vars["small"].to_string(), "0.000001");
    }

    #[test]
    fn test_numbers_serialize_in_rendered_form() {
        let vars: TemplateVariables =
            serde_json::from_str(r#"{"one": 1.0, "big": 1e20, "ratio": 1.5}"#).unwrap();
        let json = serde_json::to_value(&vars).unwrap();

        assert_eq!(json["one"], serde_json::json!(1));
        assert_eq!(json["big"], "100000000000000000000");
        assert_eq!(json["ratio"], "1.5");
    }

    #[test]
    fn test_variable_conversions() {
        assert_eq!(TemplateVariable::from("x").to_string(), "x");
        assert_eq!(TemplateVariable::from(42i64).to_string(), "42");
        assert_eq!(TemplateVariable::from(false).to_string(), "false");
    }
}
