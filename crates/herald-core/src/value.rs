//! Tagged value model for parsed arguments.
//!
//! Every argument parser produces an [`ArgValue`], a closed tagged union over
//! the supported argument kinds. This replaces the usual "map of `Any`"
//! approach with a type that can be matched exhaustively and extracted with a
//! compile-time-checked accessor via [`FromArgValue`].

use serde::Serialize;

/// A parsed argument value.
///
/// The set of kinds is closed: leaf parsers may implement arbitrary syntax,
/// but every parser resolves to one of these shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A boolean flag.
    Bool(bool),
    /// A string (also produced by greedy arguments).
    Str(String),
}

impl ArgValue {
    /// Returns the kind name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Bool(_) => "bool",
            ArgValue::Str(_) => "string",
        }
    }

    /// Returns the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value as a float.
    ///
    /// Integers widen losslessly for the common "numeric argument" case, so
    /// range validation can treat both kinds uniformly.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if this value is textual.
    pub fn is_textual(&self) -> bool {
        matches!(self, ArgValue::Str(_))
    }

    /// Converts the value into a `serde_json::Value` for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ArgValue::Int(v) => serde_json::Value::from(*v),
            ArgValue::Float(v) => serde_json::Value::from(*v),
            ArgValue::Bool(v) => serde_json::Value::from(*v),
            ArgValue::Str(v) => serde_json::Value::from(v.clone()),
        }
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Bool(v) => write!(f, "{v}"),
            ArgValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

/// Typed extraction from an [`ArgValue`].
///
/// Implemented for the primitive shapes so context lookups can be written as
/// `ctx.get::<i64>("count")` instead of matching on the union by hand.
pub trait FromArgValue: Sized {
    /// Extracts `Self` from the value, or `None` on a kind mismatch.
    fn from_arg_value(value: &ArgValue) -> Option<Self>;
}

impl FromArgValue for i64 {
    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromArgValue for f64 {
    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromArgValue for bool {
    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromArgValue for String {
    fn from_arg_value(value: &ArgValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_float() {
        let v = ArgValue::Int(5);
        assert_eq!(v.as_float(), Some(5.0));
        assert_eq!(f64::from_arg_value(&v), Some(5.0));
    }

    #[test]
    fn float_does_not_narrow_to_int() {
        let v = ArgValue::Float(5.5);
        assert_eq!(v.as_int(), None);
        assert_eq!(i64::from_arg_value(&v), None);
    }

    #[test]
    fn typed_extraction() {
        assert_eq!(i64::from_arg_value(&ArgValue::Int(3)), Some(3));
        assert_eq!(bool::from_arg_value(&ArgValue::Bool(true)), Some(true));
        assert_eq!(
            String::from_arg_value(&ArgValue::Str("hi".into())),
            Some("hi".to_string())
        );
    }

    #[test]
    fn json_conversion() {
        assert_eq!(ArgValue::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(ArgValue::Str("x".into()).to_json(), serde_json::json!("x"));
    }
}
