use crate::error::{Result, VkError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Params is the parameter set sent with a call.
/// Keys are kept sorted so the encoded query is the same on every call.
pub type Params = BTreeMap<String, ParamValue>;

/// Name of the parameter carrying the access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

const NON_FINITE: &str = "non-finite number";

/// A scalar request parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Convert a JSON value into a parameter value.
    /// Only strings, finite numbers and booleans are accepted.
    pub fn from_json(key: &str, value: &Value) -> Result<Self> {
        let invalid = |kind| VkError::InvalidParameterType {
            key: key.to_string(),
            kind,
        };

        match value {
            Value::String(s) => Ok(ParamValue::String(s.clone())),
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Int(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() && n.is_f64() => Ok(ParamValue::Float(f)),
                        _ => Err(invalid("number out of range")),
                    }
                }
            }
            Value::Null => Err(invalid("null")),
            Value::Array(_) => Err(invalid("array")),
            Value::Object(_) => Err(invalid("object")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::String(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl TryFrom<f64> for ParamValue {
    type Error = VkError;

    /// NaN and infinities have no wire form and are rejected
    fn try_from(value: f64) -> Result<Self> {
        if value.is_finite() {
            Ok(ParamValue::Float(value))
        } else {
            Err(VkError::InvalidParameterType {
                key: String::new(),
                kind: NON_FINITE,
            })
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Build a parameter set from a JSON object such as `json!({"user_ids": 1})`.
pub fn params_from_json(value: Value) -> Result<Params> {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Params::new()),
        _ => {
            return Err(VkError::InvalidParameterType {
                key: String::new(),
                kind: "parameter set must be an object",
            })
        }
    };

    map.iter()
        .map(|(k, v)| Ok((k.clone(), ParamValue::from_json(k, v)?)))
        .collect()
}

/// Check that every value in the set has a wire form.
/// A `Float` built directly from NaN or an infinity is rejected.
pub fn validate_params(params: &Params) -> Result<()> {
    match params
        .iter()
        .find(|(_, v)| matches!(v, ParamValue::Float(f) if !f.is_finite()))
    {
        Some((key, _)) => Err(VkError::InvalidParameterType {
            key: key.clone(),
            kind: NON_FINITE,
        }),
        None => Ok(()),
    }
}

/// Produce the effective parameter set for one call.
///
/// Client defaults are applied first, then call parameters on top of them.
/// A configured access token is written last and is never replaced by a
/// caller-supplied `access_token`.
pub fn merge_params(access_token: Option<&str>, defaults: &Params, call: &Params) -> Params {
    let mut merged = defaults.clone();
    merged.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));

    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        if let Some(previous) = merged.insert(ACCESS_TOKEN_PARAM.to_string(), token.into()) {
            if previous.to_string() != token {
                tracing::warn!("ignoring caller-supplied access_token, client token takes precedence");
            }
        }
    }

    merged
}
