//! Request and response envelopes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Declared type of a single method parameter.
///
/// Descriptors are part of a method's signature: two methods with the same
/// name but different descriptor lists are distinct operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `true` or `false`.
    Bool,
    /// Signed or unsigned integer.
    Int,
    /// Floating point number.
    Float,
    /// UTF-8 string.
    String,
    /// Ordered sequence of values.
    List,
    /// String-keyed object.
    Map,
    /// Any JSON value, passed through untouched.
    Any,
}

impl ValueType {
    /// Every descriptor, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::List,
        Self::Map,
        Self::Any,
    ];

    /// Canonical lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }
}

/// Raised when text names no known [`ValueType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value type `{0}`")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|value_type| value_type.as_str() == text)
            .ok_or_else(|| UnknownValueType(text.to_owned()))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A single method invocation requested by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Name of the method to invoke.
    pub method: String,
    /// Declared parameter types, in call order.
    #[serde(default)]
    pub param_types: Vec<ValueType>,
    /// Argument values, in call order.
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Request {
    /// Starts a request for `method` with no arguments.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            param_types: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Appends an argument together with its declared type.
    #[must_use]
    pub fn arg(mut self, value_type: ValueType, value: impl Into<Value>) -> Self {
        self.param_types.push(value_type);
        self.params.push(value.into());
        self
    }

    /// Returns `true` when every declared type has a matching value.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.param_types.len() == self.params.len()
    }
}

/// Reason a request produced no result.
///
/// Only the category crosses the wire. The underlying cause stays in the
/// server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// No method matches the requested name and parameter types.
    MethodNotFound,
    /// The method exists but is not exposed to remote callers.
    AccessDenied,
    /// The method ran and reported an error.
    InvocationFailed,
}

impl fmt::Display for Failure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MethodNotFound => "method not found",
            Self::AccessDenied => "access denied",
            Self::InvocationFailed => "invocation failed",
        };
        formatter.write_str(text)
    }
}

/// Outcome of a single request.
///
/// A successful call that returns nothing is `Success { value: Value::Null }`,
/// which remains distinct from every [`Failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Response {
    /// The method returned normally.
    Success {
        /// Return value, `null` for methods without a result.
        value: Value,
    },
    /// The method could not be resolved or failed.
    Failure {
        /// Failure category.
        failure: Failure,
    },
}

impl Response {
    /// Wraps a return value.
    #[must_use]
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    /// Wraps a failure marker.
    #[must_use]
    pub const fn failure(failure: Failure) -> Self {
        Self::Failure { failure }
    }

    /// Returns the value of a successful response.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Success { value } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failure marker of an unsuccessful response.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { failure } => Some(*failure),
        }
    }

    /// Returns `true` for successful responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_builder_keeps_types_and_values_aligned() {
        let request = Request::new("add")
            .arg(ValueType::Int, 2)
            .arg(ValueType::Int, 3);
        assert_eq!(request.param_types, vec![ValueType::Int, ValueType::Int]);
        assert_eq!(request.params, vec![json!(2), json!(3)]);
        assert!(request.is_well_formed());
    }

    #[test]
    fn request_defaults_missing_argument_lists() {
        let request: Request =
            serde_json::from_str(r#"{"method":"count"}"#).expect("parse request");
        assert_eq!(request, Request::new("count"));
    }

    #[test]
    fn null_success_is_distinct_from_failure() {
        let empty = Response::success(Value::Null);
        assert!(empty.is_success());
        assert_eq!(empty.value(), Some(&Value::Null));
        assert_eq!(empty.failure_kind(), None);

        let failed = Response::failure(Failure::MethodNotFound);
        assert!(!failed.is_success());
        assert_eq!(failed.value(), None);
    }

    #[test]
    fn responses_serialise_with_outcome_tag() {
        let success = serde_json::to_value(Response::success("hello")).expect("serialise");
        assert_eq!(success, json!({"outcome": "success", "value": "hello"}));

        let failure =
            serde_json::to_value(Response::failure(Failure::AccessDenied)).expect("serialise");
        assert_eq!(
            failure,
            json!({"outcome": "failure", "failure": "access_denied"})
        );
    }

    #[test]
    fn value_types_use_lowercase_names() {
        let encoded = serde_json::to_string(&ValueType::String).expect("serialise");
        assert_eq!(encoded, r#""string""#);
        assert_eq!(ValueType::Map.to_string(), "map");
    }

    #[test]
    fn value_types_parse_from_their_wire_names() {
        for value_type in ValueType::ALL {
            assert_eq!(value_type.as_str().parse::<ValueType>(), Ok(value_type));
        }
        assert_eq!(
            "integer".parse::<ValueType>(),
            Err(UnknownValueType("integer".to_owned()))
        );
    }
}
