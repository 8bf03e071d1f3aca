//! Parsing of `type:value` command-line arguments.

use courier_wire::{Value, ValueType};

use crate::errors::AppError;

/// Splits `argument` into its declared type and JSON value.
///
/// `string` arguments take the text after the colon verbatim; every other
/// type parses it as JSON.
pub(crate) fn parse_argument(argument: &str) -> Result<(ValueType, Value), AppError> {
    let Some((type_name, raw)) = argument.split_once(':') else {
        return Err(AppError::MissingTypePrefix {
            argument: argument.to_owned(),
        });
    };
    let value_type = type_name
        .parse::<ValueType>()
        .map_err(|source| AppError::UnknownType {
            argument: argument.to_owned(),
            source,
        })?;
    let value = match value_type {
        ValueType::String => Value::String(raw.to_owned()),
        _ => serde_json::from_str(raw).map_err(|source| AppError::InvalidValue {
            argument: argument.to_owned(),
            source,
        })?,
    };
    Ok((value_type, value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::int("int:42", ValueType::Int, json!(42))]
    #[case::negative("int:-7", ValueType::Int, json!(-7))]
    #[case::string_verbatim("string:a:b c", ValueType::String, json!("a:b c"))]
    #[case::empty_string("string:", ValueType::String, json!(""))]
    #[case::list("list:[\"x\",\"y\"]", ValueType::List, json!(["x", "y"]))]
    #[case::map("map:{\"k\":1}", ValueType::Map, json!({"k": 1}))]
    #[case::bool("bool:true", ValueType::Bool, json!(true))]
    #[case::any_null("any:null", ValueType::Any, Value::Null)]
    fn parses_typed_arguments(
        #[case] argument: &str,
        #[case] value_type: ValueType,
        #[case] value: Value,
    ) {
        let parsed = parse_argument(argument).expect("argument should parse");
        assert_eq!(parsed, (value_type, value));
    }

    #[rstest]
    #[case::no_prefix("42")]
    #[case::unknown_type("integer:42")]
    #[case::bad_json("int:forty-two")]
    fn rejects_malformed_arguments(#[case] argument: &str) {
        assert!(parse_argument(argument).is_err());
    }
}
