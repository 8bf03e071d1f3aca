//! Mapping between Rust parameter types and wire type descriptors.

use std::collections::BTreeMap;

use courier_wire::{Value, ValueType};
use serde::de::DeserializeOwned;

use super::errors::InvocationError;

/// A Rust type that can appear as a method parameter.
///
/// The associated descriptor becomes part of the method's signature, so the
/// caller must declare the same descriptor for the call to resolve.
pub trait WireType: DeserializeOwned {
    /// Descriptor callers declare for this parameter.
    const VALUE_TYPE: ValueType;
}

macro_rules! wire_type {
    ($value_type:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl WireType for $ty {
                const VALUE_TYPE: ValueType = $value_type;
            }
        )+
    };
}

wire_type!(ValueType::Bool => bool);
wire_type!(ValueType::Int => i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
wire_type!(ValueType::Float => f32, f64);
wire_type!(ValueType::String => String);
wire_type!(ValueType::Any => Value);
wire_type!(ValueType::Map => serde_json::Map<String, Value>);

impl<T: WireType> WireType for Vec<T> {
    const VALUE_TYPE: ValueType = ValueType::List;
}

impl<T: WireType> WireType for BTreeMap<String, T> {
    const VALUE_TYPE: ValueType = ValueType::Map;
}

/// Optional parameters keep the inner descriptor and accept `null`.
impl<T: WireType> WireType for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;
}

/// Converts the argument at `index` into the parameter type.
pub(crate) fn decode_arg<A: WireType>(args: &[Value], index: usize) -> Result<A, InvocationError> {
    let value = args
        .get(index)
        .ok_or(InvocationError::MissingArgument { index })?;
    serde_json::from_value(value.clone()).map_err(|source| InvocationError::Argument { index, source })
}
