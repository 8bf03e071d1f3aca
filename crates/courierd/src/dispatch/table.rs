//! Explicit method registry keyed by name and parameter types.
//!
//! Resolution is an exact lookup on `(name, ordered parameter types)`. The
//! table is assembled once through [`MethodTableBuilder`] and never changes
//! afterwards, so a given signature always resolves to the same handler.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use courier_wire::{Value, ValueType};
use serde::Serialize;

use super::errors::{InvocationError, MethodError, RegistryError};
use super::params::{WireType, decode_arg};

/// Name plus ordered parameter types identifying one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    name: String,
    params: Vec<ValueType>,
}

impl Signature {
    /// Builds a signature from a name and its parameter descriptors.
    pub fn new(name: impl Into<String>, params: impl Into<Vec<ValueType>>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Parameter descriptors in call order.
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        self.params.as_slice()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}(", self.name)?;
        for (position, param) in self.params.iter().enumerate() {
            if position > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{param}")?;
        }
        formatter.write_str(")")
    }
}

/// Whether remote callers may invoke a registered method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Invocable by any client.
    #[default]
    Public,
    /// Resolvable but refused with an access-denied failure.
    Internal,
}

/// Type-erased method body.
pub type Handler<T> = Box<dyn Fn(&T, &[Value]) -> Result<Value, InvocationError> + Send>;

pub(crate) struct Registration<T> {
    pub(crate) access: Access,
    pub(crate) handler: Handler<T>,
}

/// Immutable dispatch table for a target of type `T`.
pub struct MethodTable<T> {
    entries: HashMap<Signature, Registration<T>>,
}

impl<T> MethodTable<T> {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> MethodTableBuilder<T> {
        MethodTableBuilder::new()
    }

    pub(crate) fn resolve(&self, signature: &Signature) -> Option<&Registration<T>> {
        self.entries.get(signature)
    }

    /// Registered signatures, sorted for stable output.
    #[must_use]
    pub fn signatures(&self) -> Vec<&Signature> {
        let mut signatures: Vec<_> = self.entries.keys().collect();
        signatures.sort();
        signatures
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for MethodTable<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MethodTable")
            .field("signatures", &self.signatures())
            .finish()
    }
}

/// Collects registrations and validates them when built.
pub struct MethodTableBuilder<T> {
    entries: HashMap<Signature, Registration<T>>,
    error: Option<RegistryError>,
}

impl<T> Default for MethodTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MethodTableBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            error: None,
        }
    }

    /// Registers an untyped handler under an explicit signature.
    #[must_use]
    pub fn register<F>(mut self, signature: Signature, access: Access, handler: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value, InvocationError> + Send + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if signature.name().trim().is_empty() {
            self.error = Some(RegistryError::EmptyName);
            return self;
        }
        match self.entries.entry(signature) {
            Entry::Occupied(occupied) => {
                self.error = Some(RegistryError::DuplicateMethod {
                    signature: occupied.key().clone(),
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Registration {
                    access,
                    handler: Box::new(handler),
                });
            }
        }
        self
    }

    /// Registers a public method without parameters.
    #[must_use]
    pub fn method0<R, E, F>(self, name: &str, method: F) -> Self
    where
        R: Serialize,
        E: Into<MethodError>,
        F: Fn(&T) -> Result<R, E> + Send + 'static,
    {
        self.register(Signature::new(name, Vec::new()), Access::Public, move |target, _| {
            encode_result(method(target))
        })
    }

    /// Registers a public method with one parameter.
    #[must_use]
    pub fn method1<A, R, E, F>(self, name: &str, method: F) -> Self
    where
        A: WireType,
        R: Serialize,
        E: Into<MethodError>,
        F: Fn(&T, A) -> Result<R, E> + Send + 'static,
    {
        let signature = Signature::new(name, [A::VALUE_TYPE]);
        self.register(signature, Access::Public, move |target, args| {
            let first = decode_arg(args, 0)?;
            encode_result(method(target, first))
        })
    }

    /// Registers a public method with two parameters.
    #[must_use]
    pub fn method2<A, B, R, E, F>(self, name: &str, method: F) -> Self
    where
        A: WireType,
        B: WireType,
        R: Serialize,
        E: Into<MethodError>,
        F: Fn(&T, A, B) -> Result<R, E> + Send + 'static,
    {
        let signature = Signature::new(name, [A::VALUE_TYPE, B::VALUE_TYPE]);
        self.register(signature, Access::Public, move |target, args| {
            let first = decode_arg(args, 0)?;
            let second = decode_arg(args, 1)?;
            encode_result(method(target, first, second))
        })
    }

    /// Registers a public method with three parameters.
    #[must_use]
    pub fn method3<A, B, C, R, E, F>(self, name: &str, method: F) -> Self
    where
        A: WireType,
        B: WireType,
        C: WireType,
        R: Serialize,
        E: Into<MethodError>,
        F: Fn(&T, A, B, C) -> Result<R, E> + Send + 'static,
    {
        let signature = Signature::new(name, [A::VALUE_TYPE, B::VALUE_TYPE, C::VALUE_TYPE]);
        self.register(signature, Access::Public, move |target, args| {
            let first = decode_arg(args, 0)?;
            let second = decode_arg(args, 1)?;
            let third = decode_arg(args, 2)?;
            encode_result(method(target, first, second, third))
        })
    }

    /// Registers a parameterless method that resolves but refuses remote calls.
    #[must_use]
    pub fn internal0<R, E, F>(self, name: &str, method: F) -> Self
    where
        R: Serialize,
        E: Into<MethodError>,
        F: Fn(&T) -> Result<R, E> + Send + 'static,
    {
        self.register(Signature::new(name, Vec::new()), Access::Internal, move |target, _| {
            encode_result(method(target))
        })
    }

    /// Validates the registrations and freezes the table.
    ///
    /// # Errors
    ///
    /// Returns the first registration problem encountered, such as a
    /// duplicated signature.
    pub fn build(self) -> Result<MethodTable<T>, RegistryError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(MethodTable {
                entries: self.entries,
            }),
        }
    }
}

fn encode_result<R: Serialize, E: Into<MethodError>>(
    result: Result<R, E>,
) -> Result<Value, InvocationError> {
    let value = result.map_err(InvocationError::method)?;
    serde_json::to_value(value).map_err(InvocationError::Result)
}
