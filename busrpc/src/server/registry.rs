//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Method registry.
//!
//! Every registration is captured as a [`MethodRecord`]: the erased handler
//! plus descriptors of its parameter and return types. The descriptors are
//! what the dispatcher checks inbound requests against, and what decides
//! whether a signature can be registered at all.

use crate::codec::Codec;
use crate::error::RpcError;
use crate::server::handler::MethodHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a type descriptor stands for a value or for the error marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An encodable value.
    Value,
    /// The error half of a `Result` return.
    Error,
}

/// Describes one parameter or return type of a registered method.
///
/// # Examples
///
/// ```rust
/// use busrpc::{TypeDescriptor, TypeKind};
///
/// let value = TypeDescriptor::value::<i32>();
/// assert_eq!(value.name(), "i32");
/// assert_eq!(value.kind(), TypeKind::Value);
///
/// assert!(TypeDescriptor::error::<String>().is_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Descriptor for a value of type `T`.
    pub fn value<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            kind: TypeKind::Value,
        }
    }

    /// Descriptor for an error marker of type `E`.
    pub fn error<E: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<E>(),
            kind: TypeKind::Error,
        }
    }

    /// Descriptor with an explicit name, for handlers whose types are only
    /// known at runtime.
    pub const fn named(name: &'static str, kind: TypeKind) -> Self {
        Self { name, kind }
    }

    /// The type's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Value or error marker.
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns `true` for the error marker.
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }
}

/// How a method runs relative to the delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Awaited by the delivery task. The next message on the subscription
    /// waits until the handler returns or panics.
    #[default]
    Synchronous,
    /// On a spawned task; the delivery task moves on immediately.
    Worker,
}

/// A registered method.
pub struct MethodRecord<C: Codec> {
    name: String,
    pub(crate) handler: Arc<dyn MethodHandler<C>>,
    parameter_types: Vec<TypeDescriptor>,
    return_types: Vec<TypeDescriptor>,
    dispatch_mode: DispatchMode,
}

impl<C: Codec> MethodRecord<C> {
    pub(crate) fn new(
        name: String,
        handler: Arc<dyn MethodHandler<C>>,
        parameter_types: Vec<TypeDescriptor>,
        return_types: Vec<TypeDescriptor>,
        dispatch_mode: DispatchMode,
    ) -> Self {
        Self {
            name,
            handler,
            parameter_types,
            return_types,
            dispatch_mode,
        }
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order.
    pub fn parameter_types(&self) -> &[TypeDescriptor] {
        &self.parameter_types
    }

    /// Declared return types: empty, or a value followed by an error marker.
    pub fn return_types(&self) -> &[TypeDescriptor] {
        &self.return_types
    }

    /// Number of parameters a request must carry.
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Returns `true` if the method produces a response.
    pub fn replies(&self) -> bool {
        !self.return_types.is_empty()
    }

    /// Synchronous or worker dispatch.
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch_mode
    }
}

impl<C: Codec> std::fmt::Debug for MethodRecord<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRecord")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("return_types", &self.return_types)
            .field("dispatch_mode", &self.dispatch_mode)
            .finish()
    }
}

/// Checks that a method returns nothing, or a value and an error marker.
pub(crate) fn check_suitable(return_types: &[TypeDescriptor]) -> Result<(), String> {
    match return_types {
        [] => Ok(()),
        [_, error] if error.is_error() => Ok(()),
        [_, other] => Err(format!(
            "second return value {} is not an error",
            other.name()
        )),
        types => Err(format!(
            "expected 0 or 2 return values, found {}",
            types.len()
        )),
    }
}

/// Name-keyed method table.
pub(crate) struct MethodRegistry<C: Codec> {
    methods: HashMap<String, Arc<MethodRecord<C>>>,
}

impl<C: Codec> MethodRegistry<C> {
    pub(crate) fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Adds a record. The first registration of a name wins.
    pub(crate) fn insert(&mut self, record: MethodRecord<C>) -> Result<(), RpcError> {
        if self.methods.contains_key(record.name()) {
            return Err(RpcError::DuplicateMethod {
                name: record.name,
            });
        }
        if let Err(reason) = check_suitable(record.return_types()) {
            return Err(RpcError::UnsuitableMethod {
                name: record.name,
                reason,
            });
        }
        self.methods.insert(record.name.clone(), Arc::new(record));
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<MethodRecord<C>>> {
        self.methods.get(name).cloned()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.methods.len()
    }
}
