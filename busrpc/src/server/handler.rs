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

//! Handler adapters.
//!
//! Service methods are ordinary async closures or functions. [`Handler`] is
//! implemented for any `Fn(T1, .., Tn) -> impl Future` with up to eight
//! parameters, where each parameter is decodable and the output is a
//! [`HandlerOutput`]: either `()` for fire-and-forget methods or
//! `Result<T, E>` for methods that answer.
//!
//! Both are erased to [`MethodHandler`] at registration so the registry can
//! hold methods of every signature side by side. [`RawMethod`] bypasses the
//! typed layer and takes pre-encoded parameters with caller-declared type
//! descriptors.

use crate::codec::{Codec, DecodeError, EncodeError};
use crate::server::registry::TypeDescriptor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a handler produced, ready to be framed into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Encoded result value.
    Value(Vec<u8>),
    /// Rendered handler error.
    Error(String),
}

/// Output of a raw method: `None` for no reply, otherwise encoded result
/// bytes or an error message.
pub type RawReply = Option<Result<Vec<u8>, String>>;

/// Values a handler may return.
pub trait HandlerOutput: Send + 'static {
    /// Descriptors of the declared return values.
    fn return_types() -> Vec<TypeDescriptor>;

    /// Converts the output into a reply, or `None` when there is nothing to
    /// send back.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if a success value cannot be encoded.
    fn into_reply<C: Codec>(self, codec: &C) -> Result<Option<Reply>, EncodeError>;
}

impl HandlerOutput for () {
    fn return_types() -> Vec<TypeDescriptor> {
        Vec::new()
    }

    fn into_reply<C: Codec>(self, _codec: &C) -> Result<Option<Reply>, EncodeError> {
        Ok(None)
    }
}

impl<T, E> HandlerOutput for Result<T, E>
where
    T: Serialize + Send + 'static,
    E: Display + Send + 'static,
{
    fn return_types() -> Vec<TypeDescriptor> {
        vec![TypeDescriptor::value::<T>(), TypeDescriptor::error::<E>()]
    }

    fn into_reply<C: Codec>(self, codec: &C) -> Result<Option<Reply>, EncodeError> {
        match self {
            Ok(value) => codec.encode(&value).map(|bytes| Some(Reply::Value(bytes))),
            Err(error) => Ok(Some(Reply::Error(error.to_string()))),
        }
    }
}

/// A typed service method.
///
/// `Args` is the tuple of parameter types; it only exists to keep the
/// implementations for different arities apart.
pub trait Handler<Args>: Send + Sync + 'static {
    /// What the method returns.
    type Output: HandlerOutput;
    /// The future produced by one invocation.
    type Future: Future<Output = Self::Output> + Send + 'static;

    /// Descriptors of the declared parameters, in order.
    fn parameter_types() -> Vec<TypeDescriptor>;

    /// Decodes each parameter and starts the method.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the parameter count is wrong or any
    /// parameter fails to decode. The method is not started in that case.
    fn call_with<C: Codec>(&self, codec: &C, params: &[Vec<u8>])
    -> Result<Self::Future, DecodeError>;
}

macro_rules! impl_handler {
    ($count:expr; $($ty:ident),*) => {
        impl<F, Fut, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: HandlerOutput,
            $($ty: DeserializeOwned + Send + 'static,)*
        {
            type Output = Fut::Output;
            type Future = Fut;

            fn parameter_types() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::value::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call_with<C: Codec>(
                &self,
                codec: &C,
                params: &[Vec<u8>],
            ) -> Result<Fut, DecodeError> {
                let count_error = || DecodeError::ParameterCount {
                    expected: $count,
                    received: params.len(),
                };
                if params.len() != $count {
                    return Err(count_error());
                }
                let mut iter = params.iter();
                $(
                    let $ty: $ty = codec.decode(iter.next().ok_or_else(count_error)?)?;
                )*
                Ok((self)($($ty),*))
            }
        }
    };
}

impl_handler!(0;);
impl_handler!(1; T1);
impl_handler!(2; T1, T2);
impl_handler!(3; T1, T2, T3);
impl_handler!(4; T1, T2, T3, T4);
impl_handler!(5; T1, T2, T3, T4, T5);
impl_handler!(6; T1, T2, T3, T4, T5, T6);
impl_handler!(7; T1, T2, T3, T4, T5, T6, T7);
impl_handler!(8; T1, T2, T3, T4, T5, T6, T7, T8);

/// A registered method with its signature erased.
pub trait MethodHandler<C: Codec>: Send + Sync + 'static {
    /// Decodes `params` and returns the running invocation.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the parameters do not decode; nothing
    /// runs in that case.
    fn invoke(
        &self,
        codec: Arc<C>,
        params: Vec<Vec<u8>>,
    ) -> Result<BoxFuture<Result<Option<Reply>, EncodeError>>, DecodeError>;
}

/// Erases a typed [`Handler`].
pub(crate) struct TypedMethod<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> TypedMethod<H, Args> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<C, H, Args> MethodHandler<C> for TypedMethod<H, Args>
where
    C: Codec,
    H: Handler<Args>,
    Args: 'static,
{
    fn invoke(
        &self,
        codec: Arc<C>,
        params: Vec<Vec<u8>>,
    ) -> Result<BoxFuture<Result<Option<Reply>, EncodeError>>, DecodeError> {
        let running = self.handler.call_with(codec.as_ref(), &params)?;
        Ok(Box::pin(async move {
            let output = running.await;
            output.into_reply(codec.as_ref())
        }))
    }
}

type RawFn = dyn Fn(Vec<Vec<u8>>) -> BoxFuture<RawReply> + Send + Sync;

/// A method that works on encoded parameters directly.
///
/// The caller supplies the type descriptors, which go through the same
/// suitability check as typed handlers. Useful for bridging handlers whose
/// signature is only known at runtime.
///
/// # Examples
///
/// ```rust
/// use busrpc::{RawMethod, TypeDescriptor, TypeKind};
///
/// let echo = RawMethod::new(
///     vec![TypeDescriptor::named("bytes", TypeKind::Value)],
///     vec![
///         TypeDescriptor::named("bytes", TypeKind::Value),
///         TypeDescriptor::named("error", TypeKind::Error),
///     ],
///     |mut params| async move { params.pop().map(Ok) },
/// );
/// assert_eq!(echo.parameter_types().len(), 1);
/// ```
#[derive(Clone)]
pub struct RawMethod {
    parameter_types: Vec<TypeDescriptor>,
    return_types: Vec<TypeDescriptor>,
    handler: Arc<RawFn>,
}

impl RawMethod {
    /// Creates a raw method from its declared signature and body.
    pub fn new<F, Fut>(
        parameter_types: Vec<TypeDescriptor>,
        return_types: Vec<TypeDescriptor>,
        handler: F,
    ) -> Self
    where
        F: Fn(Vec<Vec<u8>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RawReply> + Send + 'static,
    {
        Self {
            parameter_types,
            return_types,
            handler: Arc::new(move |params| Box::pin(handler(params))),
        }
    }

    /// Declared parameter types.
    pub fn parameter_types(&self) -> &[TypeDescriptor] {
        &self.parameter_types
    }

    /// Declared return types.
    pub fn return_types(&self) -> &[TypeDescriptor] {
        &self.return_types
    }
}

impl std::fmt::Debug for RawMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawMethod")
            .field("parameter_types", &self.parameter_types)
            .field("return_types", &self.return_types)
            .finish_non_exhaustive()
    }
}

impl<C: Codec> MethodHandler<C> for RawMethod {
    fn invoke(
        &self,
        _codec: Arc<C>,
        params: Vec<Vec<u8>>,
    ) -> Result<BoxFuture<Result<Option<Reply>, EncodeError>>, DecodeError> {
        let running = (self.handler)(params);
        Ok(Box::pin(async move {
            Ok(running.await.map(|reply| match reply {
                Ok(bytes) => Reply::Value(bytes),
                Err(message) => Reply::Error(message),
            }))
        }))
    }
}
