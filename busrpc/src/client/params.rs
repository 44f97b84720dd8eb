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

//! Call arguments.

use crate::codec::{Codec, EncodeError};
use serde::Serialize;

/// Arguments of a call, encoded one payload per parameter.
///
/// Implemented for tuples of up to eight serializable values (use `()` for
/// no arguments and `(x,)` for one) and for [`RawParams`].
pub trait IntoParams {
    /// Encodes each argument with `codec`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first [`EncodeError`] hit.
    fn into_params<C: Codec>(self, codec: &C) -> Result<Vec<Vec<u8>>, EncodeError>;
}

macro_rules! impl_into_params {
    ($($ty:ident),*) => {
        impl<$($ty: Serialize,)*> IntoParams for ($($ty,)*) {
            #[allow(non_snake_case, unused_variables)]
            fn into_params<C: Codec>(self, codec: &C) -> Result<Vec<Vec<u8>>, EncodeError> {
                let ($($ty,)*) = self;
                Ok(vec![$(codec.encode(&$ty)?),*])
            }
        }
    };
}

impl_into_params!();
impl_into_params!(T1);
impl_into_params!(T1, T2);
impl_into_params!(T1, T2, T3);
impl_into_params!(T1, T2, T3, T4);
impl_into_params!(T1, T2, T3, T4, T5);
impl_into_params!(T1, T2, T3, T4, T5, T6);
impl_into_params!(T1, T2, T3, T4, T5, T6, T7);
impl_into_params!(T1, T2, T3, T4, T5, T6, T7, T8);

/// Already-encoded arguments, passed through untouched.
///
/// Pairs with [`RawMethod`](crate::RawMethod) on the server side, and lets
/// callers send parameter lists whose shape is decided at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams(pub Vec<Vec<u8>>);

impl IntoParams for RawParams {
    fn into_params<C: Codec>(self, _codec: &C) -> Result<Vec<Vec<u8>>, EncodeError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PostcardCodec;

    #[test]
    fn test_empty() {
        let params = ().into_params(&PostcardCodec::default()).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let codec = PostcardCodec::default();
        let params = (5i32, Box::new(3i32), "x").into_params(&codec).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(codec.decode::<i32>(&params[0]).unwrap(), 5);
        assert_eq!(codec.decode::<i32>(&params[1]).unwrap(), 3);
        assert_eq!(codec.decode::<String>(&params[2]).unwrap(), "x");
    }

    #[test]
    fn test_raw_passthrough() {
        let raw = RawParams(vec![vec![1], vec![], vec![2, 3]]);
        let params = raw.clone().into_params(&PostcardCodec::default()).unwrap();
        assert_eq!(params, raw.0);
    }
}
