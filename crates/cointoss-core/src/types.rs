// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-width byte newtypes shared across the kernel.
//!
//! All of them encode as lowercase hex in JSON and on the command line.

use crate::error::CoinTossError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub(crate) fn decode_hex32(value: &str) -> Result<[u8; 32], CoinTossError> {
    let s = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(s)
        .map_err(|_| CoinTossError::InvalidArgument(format!("invalid hex: {value}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CoinTossError::InvalidArgument(format!("expected 32 bytes, got {}", bytes.len())))
}

macro_rules! hex_bytes32 {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CoinTossError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_hex32(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes32!(
    /// Account or contract address.
    Identity
);

hex_bytes32!(
    /// Bettor-chosen field element backing one bet; only its holder can reveal it.
    Randomness
);

hex_bytes32!(
    /// Compressed curve point. Opaque to the kernel.
    CurvePoint
);

hex_bytes32!(
    /// Ed25519 verifying key bytes of the resolver.
    PublicKeyBytes
);

hex_bytes32!(
    /// Secret seed revealed by the resolver in its callback.
    SecretKeyBytes
);
