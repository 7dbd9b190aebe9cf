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

use crate::error::{CoinTossError, CoinTossResult};
use crate::types::CurvePoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-point ciphertext under the resolver's additively homomorphic key.
///
/// The kernel only stores and compares ciphertexts. Point addition happens in
/// bettor clients and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ciphertext {
    pub c1: CurvePoint,
    pub c2: CurvePoint,
}

impl Ciphertext {
    pub fn new(c1: CurvePoint, c2: CurvePoint) -> Self {
        Self { c1, c2 }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(self.c1.as_bytes());
        out[32..].copy_from_slice(self.c2.as_bytes());
        out
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.c1, self.c2)
    }
}

/// Parses the 128-hex-char concatenation `c1 || c2`.
impl FromStr for Ciphertext {
    type Err = CoinTossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 128 || !s.is_ascii() {
            return Err(CoinTossError::InvalidArgument(
                "ciphertext must be 64 bytes of hex".to_string(),
            ));
        }
        let (a, b) = s.split_at(64);
        Ok(Self {
            c1: a.parse()?,
            c2: b.parse()?,
        })
    }
}

/// Per-round randomness ciphertext: seeded at round start, finalized once at roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessAccumulator {
    ciphertext: Ciphertext,
    finalized: bool,
}

impl RandomnessAccumulator {
    /// `seed` is an encryption of the additive identity.
    pub fn seeded(seed: Ciphertext) -> Self {
        Self {
            ciphertext: seed,
            finalized: false,
        }
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Stores the aggregate of every bettor's contribution.
    pub fn finalize(&mut self, aggregate: Ciphertext) -> CoinTossResult<()> {
        if self.finalized {
            return Err(CoinTossError::Internal(
                "randomness accumulator already finalized".to_string(),
            ));
        }
        self.ciphertext = aggregate;
        self.finalized = true;
        Ok(())
    }
}
