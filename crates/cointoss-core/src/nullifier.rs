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

use crate::types::Randomness;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const NULLIFIER_DOMAIN: &[u8] = b"cointoss/nullifier/v1";

/// What a nullifier marks as used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullifierKind {
    /// Randomness reserved by a bet; blocks a second bet with the same value.
    BetCommitment,
    /// Bet record consumed by a reveal.
    BetSpent,
    /// Reveal record consumed by a claim.
    RevealSpent,
}

impl NullifierKind {
    fn tag(self) -> u8 {
        match self {
            Self::BetCommitment => 1,
            Self::BetSpent => 2,
            Self::RevealSpent => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

impl Nullifier {
    pub fn derive(kind: NullifierKind, round_id: u64, randomness: &Randomness) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(NULLIFIER_DOMAIN);
        hasher.update([kind.tag()]);
        hasher.update(round_id.to_be_bytes());
        hasher.update(randomness.as_bytes());
        Self(hasher.finalize().into())
    }
}

/// Append-only set of consumption tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierSet {
    entries: BTreeSet<Nullifier>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.entries.contains(nullifier)
    }

    /// Returns false if the tag was already present.
    pub fn insert(&mut self, nullifier: Nullifier) -> bool {
        self.entries.insert(nullifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
