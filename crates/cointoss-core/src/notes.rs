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

//! Private bet and reveal records.
//!
//! Records live in append-only arenas and are never deleted. Consuming a
//! record inserts its nullifier; a record whose nullifier is present is
//! invisible to every lookup.

use crate::error::{CoinTossError, CoinTossResult};
use crate::nullifier::{Nullifier, NullifierKind, NullifierSet};
use crate::types::{Identity, Randomness};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRecord {
    pub owner: Identity,
    pub round_id: u64,
    /// `true` is tails.
    pub side: bool,
    pub randomness: Randomness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub owner: Identity,
    pub round_id: u64,
    pub randomness: Randomness,
}

/// Unconsumed records visible to one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnedNotes {
    pub bets: Vec<BetRecord>,
    pub reveals: Vec<RevealRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteSnapshot {
    bets: Vec<BetRecord>,
    reveals: Vec<RevealRecord>,
    nullifiers: NullifierSet,
}

type NoteKey = (u64, Randomness);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "NoteSnapshot", into = "NoteSnapshot")]
pub struct NoteLedger {
    arena: NoteSnapshot,
    bet_index: BTreeMap<NoteKey, usize>,
    reveal_index: BTreeMap<NoteKey, usize>,
}

impl From<NoteSnapshot> for NoteLedger {
    fn from(arena: NoteSnapshot) -> Self {
        let bet_index = arena
            .bets
            .iter()
            .enumerate()
            .map(|(i, b)| ((b.round_id, b.randomness), i))
            .collect();
        let reveal_index = arena
            .reveals
            .iter()
            .enumerate()
            .map(|(i, r)| ((r.round_id, r.randomness), i))
            .collect();
        Self {
            arena,
            bet_index,
            reveal_index,
        }
    }
}

impl From<NoteLedger> for NoteSnapshot {
    fn from(ledger: NoteLedger) -> Self {
        ledger.arena
    }
}

impl NoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.arena.nullifiers
    }

    pub fn is_nullified(&self, kind: NullifierKind, round_id: u64, randomness: &Randomness) -> bool {
        self.arena
            .nullifiers
            .contains(&Nullifier::derive(kind, round_id, randomness))
    }

    /// Fails if `(round_id, randomness)` already backs a bet.
    pub fn check_new_bet(&self, round_id: u64, randomness: &Randomness) -> CoinTossResult<()> {
        if self.is_nullified(NullifierKind::BetCommitment, round_id, randomness) {
            return Err(CoinTossError::DuplicateRandomness);
        }
        Ok(())
    }

    /// Records a bet. Callers run [`Self::check_new_bet`] first.
    pub fn insert_bet(&mut self, record: BetRecord) -> CoinTossResult<&BetRecord> {
        let key = (record.round_id, record.randomness);
        let tag = Nullifier::derive(NullifierKind::BetCommitment, key.0, &key.1);
        if !self.arena.nullifiers.insert(tag) {
            return Err(CoinTossError::DuplicateRandomness);
        }
        let idx = self.arena.bets.len();
        self.arena.bets.push(record);
        self.bet_index.insert(key, idx);
        Ok(&self.arena.bets[idx])
    }

    pub fn unspent_bet(
        &self,
        owner: &Identity,
        round_id: u64,
        randomness: &Randomness,
    ) -> CoinTossResult<&BetRecord> {
        let bet = self
            .bet_index
            .get(&(round_id, *randomness))
            .map(|&i| &self.arena.bets[i])
            .filter(|b| b.owner == *owner)
            .ok_or(CoinTossError::BetNoteNotFound)?;
        if self.is_nullified(NullifierKind::BetSpent, round_id, randomness) {
            return Err(CoinTossError::BetNoteNotFound);
        }
        Ok(bet)
    }

    /// Consumes a bet and creates the matching reveal record.
    pub fn reveal_bet(
        &mut self,
        owner: &Identity,
        round_id: u64,
        randomness: &Randomness,
    ) -> CoinTossResult<RevealRecord> {
        self.unspent_bet(owner, round_id, randomness)?;
        self.arena
            .nullifiers
            .insert(Nullifier::derive(NullifierKind::BetSpent, round_id, randomness));
        let record = RevealRecord {
            owner: *owner,
            round_id,
            randomness: *randomness,
        };
        self.reveal_index
            .insert((round_id, *randomness), self.arena.reveals.len());
        self.arena.reveals.push(record.clone());
        Ok(record)
    }

    pub fn unspent_reveal(
        &self,
        owner: &Identity,
        round_id: u64,
        randomness: &Randomness,
    ) -> CoinTossResult<&RevealRecord> {
        let reveal = self
            .reveal_index
            .get(&(round_id, *randomness))
            .map(|&i| &self.arena.reveals[i])
            .filter(|r| r.owner == *owner)
            .ok_or(CoinTossError::RevealNoteNotFound)?;
        if self.is_nullified(NullifierKind::RevealSpent, round_id, randomness) {
            return Err(CoinTossError::RevealNoteNotFound);
        }
        Ok(reveal)
    }

    pub fn spend_reveal(
        &mut self,
        owner: &Identity,
        round_id: u64,
        randomness: &Randomness,
    ) -> CoinTossResult<()> {
        self.unspent_reveal(owner, round_id, randomness)?;
        self.arena
            .nullifiers
            .insert(Nullifier::derive(NullifierKind::RevealSpent, round_id, randomness));
        Ok(())
    }

    pub fn notes_for(&self, owner: &Identity) -> OwnedNotes {
        let bets = self
            .arena
            .bets
            .iter()
            .filter(|b| b.owner == *owner)
            .filter(|b| !self.is_nullified(NullifierKind::BetSpent, b.round_id, &b.randomness))
            .cloned()
            .collect();
        let reveals = self
            .arena
            .reveals
            .iter()
            .filter(|r| r.owner == *owner)
            .filter(|r| !self.is_nullified(NullifierKind::RevealSpent, r.round_id, &r.randomness))
            .cloned()
            .collect();
        OwnedNotes { bets, reveals }
    }
}
