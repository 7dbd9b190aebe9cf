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

use crate::ciphertext::{Ciphertext, RandomnessAccumulator};
use crate::oracle::OracleRequest;
use serde::{Deserialize, Serialize};

/// Round stage. Ordered; a round never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Bet = 0,
    /// Observed only: a `Bet` round past its deadline.
    RollReady = 1,
    AwaitingOracle = 2,
    /// Stored only under the explicit-reveal topology.
    Reveal = 3,
    Claim = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: u64,
    phase: Phase,
    pub phase_deadline: u64,
    pub bettor_count: u64,
    pub winner_count: u64,
    pub reveal_count: u64,
    pub claim_count: u64,
    pub claim_amount: u64,
    pub randomness: RandomnessAccumulator,
    pub result: Option<bool>,
    pub oracle_request: Option<OracleRequest>,
}

impl Round {
    pub fn open(id: u64, now: u64, phase_length: u64, seed: Ciphertext) -> Self {
        Self {
            id,
            phase: Phase::Bet,
            phase_deadline: now.saturating_add(phase_length),
            bettor_count: 0,
            winner_count: 0,
            reveal_count: 0,
            claim_count: 0,
            claim_amount: 0,
            randomness: RandomnessAccumulator::seeded(seed),
            result: None,
            oracle_request: None,
        }
    }

    /// Stored phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phase as seen at `now`: a `Bet` round whose deadline passed is `RollReady`.
    pub fn phase_at(&self, now: u64) -> Phase {
        if self.phase == Phase::Bet && now >= self.phase_deadline {
            Phase::RollReady
        } else {
            self.phase
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Claim
    }

    /// Moves forward and restarts the phase clock.
    pub(crate) fn advance(&mut self, next: Phase, now: u64, phase_length: u64) {
        debug_assert!(next > self.phase, "phase must not decrease");
        self.phase = next;
        self.phase_deadline = now.saturating_add(phase_length);
    }

    pub fn escrowed_pool(&self, bet_amount: u64) -> u128 {
        u128::from(self.bettor_count) * u128::from(bet_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_ready_is_derived_from_deadline() {
        let round = Round::open(1, 1_000, 600, Ciphertext::default());
        assert_eq!(round.phase_at(1_599), Phase::Bet);
        assert_eq!(round.phase_at(1_600), Phase::RollReady);
        assert_eq!(round.phase(), Phase::Bet);
    }

    #[test]
    fn advance_restarts_clock() {
        let mut round = Round::open(1, 0, 600, Ciphertext::default());
        round.advance(Phase::AwaitingOracle, 601, 600);
        assert_eq!(round.phase(), Phase::AwaitingOracle);
        assert_eq!(round.phase_deadline, 1_201);
        assert_eq!(round.phase_at(5_000), Phase::AwaitingOracle);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Bet < Phase::RollReady);
        assert!(Phase::AwaitingOracle < Phase::Reveal);
        assert!(Phase::Reveal < Phase::Claim);
        assert_eq!(Phase::AwaitingOracle as u8, 2);
    }
}
