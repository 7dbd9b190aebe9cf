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

//! Round state machine.
//!
//! [`CoinToss`] holds the immutable deployment parameters and the oracle
//! authenticator; all mutable state lives in a [`ProtocolState`] passed to
//! each operation. Every operation checks all of its preconditions first,
//! then makes at most one collaborator call, then applies mutations that
//! cannot fail. A rejected operation leaves the state and the collaborator
//! untouched.

use crate::ciphertext::Ciphertext;
use crate::config::{PhaseTopology, ProtocolConfig};
use crate::error::{CoinTossError, CoinTossResult};
use crate::notes::{BetRecord, NoteLedger, OwnedNotes, RevealRecord};
use crate::nullifier::NullifierKind;
use crate::oracle::{
    accept_callback, Authenticator, CallbackDescriptor, Ed25519KeyAuthenticator, OracleRequest,
    ResultTriplet,
};
use crate::payout;
use crate::round::{Phase, Round};
use crate::timestamp;
use crate::token::{EscrowProof, TokenService};
use crate::types::{Identity, Randomness};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Who submits a transaction and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub caller: Identity,
    /// Trusted ledger time, seconds.
    pub now: u64,
    /// Caller-supplied timestamp; validated against `now` within the jitter.
    pub provided: Option<u64>,
}

impl TxContext {
    pub fn new(caller: Identity, now: u64) -> Self {
        Self {
            caller,
            now,
            provided: None,
        }
    }

    pub fn with_provided_time(mut self, provided: u64) -> Self {
        self.provided = Some(provided);
        self
    }
}

/// Everything an instance mutates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolState {
    current_round_id: u64,
    rounds: BTreeMap<u64, Round>,
    notes: NoteLedger,
}

impl ProtocolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero until the first round starts.
    pub fn current_round_id(&self) -> u64 {
        self.current_round_id
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(&self.current_round_id)
    }

    pub fn round(&self, id: u64) -> CoinTossResult<&Round> {
        self.rounds.get(&id).ok_or(CoinTossError::RoundNotFound(id))
    }

    fn round_mut(&mut self, id: u64) -> CoinTossResult<&mut Round> {
        self.rounds
            .get_mut(&id)
            .ok_or(CoinTossError::RoundNotFound(id))
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    pub fn notes(&self) -> &NoteLedger {
        &self.notes
    }

    /// Unconsumed records an owner can act on.
    pub fn notes_for(&self, owner: &Identity) -> OwnedNotes {
        self.notes.notes_for(owner)
    }

    pub fn pending_oracle_request(&self) -> Option<&OracleRequest> {
        self.current_round()
            .filter(|r| r.phase() == Phase::AwaitingOracle)
            .and_then(|r| r.oracle_request.as_ref())
    }

    pub fn nullifier_count(&self) -> usize {
        self.notes.nullifiers().len()
    }

    pub fn is_nullified(&self, kind: NullifierKind, round_id: u64, randomness: &Randomness) -> bool {
        self.notes.is_nullified(kind, round_id, randomness)
    }

    fn current_round_checked(&self, round_id: u64) -> CoinTossResult<&Round> {
        if round_id != self.current_round_id {
            return Err(CoinTossError::RoundMismatch {
                expected: self.current_round_id,
                provided: round_id,
            });
        }
        self.round(round_id)
    }
}

pub struct CoinToss<A = Ed25519KeyAuthenticator> {
    config: ProtocolConfig,
    authenticator: A,
}

impl CoinToss<Ed25519KeyAuthenticator> {
    pub fn new(config: ProtocolConfig) -> CoinTossResult<Self> {
        Self::with_authenticator(config, Ed25519KeyAuthenticator)
    }
}

impl<A: Authenticator> CoinToss<A> {
    pub fn with_authenticator(config: ProtocolConfig, authenticator: A) -> CoinTossResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            authenticator,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn phase_length(&self) -> u64 {
        self.config.phase_length
    }

    pub fn bet_amount(&self) -> u64 {
        self.config.bet_amount
    }

    pub fn oracle(&self) -> &Identity {
        &self.config.oracle
    }

    pub fn resolver(&self) -> &Identity {
        &self.config.resolver
    }

    pub fn token(&self) -> &Identity {
        &self.config.token
    }

    pub fn validate_timestamp(&self, provided: u64, trusted_now: u64) -> CoinTossResult<()> {
        timestamp::validate(provided, trusted_now, self.config.timestamp_jitter)
    }

    /// Validates the caller timestamp and returns the later of it and
    /// trusted time. Only "window still open" checks use this; deadlines are
    /// set and passed on trusted time alone.
    fn window_time(&self, ctx: &TxContext) -> CoinTossResult<u64> {
        match ctx.provided {
            Some(provided) => {
                self.validate_timestamp(provided, ctx.now)?;
                Ok(provided.max(ctx.now))
            }
            None => Ok(ctx.now),
        }
    }

    fn reveal_phase(&self) -> Phase {
        match self.config.topology {
            PhaseTopology::Folded => Phase::Claim,
            PhaseTopology::ExplicitReveal => Phase::Reveal,
        }
    }

    /// Opens the next round. `seed` encrypts the additive identity under the
    /// resolver key.
    pub fn start_next_round(
        &self,
        state: &mut ProtocolState,
        ctx: &TxContext,
        seed: Ciphertext,
    ) -> CoinTossResult<u64> {
        self.window_time(ctx)?;
        let now = ctx.now;
        if let Some(current) = state.current_round() {
            if !current.is_terminal() {
                return Err(CoinTossError::RoundNotFinished);
            }
        }
        let id = state
            .current_round_id
            .checked_add(1)
            .ok_or_else(|| CoinTossError::Internal("round id overflow".to_string()))?;
        let round = Round::open(id, now, self.config.phase_length, seed);
        tracing::info!(round_id = id, phase_deadline = round.phase_deadline, "round started");
        state.rounds.insert(id, round);
        state.current_round_id = id;
        Ok(id)
    }

    /// Escrows the bet amount from the caller and records a private bet.
    #[allow(clippy::too_many_arguments)]
    pub fn bet<T: TokenService + ?Sized>(
        &self,
        state: &mut ProtocolState,
        token: &mut T,
        ctx: &TxContext,
        side: bool,
        round_id: u64,
        randomness: Randomness,
        proof: &EscrowProof,
    ) -> CoinTossResult<BetRecord> {
        let now = self.window_time(ctx)?;
        let round = state.current_round_checked(round_id)?;
        if round.phase_at(now) != Phase::Bet {
            return Err(CoinTossError::BetPhaseEnded);
        }
        state.notes.check_new_bet(round_id, &randomness)?;

        token.unshield(
            &self.config.protocol,
            &ctx.caller,
            &self.config.protocol,
            self.config.bet_amount,
            proof,
        )?;

        let record = state
            .notes
            .insert_bet(BetRecord {
                owner: ctx.caller,
                round_id,
                side,
                randomness,
            })?
            .clone();
        let round = state.round_mut(round_id)?;
        round.bettor_count += 1;
        tracing::info!(round_id, bettor_count = round.bettor_count, "bet accepted");
        Ok(record)
    }

    /// Closes betting: pays the oracle fee, submits the aggregate ciphertext
    /// for resolution and waits for the callback.
    pub fn roll<T: TokenService + ?Sized>(
        &self,
        state: &mut ProtocolState,
        token: &mut T,
        ctx: &TxContext,
        round_id: u64,
        proof: &EscrowProof,
        final_ciphertext: Ciphertext,
    ) -> CoinTossResult<()> {
        self.window_time(ctx)?;
        let now = ctx.now;
        let round = state.current_round_checked(round_id)?;
        match round.phase_at(now) {
            Phase::Bet => return Err(CoinTossError::BetPhaseNotFinished),
            Phase::RollReady => {}
            actual => {
                return Err(CoinTossError::UnexpectedPhase {
                    expected: Phase::RollReady,
                    actual,
                })
            }
        }
        if round.randomness.is_finalized() {
            return Err(CoinTossError::Internal(
                "randomness finalized before roll".to_string(),
            ));
        }

        token.escrow(
            &self.config.protocol,
            &ctx.caller,
            &self.config.oracle,
            self.config.oracle_fee,
            proof,
        )?;

        let request = OracleRequest {
            requester: ctx.caller,
            round_id,
            resolver: self.config.resolver,
            ciphertext: final_ciphertext,
            callback: CallbackDescriptor {
                target: self.config.protocol,
                round_id,
            },
            nonce: proof.nonce,
            fee: self.config.oracle_fee,
        };
        let round = state.round_mut(round_id)?;
        round.randomness.finalize(final_ciphertext)?;
        round.oracle_request = Some(request);
        round.advance(Phase::AwaitingOracle, now, self.config.phase_length);
        tracing::info!(
            round_id,
            bettor_count = round.bettor_count,
            phase_deadline = round.phase_deadline,
            "round rolled; awaiting oracle"
        );
        Ok(())
    }

    /// Accepts the resolver's answer relayed by the oracle.
    pub fn oracle_callback(
        &self,
        state: &mut ProtocolState,
        ctx: &TxContext,
        triplet: &ResultTriplet,
        echo: &CallbackDescriptor,
    ) -> CoinTossResult<()> {
        if ctx.caller != self.config.oracle {
            return Err(CoinTossError::NotOracle);
        }
        self.window_time(ctx)?;
        let now = ctx.now;
        let round = state.round(echo.round_id)?;
        if round.phase() != Phase::AwaitingOracle {
            return Err(CoinTossError::UnexpectedPhase {
                expected: Phase::AwaitingOracle,
                actual: round.phase(),
            });
        }
        let pending = round
            .oracle_request
            .as_ref()
            .ok_or_else(|| CoinTossError::Internal("no pending oracle request".to_string()))?;
        let decoded = accept_callback(
            &self.authenticator,
            pending,
            echo,
            triplet,
            &self.config.resolver_public_key,
        )
        .map_err(|err| {
            tracing::warn!(round_id = echo.round_id, error = %err, "oracle callback rejected");
            err
        })?;
        if decoded.winner_count > round.bettor_count {
            return Err(CoinTossError::InvalidOracleResult(format!(
                "{} winners reported for {} bettors",
                decoded.winner_count, round.bettor_count
            )));
        }
        let claim_amount =
            payout::compute(round.bettor_count, decoded.winner_count, self.config.bet_amount)?;

        let next = self.reveal_phase();
        let round = state.round_mut(echo.round_id)?;
        round.result = Some(decoded.result);
        round.winner_count = decoded.winner_count;
        if next == Phase::Claim {
            round.claim_amount = claim_amount;
        }
        round.advance(next, now, self.config.phase_length);
        tracing::info!(
            round_id = round.id,
            winner_count = round.winner_count,
            phase = ?round.phase(),
            "oracle result accepted"
        );
        Ok(())
    }

    /// Consumes a winning bet record and creates the reveal record that backs a claim.
    pub fn reveal(
        &self,
        state: &mut ProtocolState,
        ctx: &TxContext,
        round_id: u64,
        randomness: Randomness,
    ) -> CoinTossResult<RevealRecord> {
        let now = self.window_time(ctx)?;
        let round = state.round(round_id)?;
        let window = self.reveal_phase();
        if round.phase() < window {
            return Err(CoinTossError::UnexpectedPhase {
                expected: window,
                actual: round.phase(),
            });
        }
        if round.phase() > window || now >= round.phase_deadline {
            return Err(CoinTossError::RevealPhaseEnded);
        }
        let bet = state.notes.unspent_bet(&ctx.caller, round_id, &randomness)?;
        if round.result != Some(bet.side) {
            return Err(CoinTossError::NotAWinner);
        }

        let record = state.notes.reveal_bet(&ctx.caller, round_id, &randomness)?;
        let round = state.round_mut(round_id)?;
        round.reveal_count += 1;
        tracing::info!(round_id, reveal_count = round.reveal_count, "bet revealed");
        Ok(record)
    }

    /// Explicit-reveal topology only: closes the reveal window of the current
    /// round and fixes the payout.
    pub fn end_reveal_phase(&self, state: &mut ProtocolState, ctx: &TxContext) -> CoinTossResult<()> {
        self.window_time(ctx)?;
        let now = ctx.now;
        let round_id = state.current_round_id;
        let round = state.round(round_id)?;
        if self.config.topology != PhaseTopology::ExplicitReveal || round.phase() != Phase::Reveal {
            return Err(CoinTossError::UnexpectedPhase {
                expected: Phase::Reveal,
                actual: round.phase(),
            });
        }
        if now < round.phase_deadline {
            return Err(CoinTossError::RevealPhaseNotFinished);
        }
        let claim_amount =
            payout::compute(round.bettor_count, round.winner_count, self.config.bet_amount)?;

        let round = state.round_mut(round_id)?;
        round.claim_amount = claim_amount;
        round.advance(Phase::Claim, now, self.config.phase_length);
        tracing::info!(round_id, claim_amount, "reveal phase closed");
        Ok(())
    }

    /// Pays out one revealed winning bet.
    pub fn claim<T: TokenService + ?Sized>(
        &self,
        state: &mut ProtocolState,
        token: &mut T,
        ctx: &TxContext,
        round_id: u64,
        amount: u64,
        randomness: Randomness,
    ) -> CoinTossResult<()> {
        self.window_time(ctx)?;
        let round = state.round(round_id)?;
        if round.phase() != Phase::Claim {
            return Err(CoinTossError::UnexpectedPhase {
                expected: Phase::Claim,
                actual: round.phase(),
            });
        }
        state.notes.unspent_reveal(&ctx.caller, round_id, &randomness)?;
        payout::validate_claim(amount, round.claim_amount)?;
        if round.claim_count >= round.winner_count {
            return Err(CoinTossError::ClaimsExhausted);
        }

        token.shield(&self.config.protocol, &ctx.caller, amount)?;

        state.notes.spend_reveal(&ctx.caller, round_id, &randomness)?;
        let round = state.round_mut(round_id)?;
        round.claim_count += 1;
        tracing::info!(round_id, claim_count = round.claim_count, "claim paid");
        Ok(())
    }
}
