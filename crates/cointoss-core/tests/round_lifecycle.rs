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

use cointoss_core::ciphertext::Ciphertext;
use cointoss_core::config::{PhaseTopology, ProtocolConfig};
use cointoss_core::error::CoinTossError;
use cointoss_core::nullifier::NullifierKind;
use cointoss_core::oracle::{public_key_for, CallbackDescriptor, ResultTriplet};
use cointoss_core::token::{Authorization, EscrowProof, InMemoryTokenLedger, TokenService};
use cointoss_core::types::{CurvePoint, Identity, Randomness, SecretKeyBytes};
use cointoss_core::{CoinToss, Phase, ProtocolState, TxContext};

const BET_AMOUNT: u64 = 1337;
const ORACLE_FEE: u64 = 100;
const PHASE_LENGTH: u64 = 600;
const MINT: u64 = 100_000;
const T0: u64 = 1_700_000_000;

const GAME: Identity = Identity::from_bytes([0xc0; 32]);
const ORACLE: Identity = Identity::from_bytes([0x0a; 32]);
const DIVINITY: Identity = Identity::from_bytes([0xd1; 32]);
const ALICE: Identity = Identity::from_bytes([0xa1; 32]);
const BOB: Identity = Identity::from_bytes([0xb0; 32]);
const CAROL: Identity = Identity::from_bytes([0xca; 32]);

const HEADS: bool = false;
const TAILS: bool = true;

fn resolver_secret() -> SecretKeyBytes {
    SecretKeyBytes([0x5e; 32])
}

fn config(topology: PhaseTopology) -> ProtocolConfig {
    ProtocolConfig {
        protocol: GAME,
        resolver: DIVINITY,
        resolver_public_key: public_key_for(&resolver_secret()),
        token: Identity::from_bytes([0x70; 32]),
        oracle: ORACLE,
        bet_amount: BET_AMOUNT,
        oracle_fee: ORACLE_FEE,
        phase_length: PHASE_LENGTH,
        timestamp_jitter: 600,
        topology,
    }
}

fn randomness(owner: &Identity, n: u8) -> Randomness {
    let mut bytes = owner.0;
    bytes[31] = n;
    Randomness(bytes)
}

fn aggregate() -> Ciphertext {
    Ciphertext::new(CurvePoint([0x21; 32]), CurvePoint([0x43; 32]))
}

struct Harness {
    game: CoinToss,
    state: ProtocolState,
    token: InMemoryTokenLedger,
    next_nonce: u64,
}

impl Harness {
    fn new(topology: PhaseTopology) -> Self {
        let mut token = InMemoryTokenLedger::new();
        for who in [ALICE, BOB, CAROL] {
            token.mint_private(&who, MINT).expect("mint");
        }
        Self {
            game: CoinToss::new(config(topology)).expect("game"),
            state: ProtocolState::new(),
            token,
            next_nonce: 1,
        }
    }

    fn authorize(&mut self, owner: Identity, amount: u64) -> EscrowProof {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        self.token.authorize(Authorization {
            owner,
            spender: GAME,
            amount,
            nonce,
        });
        EscrowProof { nonce }
    }

    fn start(&mut self, now: u64) -> u64 {
        self.game
            .start_next_round(&mut self.state, &TxContext::new(ALICE, now), Ciphertext::default())
            .expect("start round")
    }

    fn bet(&mut self, who: Identity, side: bool, n: u8, now: u64) -> Result<(), CoinTossError> {
        let proof = self.authorize(who, BET_AMOUNT);
        let round_id = self.state.current_round_id();
        self.game
            .bet(
                &mut self.state,
                &mut self.token,
                &TxContext::new(who, now),
                side,
                round_id,
                randomness(&who, n),
                &proof,
            )
            .map(|_| ())
    }

    fn roll(&mut self, now: u64) -> Result<(), CoinTossError> {
        let proof = self.authorize(ALICE, ORACLE_FEE);
        let round_id = self.state.current_round_id();
        self.game.roll(
            &mut self.state,
            &mut self.token,
            &TxContext::new(ALICE, now),
            round_id,
            &proof,
            aggregate(),
        )
    }

    fn callback(
        &mut self,
        caller: Identity,
        result: bool,
        winners: u64,
        secret: SecretKeyBytes,
        now: u64,
    ) -> Result<(), CoinTossError> {
        let round_id = self.state.current_round_id();
        self.game.oracle_callback(
            &mut self.state,
            &TxContext::new(caller, now),
            &ResultTriplet {
                result,
                winner_count: winners,
                revealed_private_key: secret,
            },
            &CallbackDescriptor {
                target: GAME,
                round_id,
            },
        )
    }

    fn reveal(&mut self, who: Identity, n: u8, now: u64) -> Result<(), CoinTossError> {
        let round_id = self.state.current_round_id();
        self.game
            .reveal(&mut self.state, &TxContext::new(who, now), round_id, randomness(&who, n))
            .map(|_| ())
    }

    fn claim(&mut self, who: Identity, amount: u64, n: u8, now: u64) -> Result<(), CoinTossError> {
        let round_id = self.state.current_round_id();
        self.game.claim(
            &mut self.state,
            &mut self.token,
            &TxContext::new(who, now),
            round_id,
            amount,
            randomness(&who, n),
        )
    }

    fn snapshot(&self) -> Vec<u8> {
        serde_json::to_vec(&self.state).expect("encode")
    }
}

/// Three bettors, two on the winning side, through to claims.
#[test]
fn three_bettors_two_winners_claim_2005_each() {
    let mut h = Harness::new(PhaseTopology::Folded);
    let round_id = h.start(T0);
    assert_eq!(round_id, 1);

    h.bet(ALICE, TAILS, 1, T0 + 1).expect("alice bet");
    h.bet(BOB, TAILS, 1, T0 + 2).expect("bob bet");
    h.bet(CAROL, HEADS, 1, T0 + 3).expect("carol bet");

    let round = h.state.round(round_id).expect("round");
    assert_eq!(round.bettor_count, 3);
    assert_eq!(h.token.balance_of_public(&GAME), 3 * BET_AMOUNT);
    assert_eq!(h.token.balance_of_private(&ALICE), MINT - BET_AMOUNT);

    assert_eq!(h.roll(T0 + 10), Err(CoinTossError::BetPhaseNotFinished));
    h.roll(T0 + PHASE_LENGTH + 1).expect("roll");
    assert_eq!(
        h.state.round(round_id).expect("round").phase(),
        Phase::AwaitingOracle
    );

    h.callback(ORACLE, TAILS, 2, resolver_secret(), T0 + PHASE_LENGTH + 5)
        .expect("callback");
    let round = h.state.round(round_id).expect("round");
    assert_eq!(round.phase(), Phase::Claim);
    assert_eq!(round.result, Some(TAILS));
    assert_eq!(round.claim_amount, 2005);
    assert!(round.claim_amount * round.winner_count <= round.bettor_count * BET_AMOUNT);

    let now = T0 + PHASE_LENGTH + 10;
    assert_eq!(h.reveal(CAROL, 1, now), Err(CoinTossError::NotAWinner));
    h.reveal(ALICE, 1, now).expect("alice reveal");
    h.reveal(BOB, 1, now).expect("bob reveal");
    assert!(h
        .state
        .is_nullified(NullifierKind::BetSpent, round_id, &randomness(&ALICE, 1)));
    assert!(h.state.notes_for(&ALICE).bets.is_empty());
    assert_eq!(h.state.notes_for(&ALICE).reveals.len(), 1);

    assert_eq!(
        h.claim(ALICE, 2006, 1, now),
        Err(CoinTossError::ClaimAmountMismatch {
            expected: 2005,
            requested: 2006
        })
    );
    h.claim(ALICE, 2005, 1, now).expect("alice claim");
    h.claim(BOB, 2005, 1, now).expect("bob claim");
    assert_eq!(
        h.claim(ALICE, 2005, 1, now),
        Err(CoinTossError::RevealNoteNotFound)
    );

    assert_eq!(h.token.balance_of_private(&ALICE), MINT - BET_AMOUNT - ORACLE_FEE + 2005);
    assert_eq!(h.token.balance_of_private(&BOB), MINT - BET_AMOUNT + 2005);
    assert_eq!(h.token.balance_of_public(&GAME), 3 * BET_AMOUNT - 2 * 2005);
    assert_eq!(h.token.balance_of_private(&ORACLE), ORACLE_FEE);
}

#[test]
fn callback_from_non_oracle_changes_nothing() {
    let mut h = Harness::new(PhaseTopology::Folded);
    h.start(T0);
    h.bet(ALICE, TAILS, 1, T0).expect("bet");
    h.roll(T0 + PHASE_LENGTH).expect("roll");
    let before = h.snapshot();

    assert_eq!(
        h.callback(ALICE, TAILS, 1, resolver_secret(), T0 + PHASE_LENGTH),
        Err(CoinTossError::NotOracle)
    );
    assert_eq!(h.snapshot(), before);

    assert_eq!(
        h.callback(ORACLE, TAILS, 1, SecretKeyBytes([1; 32]), T0 + PHASE_LENGTH),
        Err(CoinTossError::BadOracleProof)
    );
    assert!(matches!(
        h.callback(ORACLE, TAILS, 2, resolver_secret(), T0 + PHASE_LENGTH),
        Err(CoinTossError::InvalidOracleResult(_))
    ));
    assert_eq!(
        h.callback(ORACLE, HEADS, 0, resolver_secret(), T0 + PHASE_LENGTH),
        Err(CoinTossError::NoWinners)
    );
    assert_eq!(h.snapshot(), before);
}

#[test]
fn callback_echo_must_name_the_pending_round() {
    let mut h = Harness::new(PhaseTopology::Folded);
    h.start(T0);
    h.bet(ALICE, TAILS, 1, T0).expect("bet");
    h.roll(T0 + PHASE_LENGTH).expect("roll");
    let triplet = ResultTriplet {
        result: TAILS,
        winner_count: 1,
        revealed_private_key: resolver_secret(),
    };
    let foreign = CallbackDescriptor {
        target: Identity::from_bytes([0xff; 32]),
        round_id: 1,
    };
    assert_eq!(
        h.game.oracle_callback(
            &mut h.state,
            &TxContext::new(ORACLE, T0 + PHASE_LENGTH),
            &triplet,
            &foreign
        ),
        Err(CoinTossError::CallbackMismatch)
    );
}

#[test]
fn reveal_window_closes_at_claim_deadline() {
    let mut h = Harness::new(PhaseTopology::Folded);
    h.start(T0);
    h.bet(ALICE, HEADS, 1, T0).expect("bet");
    h.bet(BOB, HEADS, 2, T0).expect("bet");
    let rolled_at = T0 + PHASE_LENGTH;
    h.roll(rolled_at).expect("roll");
    h.callback(ORACLE, HEADS, 2, resolver_secret(), rolled_at)
        .expect("callback");

    let deadline = h.state.current_round().expect("round").phase_deadline;
    assert_eq!(deadline, rolled_at + PHASE_LENGTH);
    h.reveal(ALICE, 1, deadline - 1).expect("in time");
    assert_eq!(h.reveal(BOB, 2, deadline), Err(CoinTossError::RevealPhaseEnded));
    assert_eq!(h.reveal(BOB, 9, deadline - 1), Err(CoinTossError::BetNoteNotFound));
    assert_eq!(h.reveal(CAROL, 2, deadline - 1), Err(CoinTossError::BetNoteNotFound));
}

#[test]
fn operations_out_of_phase_are_rejected() {
    let mut h = Harness::new(PhaseTopology::Folded);
    h.start(T0);
    h.bet(ALICE, TAILS, 1, T0).expect("bet");
    assert!(matches!(
        h.reveal(ALICE, 1, T0),
        Err(CoinTossError::UnexpectedPhase {
            expected: Phase::Claim,
            actual: Phase::Bet
        })
    ));
    assert!(matches!(
        h.claim(ALICE, 1337, 1, T0),
        Err(CoinTossError::UnexpectedPhase { .. })
    ));
    assert!(matches!(
        h.callback(ORACLE, TAILS, 1, resolver_secret(), T0),
        Err(CoinTossError::UnexpectedPhase { .. })
    ));
    assert_eq!(
        h.bet(BOB, TAILS, 1, T0 + PHASE_LENGTH),
        Err(CoinTossError::BetPhaseEnded)
    );
}

#[test]
fn next_round_starts_only_after_claim_phase() {
    let mut h = Harness::new(PhaseTopology::Folded);
    h.start(T0);
    h.bet(ALICE, TAILS, 1, T0).expect("bet");
    let ctx = TxContext::new(ALICE, T0 + PHASE_LENGTH);
    assert_eq!(
        h.game
            .start_next_round(&mut h.state, &ctx, Ciphertext::default()),
        Err(CoinTossError::RoundNotFinished)
    );
    h.roll(T0 + PHASE_LENGTH).expect("roll");
    assert_eq!(
        h.game
            .start_next_round(&mut h.state, &ctx, Ciphertext::default()),
        Err(CoinTossError::RoundNotFinished)
    );
    h.callback(ORACLE, TAILS, 1, resolver_secret(), T0 + PHASE_LENGTH)
        .expect("callback");
    assert_eq!(h.start(T0 + PHASE_LENGTH + 1), 2);

    // Round 1 stays claimable after round 2 opens.
    let now = T0 + PHASE_LENGTH + 2;
    h.game
        .reveal(&mut h.state, &TxContext::new(ALICE, now), 1, randomness(&ALICE, 1))
        .expect("reveal round 1");
    h.game
        .claim(
            &mut h.state,
            &mut h.token,
            &TxContext::new(ALICE, now),
            1,
            BET_AMOUNT,
            randomness(&ALICE, 1),
        )
        .expect("claim round 1");

    // Same randomness is fresh in a new round.
    h.bet(ALICE, TAILS, 1, now).expect("bet round 2");
}

#[test]
fn explicit_reveal_topology_fixes_payout_at_end_of_reveal() {
    let mut h = Harness::new(PhaseTopology::ExplicitReveal);
    h.start(T0);
    h.bet(ALICE, TAILS, 1, T0).expect("bet");
    h.bet(BOB, TAILS, 1, T0).expect("bet");
    h.bet(CAROL, HEADS, 1, T0).expect("bet");
    let rolled_at = T0 + PHASE_LENGTH;
    h.roll(rolled_at).expect("roll");
    h.callback(ORACLE, TAILS, 2, resolver_secret(), rolled_at)
        .expect("callback");

    let round = h.state.current_round().expect("round");
    assert_eq!(round.phase(), Phase::Reveal);
    assert_eq!(round.claim_amount, 0);

    h.reveal(ALICE, 1, rolled_at + 1).expect("reveal");
    h.reveal(BOB, 1, rolled_at + 2).expect("reveal");
    let ctx = TxContext::new(CAROL, rolled_at + 10);
    assert_eq!(
        h.game.end_reveal_phase(&mut h.state, &ctx),
        Err(CoinTossError::RevealPhaseNotFinished)
    );
    assert!(matches!(
        h.claim(ALICE, 2005, 1, rolled_at + 10),
        Err(CoinTossError::UnexpectedPhase { .. })
    ));

    let closed_at = rolled_at + PHASE_LENGTH;
    h.game
        .end_reveal_phase(&mut h.state, &TxContext::new(CAROL, closed_at))
        .expect("end reveal");
    let round = h.state.current_round().expect("round");
    assert_eq!(round.phase(), Phase::Claim);
    assert_eq!(round.claim_amount, 2005);
    assert_eq!(round.reveal_count, 2);

    assert_eq!(h.reveal(CAROL, 1, closed_at), Err(CoinTossError::RevealPhaseEnded));
    h.claim(ALICE, 2005, 1, closed_at).expect("claim");
    h.claim(BOB, 2005, 1, closed_at).expect("claim");
    assert_eq!(h.start(closed_at + 1), 2);
}
