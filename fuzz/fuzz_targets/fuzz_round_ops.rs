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

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use cointoss_core::ciphertext::Ciphertext;
use cointoss_core::config::{PhaseTopology, ProtocolConfig};
use cointoss_core::error::CoinTossError;
use cointoss_core::oracle::{public_key_for, CallbackDescriptor, ResultTriplet};
use cointoss_core::token::{Authorization, EscrowProof, InMemoryTokenLedger, TokenService};
use cointoss_core::types::{Identity, Randomness, SecretKeyBytes};
use cointoss_core::{CoinToss, Phase, ProtocolState, TxContext};
use libfuzzer_sys::fuzz_target;

const GAME: Identity = Identity::from_bytes([0xc0; 32]);
const ORACLE: Identity = Identity::from_bytes([0x0a; 32]);
const RESOLVER_SECRET: SecretKeyBytes = SecretKeyBytes::from_bytes([0x5e; 32]);

#[derive(Debug, Arbitrary)]
enum Op {
    Start,
    Bet { user: u8, side: bool, salt: u8, fund: bool },
    Wait { secs: u16 },
    Roll { fund: bool },
    Callback { oracle: bool, good_key: bool, result: bool, winners: u8 },
    Reveal { user: u8, salt: u8 },
    EndReveal,
    Claim { user: u8, salt: u8, delta: i8 },
    Provided { skew: i16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    explicit_reveal: bool,
    bet_amount: u16,
    phase_length: u16,
    ops: Vec<Op>,
}

fn user(n: u8) -> Identity {
    Identity::from_bytes([0x10 + (n % 4); 32])
}

fn randomness(n: u8, salt: u8) -> Randomness {
    let mut bytes = [n % 4; 32];
    bytes[0] = salt % 4;
    Randomness(bytes)
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = Input::arbitrary(&mut u) else {
        return;
    };

    let bet_amount = u64::from(input.bet_amount.max(1));
    let topology = if input.explicit_reveal {
        PhaseTopology::ExplicitReveal
    } else {
        PhaseTopology::Folded
    };
    let game = CoinToss::new(ProtocolConfig {
        protocol: GAME,
        resolver: Identity::from_bytes([0xd1; 32]),
        resolver_public_key: public_key_for(&RESOLVER_SECRET),
        token: Identity::from_bytes([0x70; 32]),
        oracle: ORACLE,
        bet_amount,
        oracle_fee: 1,
        phase_length: u64::from(input.phase_length.max(1)),
        timestamp_jitter: 600,
        topology,
    })
    .expect("fixed config must be valid");

    let mut state = ProtocolState::new();
    let mut token = InMemoryTokenLedger::new();
    for n in 0..4 {
        token
            .mint_private(&user(n), 1 << 40)
            .expect("mint into empty ledger");
    }
    let mut now = 1_700_000_000u64;
    let mut provided = None;
    let mut nonce = 0u64;

    for op in input.ops {
        let round_id = state.current_round_id();
        let before = state.current_round().map(|r| (r.phase(), r.claim_count));
        let pool_before = token.balance_of_public(&GAME);
        let state_before = serde_json::to_vec(&state).expect("state encodes");
        let ctx = move |caller: Identity| {
            let ctx = TxContext::new(caller, now);
            match provided {
                Some(p) => ctx.with_provided_time(p),
                None => ctx,
            }
        };

        let result = match op {
            Op::Start => game
                .start_next_round(&mut state, &ctx(user(0)), Ciphertext::default())
                .map(|_| ()),
            Op::Bet { user: n, side, salt, fund } => {
                nonce += 1;
                if fund {
                    token.authorize(Authorization {
                        owner: user(n),
                        spender: GAME,
                        amount: bet_amount,
                        nonce,
                    });
                }
                game.bet(
                    &mut state,
                    &mut token,
                    &ctx(user(n)),
                    side,
                    round_id,
                    randomness(n, salt),
                    &EscrowProof { nonce },
                )
                .map(|_| ())
            }
            Op::Wait { secs } => {
                now += u64::from(secs);
                Ok(())
            }
            Op::Roll { fund } => {
                nonce += 1;
                if fund {
                    token.authorize(Authorization {
                        owner: user(0),
                        spender: GAME,
                        amount: 1,
                        nonce,
                    });
                }
                game.roll(
                    &mut state,
                    &mut token,
                    &ctx(user(0)),
                    round_id,
                    &EscrowProof { nonce },
                    Ciphertext::default(),
                )
            }
            Op::Callback {
                oracle,
                good_key,
                result,
                winners,
            } => {
                let caller = if oracle { ORACLE } else { user(0) };
                let key = if good_key {
                    RESOLVER_SECRET
                } else {
                    SecretKeyBytes([0x01; 32])
                };
                let outcome = game.oracle_callback(
                    &mut state,
                    &ctx(caller),
                    &ResultTriplet {
                        result,
                        winner_count: u64::from(winners),
                        revealed_private_key: key,
                    },
                    &CallbackDescriptor {
                        target: GAME,
                        round_id,
                    },
                );
                if !oracle {
                    assert!(matches!(outcome, Err(CoinTossError::NotOracle)));
                }
                outcome
            }
            Op::Reveal { user: n, salt } => game
                .reveal(&mut state, &ctx(user(n)), round_id, randomness(n, salt))
                .map(|_| ()),
            Op::EndReveal => game.end_reveal_phase(&mut state, &ctx(user(0))),
            Op::Claim { user: n, salt, delta } => {
                let expected = state.round(round_id).map(|r| r.claim_amount).unwrap_or(0);
                let amount = expected.saturating_add_signed(i64::from(delta));
                game.claim(
                    &mut state,
                    &mut token,
                    &ctx(user(n)),
                    round_id,
                    amount,
                    randomness(n, salt),
                )
            }
            Op::Provided { skew } => {
                provided = if skew == 0 {
                    None
                } else {
                    Some(now.saturating_add_signed(i64::from(skew)))
                };
                Ok(())
            }
        };

        let after = state.current_round().map(|r| (r.phase(), r.claim_count));
        if result.is_err() {
            let state_after = serde_json::to_vec(&state).expect("state encodes");
            assert_eq!(state_before, state_after, "rejected op changed state");
            assert_eq!(pool_before, token.balance_of_public(&GAME));
        }

        let mut escrowed: u128 = 0;
        for round in state.rounds() {
            assert_ne!(round.phase(), Phase::RollReady);
            if topology == PhaseTopology::Folded {
                assert_ne!(round.phase(), Phase::Reveal);
            }
            assert!(round.winner_count <= round.bettor_count);
            assert!(round.claim_count <= round.winner_count);
            let paid = u128::from(round.claim_amount) * u128::from(round.claim_count);
            assert!(paid <= round.escrowed_pool(bet_amount));
            escrowed += round.escrowed_pool(bet_amount) - paid;
        }
        assert_eq!(u128::from(token.balance_of_public(&GAME)), escrowed);
        if let (Some((p0, _)), Some((p1, _))) = (before, after) {
            if state.current_round_id() == round_id {
                assert!(p1 >= p0, "phase went backwards");
            }
        }
    }
});
