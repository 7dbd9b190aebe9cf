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

//! cointoss-core
//!
//! State kernel of a private, round-based coin-toss protocol.
//!
//! It enforces:
//! - Round phase machine (`Bet → RollReady → AwaitingOracle → Claim`) with
//!   deadline-gated transitions and a jitter-bounded timestamp guard
//! - Private bet/reveal records consumed exactly once through a nullifier set
//! - Per-round randomness ciphertext, finalized once and never decrypted here
//! - Oracle callbacks authenticated by the resolver's revealed key
//! - Per-winner payout `floor(bettors * bet / winners)` and exact-amount claims
//!
//! Token movement goes through the [`token::TokenService`] seam.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod ciphertext;
pub mod config;
pub mod error;
pub mod notes;
pub mod nullifier;
pub mod oracle;
pub mod payout;
pub mod protocol;
pub mod round;
pub mod store;
pub mod timestamp;
pub mod token;
pub mod types;

pub use crate::error::{CoinTossError, CoinTossResult, ErrorClass};
pub use crate::protocol::{CoinToss, ProtocolState, TxContext};
pub use crate::round::{Phase, Round};
