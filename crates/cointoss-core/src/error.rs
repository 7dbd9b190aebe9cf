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

use crate::round::Phase;
use crate::token::TokenError;
use thiserror::Error;

pub type CoinTossResult<T> = Result<T, CoinTossError>;

/// Coarse grouping of rejections, used by callers that only care whether to
/// wait, fix their input, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Liveness,
    Authorization,
    Ledger,
    Arithmetic,
    Input,
    Collaborator,
    Internal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoinTossError {
    #[error("current round not finished")]
    RoundNotFinished,

    #[error("bet phase not finished")]
    BetPhaseNotFinished,

    #[error("reveal phase not finished")]
    RevealPhaseNotFinished,

    #[error("bet phase ended")]
    BetPhaseEnded,

    #[error("reveal phase ended")]
    RevealPhaseEnded,

    #[error("unexpected phase: expected {expected:?}, found {actual:?}")]
    UnexpectedPhase { expected: Phase, actual: Phase },

    #[error("round mismatch: expected {expected}, got {provided}")]
    RoundMismatch { expected: u64, provided: u64 },

    #[error("round {0} not found")]
    RoundNotFound(u64),

    #[error("caller is not the oracle")]
    NotOracle,

    #[error("revealed key does not match the resolver public key")]
    BadOracleProof,

    #[error("callback does not match the pending oracle request")]
    CallbackMismatch,

    #[error("oracle result rejected: {0}")]
    InvalidOracleResult(String),

    #[error("randomness already used in this round")]
    DuplicateRandomness,

    #[error("bet note not found")]
    BetNoteNotFound,

    #[error("reveal note not found")]
    RevealNoteNotFound,

    #[error("bet side does not match the round result")]
    NotAWinner,

    #[error("all winners already claimed")]
    ClaimsExhausted,

    #[error("round has no winners")]
    NoWinners,

    #[error("claim amount mismatch: expected {expected}, requested {requested}")]
    ClaimAmountMismatch { expected: u64, requested: u64 },

    #[error("past timestamp")]
    PastTimestamp,

    #[error("future timestamp")]
    FutureTimestamp,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("token: {0}")]
    Token(#[from] TokenError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoinTossError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RoundNotFinished
            | Self::BetPhaseNotFinished
            | Self::RevealPhaseNotFinished
            | Self::BetPhaseEnded
            | Self::RevealPhaseEnded
            | Self::UnexpectedPhase { .. } => ErrorClass::Liveness,
            Self::RoundMismatch { .. }
            | Self::RoundNotFound(_)
            | Self::NotOracle
            | Self::BadOracleProof
            | Self::CallbackMismatch
            | Self::InvalidOracleResult(_) => ErrorClass::Authorization,
            Self::DuplicateRandomness
            | Self::BetNoteNotFound
            | Self::RevealNoteNotFound
            | Self::NotAWinner
            | Self::ClaimsExhausted => ErrorClass::Ledger,
            Self::NoWinners | Self::ClaimAmountMismatch { .. } => ErrorClass::Arithmetic,
            Self::PastTimestamp | Self::FutureTimestamp | Self::InvalidArgument(_) => {
                ErrorClass::Input
            }
            Self::Token(_) => ErrorClass::Collaborator,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Waiting for a deadline or for the current round to finish can make
    /// the same call succeed later. Every other rejection is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RoundNotFinished | Self::BetPhaseNotFinished | Self::RevealPhaseNotFinished
        )
    }
}
