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

/// Per-winner payout: `floor(bettor_count * bet_amount / winner_count)`.
pub fn compute(bettor_count: u64, winner_count: u64, bet_amount: u64) -> CoinTossResult<u64> {
    if winner_count == 0 {
        return Err(CoinTossError::NoWinners);
    }
    let pool = u128::from(bettor_count) * u128::from(bet_amount);
    u64::try_from(pool / u128::from(winner_count))
        .map_err(|_| CoinTossError::InvalidArgument("claim amount overflows u64".to_string()))
}

/// Claims must request exactly the stored amount.
pub fn validate_claim(requested: u64, claim_amount: u64) -> CoinTossResult<()> {
    if requested != claim_amount {
        return Err(CoinTossError::ClaimAmountMismatch {
            expected: claim_amount,
            requested,
        });
    }
    Ok(())
}
