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

/// Default tolerance for caller-supplied timestamps, in seconds.
pub const DEFAULT_JITTER_SECS: u64 = 10 * 60;

/// Accepts `provided` iff `trusted_now <= provided <= trusted_now + jitter`.
pub fn validate(provided: u64, trusted_now: u64, jitter: u64) -> CoinTossResult<()> {
    if provided < trusted_now {
        return Err(CoinTossError::PastTimestamp);
    }
    if provided > trusted_now.saturating_add(jitter) {
        return Err(CoinTossError::FutureTimestamp);
    }
    Ok(())
}
