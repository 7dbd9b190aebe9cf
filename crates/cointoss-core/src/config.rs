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
use crate::timestamp::DEFAULT_JITTER_SECS;
use crate::types::{Identity, PublicKeyBytes};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where reveals happen relative to the oracle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTopology {
    /// Callback moves straight to `Claim`; reveals happen during `Claim`.
    #[default]
    Folded,
    /// Callback moves to `Reveal`; `end_reveal_phase` fixes the payout.
    ExplicitReveal,
}

/// Deployment parameters. Immutable for the lifetime of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Address of this instance; owns the public escrow pool.
    pub protocol: Identity,
    pub resolver: Identity,
    pub resolver_public_key: PublicKeyBytes,
    pub token: Identity,
    pub oracle: Identity,
    pub bet_amount: u64,
    pub oracle_fee: u64,
    /// Seconds each timed phase stays open.
    pub phase_length: u64,
    #[serde(default = "default_jitter")]
    pub timestamp_jitter: u64,
    #[serde(default)]
    pub topology: PhaseTopology,
}

fn default_jitter() -> u64 {
    DEFAULT_JITTER_SECS
}

impl ProtocolConfig {
    pub fn validate(&self) -> CoinTossResult<()> {
        if self.bet_amount == 0 {
            return Err(CoinTossError::InvalidArgument(
                "bet_amount must be positive".to_string(),
            ));
        }
        if self.phase_length == 0 {
            return Err(CoinTossError::InvalidArgument(
                "phase_length must be positive".to_string(),
            ));
        }
        if self.protocol == self.oracle {
            return Err(CoinTossError::InvalidArgument(
                "protocol and oracle identities must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json(bytes: &[u8]) -> CoinTossResult<Self> {
        let cfg: Self = serde_json::from_slice(bytes)
            .map_err(|e| CoinTossError::InvalidArgument(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> CoinTossResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            CoinTossError::InvalidArgument(format!("read {}: {e}", path.display()))
        })?;
        Self::from_json(&bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample() -> ProtocolConfig {
        ProtocolConfig {
            protocol: Identity([0xc0; 32]),
            resolver: Identity([0xd1; 32]),
            resolver_public_key: PublicKeyBytes([0; 32]),
            token: Identity([0x70; 32]),
            oracle: Identity([0x0a; 32]),
            bet_amount: 1337,
            oracle_fee: 100,
            phase_length: 600,
            timestamp_jitter: DEFAULT_JITTER_SECS,
            topology: PhaseTopology::Folded,
        }
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("timestamp_jitter");
        obj.remove("topology");
        let cfg = ProtocolConfig::from_json(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(cfg.timestamp_jitter, DEFAULT_JITTER_SECS);
        assert_eq!(cfg.topology, PhaseTopology::Folded);
    }

    #[test]
    fn rejects_zero_bet_and_phase() {
        let mut cfg = sample();
        cfg.bet_amount = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = sample();
        cfg.phase_length = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&sample()).unwrap()).unwrap();
        assert_eq!(ProtocolConfig::load(&path).unwrap(), sample());
        assert!(ProtocolConfig::load(dir.path().join("missing.json")).is_err());
    }
}
