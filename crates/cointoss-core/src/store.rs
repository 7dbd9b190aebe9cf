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

use crate::config::ProtocolConfig;
use crate::error::{CoinTossError, CoinTossResult};
use crate::protocol::ProtocolState;
use crate::token::InMemoryTokenLedger;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";
const STATE_FILE: &str = "state.json";
const TOKEN_FILE: &str = "token.json";

/// Data directory holding one instance: its config, protocol state and the
/// reference token ledger.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Creates a fresh instance. Fails if the directory already holds one.
    pub fn init(data_dir: &Path, config: &ProtocolConfig) -> CoinTossResult<Self> {
        config.validate()?;
        fs::create_dir_all(data_dir).map_err(io_err)?;
        let store = Self {
            dir: data_dir.to_path_buf(),
        };
        if store.dir.join(CONFIG_FILE).exists() {
            return Err(CoinTossError::InvalidArgument(format!(
                "{} already initialized",
                data_dir.display()
            )));
        }
        store.write_json(CONFIG_FILE, config)?;
        store.save_state(&ProtocolState::new())?;
        store.save_token(&InMemoryTokenLedger::new())?;
        Ok(store)
    }

    pub fn open(data_dir: &Path) -> CoinTossResult<Self> {
        if !data_dir.join(CONFIG_FILE).exists() {
            return Err(CoinTossError::InvalidArgument(format!(
                "{} is not initialized",
                data_dir.display()
            )));
        }
        Ok(Self {
            dir: data_dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_config(&self) -> CoinTossResult<ProtocolConfig> {
        ProtocolConfig::load(self.dir.join(CONFIG_FILE))
    }

    pub fn load_state(&self) -> CoinTossResult<ProtocolState> {
        self.read_json(STATE_FILE)
    }

    pub fn save_state(&self, state: &ProtocolState) -> CoinTossResult<()> {
        self.write_json(STATE_FILE, state)
    }

    pub fn load_token(&self) -> CoinTossResult<InMemoryTokenLedger> {
        self.read_json(TOKEN_FILE)
    }

    pub fn save_token(&self, token: &InMemoryTokenLedger) -> CoinTossResult<()> {
        self.write_json(TOKEN_FILE, token)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> CoinTossResult<T> {
        let bytes = fs::read(self.dir.join(name)).map_err(io_err)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoinTossError::Internal(format!("decode {name}: {e}")))
    }

    /// Write-then-rename so a crash never leaves a torn file.
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> CoinTossResult<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| CoinTossError::Internal(format!("encode {name}: {e}")))?;
        let tmp = self.dir.join(format!("{name}.tmp"));
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(&bytes).map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
        fs::rename(&tmp, self.dir.join(name)).map_err(io_err)
    }
}

fn io_err(e: std::io::Error) -> CoinTossError {
    CoinTossError::Internal(e.to_string())
}
