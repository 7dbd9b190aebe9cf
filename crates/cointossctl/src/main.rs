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

use clap::{Parser, Subcommand, ValueEnum};
use cointoss_core::ciphertext::Ciphertext;
use cointoss_core::config::ProtocolConfig;
use cointoss_core::oracle::{public_key_for, CallbackDescriptor, ResultTriplet};
use cointoss_core::store::StateStore;
use cointoss_core::timestamp::{self, DEFAULT_JITTER_SECS};
use cointoss_core::token::{Authorization, EscrowProof, InMemoryTokenLedger, TokenService};
use cointoss_core::types::{Identity, Randomness, SecretKeyBytes};
use cointoss_core::{CoinToss, CoinTossError, ProtocolState, TxContext};
use rand::RngCore;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    /// Tracing filter; events go to stderr.
    #[arg(long, global = true, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Heads,
    Tails,
}

impl Side {
    fn is_tails(self) -> bool {
        matches!(self, Side::Tails)
    }
}

#[derive(clap::Args)]
struct Tx {
    #[arg(long)]
    caller: Identity,
    /// Trusted time in unix seconds. Defaults to the system clock.
    #[arg(long)]
    now: Option<u64>,
    /// Caller timestamp, checked against `now` within the configured jitter.
    #[arg(long)]
    provided: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    Init {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        config: PathBuf,
    },
    Keygen,
    Mint {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        to: Identity,
        #[arg(long)]
        amount: u64,
        /// Credit the public balance instead of the private one.
        #[arg(long)]
        public: bool,
    },
    Authorize {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        owner: Identity,
        #[arg(long)]
        spender: Identity,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        nonce: u64,
    },
    StartRound {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        seed: Option<Ciphertext>,
    },
    Bet {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        round: u64,
        #[arg(long, value_enum)]
        side: Side,
        #[arg(long)]
        randomness: Randomness,
        #[arg(long)]
        nonce: u64,
    },
    Roll {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        round: u64,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        ciphertext: Ciphertext,
    },
    OracleCallback {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        round: u64,
        #[arg(long, value_enum)]
        result: Side,
        #[arg(long)]
        winners: u64,
        #[arg(long)]
        secret: SecretKeyBytes,
    },
    Reveal {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        round: u64,
        #[arg(long)]
        randomness: Randomness,
    },
    Claim {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
        #[arg(long)]
        round: u64,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        randomness: Randomness,
    },
    EndRevealPhase {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        tx: Tx,
    },
    Round {
        #[arg(long)]
        data_dir: PathBuf,
        /// Defaults to the current round.
        #[arg(long)]
        id: Option<u64>,
        #[arg(long)]
        now: Option<u64>,
    },
    Balance {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        of: Identity,
    },
    ValidateTimestamp {
        #[arg(long)]
        provided: u64,
        #[arg(long)]
        now: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_JITTER_SECS)]
        jitter: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();
    match run(cli.cmd) {
        Ok(v) => println!("{}", v),
        Err(msg) => {
            println!("{}", json!({"error": msg}));
            std::process::exit(1);
        }
    }
}

/// A loaded data directory. Changes reach disk only through [`Instance::commit`].
struct Instance {
    store: StateStore,
    game: CoinToss,
    state: ProtocolState,
    token: InMemoryTokenLedger,
}

impl Instance {
    fn open(data_dir: &Path) -> Result<Self, String> {
        let store = StateStore::open(data_dir).map_err(err)?;
        let game = CoinToss::new(store.load_config().map_err(err)?).map_err(err)?;
        let state = store.load_state().map_err(err)?;
        let token = store.load_token().map_err(err)?;
        Ok(Self {
            store,
            game,
            state,
            token,
        })
    }

    fn commit(&self) -> Result<(), String> {
        self.store.save_state(&self.state).map_err(err)?;
        self.store.save_token(&self.token).map_err(err)?;
        tracing::debug!(
            data_dir = %self.store.dir().display(),
            round_id = self.state.current_round_id(),
            "state committed"
        );
        Ok(())
    }
}

fn err(e: CoinTossError) -> String {
    e.to_string()
}

fn system_now() -> Result<u64, String> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

fn context(tx: &Tx) -> Result<TxContext, String> {
    let now = match tx.now {
        Some(now) => now,
        None => system_now()?,
    };
    let ctx = TxContext::new(tx.caller, now);
    Ok(match tx.provided {
        Some(provided) => ctx.with_provided_time(provided),
        None => ctx,
    })
}

fn run(cmd: Command) -> Result<serde_json::Value, String> {
    match cmd {
        Command::Init { data_dir, config } => {
            let config = ProtocolConfig::load(&config).map_err(err)?;
            let store = StateStore::init(&data_dir, &config).map_err(err)?;
            Ok(json!({
                "data_dir": store.dir().display().to_string(),
                "protocol": config.protocol,
                "topology": config.topology,
            }))
        }
        Command::Keygen => {
            let mut seed = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut seed);
            let secret = SecretKeyBytes(seed);
            Ok(json!({
                "secret": secret,
                "public_key": public_key_for(&secret),
            }))
        }
        Command::Mint {
            data_dir,
            to,
            amount,
            public,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let minted = if public {
                inst.token.mint_public(&to, amount)
            } else {
                inst.token.mint_private(&to, amount)
            };
            minted.map_err(|e| e.to_string())?;
            inst.commit()?;
            Ok(balances(&inst.token, &to))
        }
        Command::Authorize {
            data_dir,
            owner,
            spender,
            amount,
            nonce,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            inst.token.authorize(Authorization {
                owner,
                spender,
                amount,
                nonce,
            });
            inst.commit()?;
            Ok(json!({"authorized": true, "nonce": nonce}))
        }
        Command::StartRound { data_dir, tx, seed } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            let round_id = inst
                .game
                .start_next_round(&mut inst.state, &ctx, seed.unwrap_or_default())
                .map_err(err)?;
            inst.commit()?;
            round_view(&inst.state, round_id, ctx.now)
        }
        Command::Bet {
            data_dir,
            tx,
            round,
            side,
            randomness,
            nonce,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            let record = inst
                .game
                .bet(
                    &mut inst.state,
                    &mut inst.token,
                    &ctx,
                    side.is_tails(),
                    round,
                    randomness,
                    &EscrowProof { nonce },
                )
                .map_err(err)?;
            inst.commit()?;
            serde_json::to_value(record).map_err(|e| e.to_string())
        }
        Command::Roll {
            data_dir,
            tx,
            round,
            nonce,
            ciphertext,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            inst.game
                .roll(
                    &mut inst.state,
                    &mut inst.token,
                    &ctx,
                    round,
                    &EscrowProof { nonce },
                    ciphertext,
                )
                .map_err(err)?;
            inst.commit()?;
            let request = inst.state.pending_oracle_request();
            Ok(json!({ "round_id": round, "oracle_request": request }))
        }
        Command::OracleCallback {
            data_dir,
            tx,
            round,
            result,
            winners,
            secret,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            let echo = CallbackDescriptor {
                target: inst.game.config().protocol,
                round_id: round,
            };
            let triplet = ResultTriplet {
                result: result.is_tails(),
                winner_count: winners,
                revealed_private_key: secret,
            };
            inst.game
                .oracle_callback(&mut inst.state, &ctx, &triplet, &echo)
                .map_err(err)?;
            inst.commit()?;
            round_view(&inst.state, round, ctx.now)
        }
        Command::Reveal {
            data_dir,
            tx,
            round,
            randomness,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            let record = inst
                .game
                .reveal(&mut inst.state, &ctx, round, randomness)
                .map_err(err)?;
            inst.commit()?;
            serde_json::to_value(record).map_err(|e| e.to_string())
        }
        Command::Claim {
            data_dir,
            tx,
            round,
            amount,
            randomness,
        } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            inst.game
                .claim(&mut inst.state, &mut inst.token, &ctx, round, amount, randomness)
                .map_err(err)?;
            inst.commit()?;
            Ok(balances(&inst.token, &ctx.caller))
        }
        Command::EndRevealPhase { data_dir, tx } => {
            let mut inst = Instance::open(&data_dir)?;
            let ctx = context(&tx)?;
            inst.game
                .end_reveal_phase(&mut inst.state, &ctx)
                .map_err(err)?;
            inst.commit()?;
            round_view(&inst.state, inst.state.current_round_id(), ctx.now)
        }
        Command::Round { data_dir, id, now } => {
            let inst = Instance::open(&data_dir)?;
            let now = match now {
                Some(now) => now,
                None => system_now()?,
            };
            let id = id.unwrap_or_else(|| inst.state.current_round_id());
            let mut view = round_view(&inst.state, id, now)?;
            view["phase_length"] = json!(inst.game.phase_length());
            view["bet_amount"] = json!(inst.game.bet_amount());
            view["oracle"] = json!(inst.game.oracle());
            view["resolver"] = json!(inst.game.resolver());
            view["token"] = json!(inst.game.token());
            Ok(view)
        }
        Command::Balance { data_dir, of } => {
            let inst = Instance::open(&data_dir)?;
            let mut view = balances(&inst.token, &of);
            view["notes"] = serde_json::to_value(inst.state.notes_for(&of))
                .map_err(|e| e.to_string())?;
            Ok(view)
        }
        Command::ValidateTimestamp {
            provided,
            now,
            jitter,
        } => {
            let now = match now {
                Some(now) => now,
                None => system_now()?,
            };
            timestamp::validate(provided, now, jitter).map_err(err)?;
            Ok(json!({"valid": true, "provided": provided, "now": now, "jitter": jitter}))
        }
    }
}

fn round_view(state: &ProtocolState, id: u64, now: u64) -> Result<serde_json::Value, String> {
    let round = state.round(id).map_err(err)?;
    Ok(json!({
        "round_id": round.id,
        "current_round_id": state.current_round_id(),
        "phase": round.phase_at(now),
        "round": round,
    }))
}

fn balances(token: &InMemoryTokenLedger, who: &Identity) -> serde_json::Value {
    json!({
        "address": who,
        "public": token.balance_of_public(who),
        "private": token.balance_of_private(who),
    })
}
