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

//! Token collaborator seam.
//!
//! The kernel only escrows and releases value through [`TokenService`].
//! [`InMemoryTokenLedger`] is a reference implementation used by tests and
//! the operator CLI; production deployments bind the trait to the real token.

use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("no matching authorization")]
    Unauthorized,

    #[error("insufficient {0} balance")]
    InsufficientBalance(BalanceKind),

    #[error("balance overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Public,
    Private,
}

impl std::fmt::Display for BalanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
        }
    }
}

/// Delegated authorization presented by a caller so the protocol may move
/// its funds. The payer registers it with the token beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowProof {
    pub nonce: u64,
}

/// One authorization: `owner` allows `spender` to move `amount` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Authorization {
    pub owner: Identity,
    pub spender: Identity,
    pub amount: u64,
    pub nonce: u64,
}

pub trait TokenService {
    /// Private to private transfer on behalf of `payer`, executed by `spender`.
    fn escrow(
        &mut self,
        spender: &Identity,
        payer: &Identity,
        payee: &Identity,
        amount: u64,
        proof: &EscrowProof,
    ) -> Result<(), TokenError>;

    /// Private balance of `owner` to public balance of `recipient`.
    fn unshield(
        &mut self,
        spender: &Identity,
        owner: &Identity,
        recipient: &Identity,
        amount: u64,
        proof: &EscrowProof,
    ) -> Result<(), TokenError>;

    /// Public balance of `owner` (the calling contract) to private balance of `recipient`.
    fn shield(&mut self, owner: &Identity, recipient: &Identity, amount: u64)
        -> Result<(), TokenError>;

    fn balance_of_public(&self, addr: &Identity) -> u64;

    fn balance_of_private(&self, addr: &Identity) -> u64;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    public: BTreeMap<Identity, u64>,
    private: BTreeMap<Identity, u64>,
    authorizations: BTreeSet<Authorization>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_private(&mut self, to: &Identity, amount: u64) -> Result<(), TokenError> {
        credit(&mut self.private, to, amount)
    }

    pub fn mint_public(&mut self, to: &Identity, amount: u64) -> Result<(), TokenError> {
        credit(&mut self.public, to, amount)
    }

    pub fn authorize(&mut self, auth: Authorization) {
        self.authorizations.insert(auth);
    }

    pub fn is_authorized(&self, auth: &Authorization) -> bool {
        self.authorizations.contains(auth)
    }

    /// Checks every precondition of a delegated debit without mutating.
    fn check_delegated(
        &self,
        spender: &Identity,
        owner: &Identity,
        amount: u64,
        proof: &EscrowProof,
    ) -> Result<Authorization, TokenError> {
        let auth = Authorization {
            owner: *owner,
            spender: *spender,
            amount,
            nonce: proof.nonce,
        };
        if !self.authorizations.contains(&auth) {
            return Err(TokenError::Unauthorized);
        }
        if self.balance_of_private(owner) < amount {
            return Err(TokenError::InsufficientBalance(BalanceKind::Private));
        }
        Ok(auth)
    }
}

fn credit(book: &mut BTreeMap<Identity, u64>, to: &Identity, amount: u64) -> Result<(), TokenError> {
    let entry = book.entry(*to).or_insert(0);
    *entry = entry.checked_add(amount).ok_or(TokenError::Overflow)?;
    Ok(())
}

fn debit(
    book: &mut BTreeMap<Identity, u64>,
    from: &Identity,
    amount: u64,
    kind: BalanceKind,
) -> Result<(), TokenError> {
    let entry = book.entry(*from).or_insert(0);
    *entry = entry
        .checked_sub(amount)
        .ok_or(TokenError::InsufficientBalance(kind))?;
    Ok(())
}

fn would_overflow(book: &BTreeMap<Identity, u64>, to: &Identity, amount: u64) -> bool {
    book.get(to).copied().unwrap_or(0).checked_add(amount).is_none()
}

impl TokenService for InMemoryTokenLedger {
    fn escrow(
        &mut self,
        spender: &Identity,
        payer: &Identity,
        payee: &Identity,
        amount: u64,
        proof: &EscrowProof,
    ) -> Result<(), TokenError> {
        let auth = self.check_delegated(spender, payer, amount, proof)?;
        if payer != payee && would_overflow(&self.private, payee, amount) {
            return Err(TokenError::Overflow);
        }
        self.authorizations.remove(&auth);
        debit(&mut self.private, payer, amount, BalanceKind::Private)?;
        credit(&mut self.private, payee, amount)
    }

    fn unshield(
        &mut self,
        spender: &Identity,
        owner: &Identity,
        recipient: &Identity,
        amount: u64,
        proof: &EscrowProof,
    ) -> Result<(), TokenError> {
        let auth = self.check_delegated(spender, owner, amount, proof)?;
        if would_overflow(&self.public, recipient, amount) {
            return Err(TokenError::Overflow);
        }
        self.authorizations.remove(&auth);
        debit(&mut self.private, owner, amount, BalanceKind::Private)?;
        credit(&mut self.public, recipient, amount)
    }

    fn shield(
        &mut self,
        owner: &Identity,
        recipient: &Identity,
        amount: u64,
    ) -> Result<(), TokenError> {
        if self.balance_of_public(owner) < amount {
            return Err(TokenError::InsufficientBalance(BalanceKind::Public));
        }
        if would_overflow(&self.private, recipient, amount) {
            return Err(TokenError::Overflow);
        }
        debit(&mut self.public, owner, amount, BalanceKind::Public)?;
        credit(&mut self.private, recipient, amount)
    }

    fn balance_of_public(&self, addr: &Identity) -> u64 {
        self.public.get(addr).copied().unwrap_or(0)
    }

    fn balance_of_private(&self, addr: &Identity) -> u64 {
        self.private.get(addr).copied().unwrap_or(0)
    }
}
