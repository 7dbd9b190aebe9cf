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

use crate::ciphertext::Ciphertext;
use crate::error::{CoinTossError, CoinTossResult};
use crate::types::{Identity, PublicKeyBytes, SecretKeyBytes};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// Verifies that the resolver's revealed secret belongs to its registered key.
///
/// The kernel never re-derives the decryption; trust in the reported result
/// rests entirely on this check.
pub trait Authenticator {
    fn authenticate(
        &self,
        revealed_private_key: &SecretKeyBytes,
        registered_public_key: &PublicKeyBytes,
    ) -> CoinTossResult<()>;
}

/// Treats the revealed secret as an Ed25519 seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyAuthenticator;

impl Authenticator for Ed25519KeyAuthenticator {
    fn authenticate(
        &self,
        revealed_private_key: &SecretKeyBytes,
        registered_public_key: &PublicKeyBytes,
    ) -> CoinTossResult<()> {
        let derived = SigningKey::from_bytes(revealed_private_key.as_bytes()).verifying_key();
        if derived.to_bytes() != *registered_public_key.as_bytes() {
            return Err(CoinTossError::BadOracleProof);
        }
        Ok(())
    }
}

/// Public key registered for a resolver secret.
pub fn public_key_for(secret: &SecretKeyBytes) -> PublicKeyBytes {
    PublicKeyBytes(SigningKey::from_bytes(secret.as_bytes()).verifying_key().to_bytes())
}

/// Where the oracle delivers its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackDescriptor {
    pub target: Identity,
    pub round_id: u64,
}

/// Question submitted at roll time; the transport relays it to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub requester: Identity,
    pub round_id: u64,
    pub resolver: Identity,
    pub ciphertext: Ciphertext,
    pub callback: CallbackDescriptor,
    pub nonce: u64,
    pub fee: u64,
}

/// Resolver answer: coin result, number of winning bets, and the secret
/// that decrypts the round ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTriplet {
    /// `true` is tails.
    pub result: bool,
    pub winner_count: u64,
    pub revealed_private_key: SecretKeyBytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedResult {
    pub result: bool,
    pub winner_count: u64,
}

/// Accepts a callback for `pending` once the echo and the resolver key check out.
pub fn accept_callback<A: Authenticator + ?Sized>(
    authenticator: &A,
    pending: &OracleRequest,
    echo: &CallbackDescriptor,
    triplet: &ResultTriplet,
    registered_public_key: &PublicKeyBytes,
) -> CoinTossResult<DecodedResult> {
    if *echo != pending.callback {
        return Err(CoinTossError::CallbackMismatch);
    }
    authenticator.authenticate(&triplet.revealed_private_key, registered_public_key)?;
    Ok(DecodedResult {
        result: triplet.result,
        winner_count: triplet.winner_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CurvePoint;

    fn secret() -> SecretKeyBytes {
        SecretKeyBytes([7u8; 32])
    }

    fn request() -> OracleRequest {
        OracleRequest {
            requester: Identity([1; 32]),
            round_id: 4,
            resolver: Identity([2; 32]),
            ciphertext: Ciphertext::new(CurvePoint([3; 32]), CurvePoint([4; 32])),
            callback: CallbackDescriptor {
                target: Identity([5; 32]),
                round_id: 4,
            },
            nonce: 11,
            fee: 100,
        }
    }

    #[test]
    fn ed25519_authenticator_matches_derived_key() {
        let auth = Ed25519KeyAuthenticator;
        let pk = public_key_for(&secret());
        assert!(auth.authenticate(&secret(), &pk).is_ok());
        assert_eq!(
            auth.authenticate(&SecretKeyBytes([8u8; 32]), &pk),
            Err(CoinTossError::BadOracleProof)
        );
    }

    #[test]
    fn callback_echo_must_match() {
        let pending = request();
        let triplet = ResultTriplet {
            result: true,
            winner_count: 2,
            revealed_private_key: secret(),
        };
        let pk = public_key_for(&secret());
        let wrong = CallbackDescriptor {
            round_id: 5,
            ..pending.callback
        };
        assert_eq!(
            accept_callback(&Ed25519KeyAuthenticator, &pending, &wrong, &triplet, &pk),
            Err(CoinTossError::CallbackMismatch)
        );
        let decoded =
            accept_callback(&Ed25519KeyAuthenticator, &pending, &pending.callback, &triplet, &pk)
                .unwrap();
        assert_eq!(
            decoded,
            DecodedResult {
                result: true,
                winner_count: 2
            }
        );
    }

    #[test]
    fn random_resolver_keys_only_verify_themselves() {
        use rand::RngCore;
        let mut rng = rand::thread_rng();
        let mut a = SecretKeyBytes::default();
        let mut b = SecretKeyBytes::default();
        rng.fill_bytes(&mut a.0);
        rng.fill_bytes(&mut b.0);
        let auth = Ed25519KeyAuthenticator;
        assert!(auth.authenticate(&a, &public_key_for(&a)).is_ok());
        assert!(auth.authenticate(&b, &public_key_for(&b)).is_ok());
        if a != b {
            assert!(auth.authenticate(&a, &public_key_for(&b)).is_err());
        }
    }
}
