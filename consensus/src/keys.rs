// Modern, minimalistic & standard-compliant cold wallet library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use amplify::hex::{FromHex, ToHex};
use secp256k1::{ecdsa, Message, SecretKey, SECP256K1};
use zeroize::Zeroizing;

use crate::{
    hash160, ByteSource, DecodeError, Script, ScriptError, ScriptType, Signature, StreamDecode,
};

/// Public key together with the form of its serialization.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PublicKey {
    inner: secp256k1::PublicKey,
    compressed: bool,
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(inner: secp256k1::PublicKey) -> Self { PublicKey::compressed(inner) }
}

impl PublicKey {
    pub const fn new(inner: secp256k1::PublicKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    pub const fn compressed(inner: secp256k1::PublicKey) -> Self { PublicKey::new(inner, true) }

    /// Parses SEC encoding: 33 bytes for compressed and 65 bytes for
    /// uncompressed keys.
    pub fn from_slice(data: &[u8]) -> Result<Self, DecodeError> {
        let compressed = match data.len() {
            33 => true,
            65 => false,
            _ => return Err(DecodeError::InvalidPubkey),
        };
        let inner =
            secp256k1::PublicKey::from_slice(data).map_err(|_| DecodeError::InvalidPubkey)?;
        Ok(PublicKey { inner, compressed })
    }

    #[inline]
    pub const fn inner(&self) -> &secp256k1::PublicKey { &self.inner }

    #[inline]
    pub const fn is_compressed(&self) -> bool { self.compressed }

    /// SEC encoding in the form defined by the compression flag.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.compressed {
            self.inner.serialize().to_vec()
        } else {
            self.inner.serialize_uncompressed().to_vec()
        }
    }

    pub fn to_compressed_bytes(&self) -> [u8; 33] { self.inner.serialize() }

    pub fn hash160(&self) -> [u8; 20] { hash160(self.to_bytes()) }

    /// Verifies signature over a 32-byte message hash. High-S signatures are
    /// normalized before verification.
    pub fn verify(&self, sig: &Signature, hash: [u8; 32]) -> bool {
        let Ok(mut sig) = ecdsa::Signature::from_compact(&sig.to_compact()) else {
            return false;
        };
        sig.normalize_s();
        SECP256K1
            .verify_ecdsa(&Message::from_digest(hash), &sig, &self.inner)
            .is_ok()
    }

    /// Constructs scriptPubkey of the given type paying to this key.
    pub fn script(&self, script_type: ScriptType) -> Result<Script, ScriptError> {
        Script::from_pubkey(self, script_type)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_bytes().to_hex()) }
}

impl FromStr for PublicKey {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s).map_err(|_| DecodeError::InvalidPubkey)?;
        PublicKey::from_slice(&data)
    }
}

/// Incremental decoder state for [`PublicKey`]: the length is defined by the
/// prefix byte.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct PubkeyState {
    buf: Vec<u8>,
}

impl StreamDecode for PublicKey {
    type State = PubkeyState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut PubkeyState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        loop {
            let expected = match state.buf.first() {
                None => 1,
                Some(0x02) | Some(0x03) => 33,
                Some(0x04) => 65,
                Some(_) => return Err(DecodeError::InvalidPubkey),
            };
            if state.buf.len() == expected && expected > 1 {
                return PublicKey::from_slice(&state.buf).map(Some);
            }
            let Some(byte) = src.next_byte()? else {
                return Ok(None);
            };
            state.buf.push(byte);
        }
    }
}

/// Private key with the compression flag for its public key.
///
/// The secret scalar is wiped when the key is dropped.
#[derive(Clone, Eq, PartialEq)]
pub struct PrivateKey {
    secret: SecretKey,
    compressed: bool,
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("secret", &"<secret>")
            .field("compressed", &self.compressed)
            .finish()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) { self.secret.non_secure_erase() }
}

impl PrivateKey {
    pub const fn new(secret: SecretKey, compressed: bool) -> Self {
        PrivateKey { secret, compressed }
    }

    /// Constructs key from a 32-byte big-endian scalar. Zero and values not
    /// below the curve order are rejected.
    pub fn from_slice(data: &[u8], compressed: bool) -> Result<Self, DecodeError> {
        let secret = SecretKey::from_slice(data).map_err(|_| DecodeError::InvalidSecret)?;
        Ok(PrivateKey { secret, compressed })
    }

    #[inline]
    pub const fn secret(&self) -> &SecretKey { &self.secret }

    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> { Zeroizing::new(self.secret.secret_bytes()) }

    #[inline]
    pub const fn is_compressed(&self) -> bool { self.compressed }

    pub fn set_compressed(&mut self, compressed: bool) { self.compressed = compressed }

    /// Computes public key from the secret scalar.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(secp256k1::PublicKey::from_secret_key(SECP256K1, &self.secret), self.compressed)
    }

    /// Signs 32-byte message hash with a deterministic (RFC6979) low-S
    /// signature carrying its recovery id.
    pub fn sign(&self, hash: [u8; 32]) -> Signature {
        let msg = Message::from_digest(hash);
        let (recid, compact) = SECP256K1
            .sign_ecdsa_recoverable(&msg, &self.secret)
            .serialize_compact();
        let mut sig = Signature::from_compact(compact);
        sig.set_recovery_id(i32::from(recid) as u8);
        sig
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parse_hex, sha256d};

    const PK: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn secret_range() {
        assert_eq!(PrivateKey::from_slice(&[0u8; 32], true), Err(DecodeError::InvalidSecret));
        assert_eq!(PrivateKey::from_slice(&[0xFFu8; 32], true), Err(DecodeError::InvalidSecret));
        assert_eq!(PrivateKey::from_slice(&[1u8; 31], true), Err(DecodeError::InvalidSecret));
    }

    #[test]
    fn generator() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let key = PrivateKey::from_slice(&one, true).unwrap();
        assert_eq!(key.public_key().to_string(), PK);
        assert_eq!(format!("{key:?}"), "PrivateKey { secret: \"<secret>\", compressed: true }");
    }

    #[test]
    fn incremental_pubkey() {
        let pk = parse_hex::<PublicKey>(PK).unwrap();
        assert!(pk.is_compressed());
        assert_eq!(pk, PublicKey::from_str(PK).unwrap());
        assert_eq!(parse_hex::<PublicKey>("05aa"), Err(DecodeError::InvalidPubkey));
    }

    #[test]
    fn sign_verify() {
        let key = PrivateKey::from_slice(&[0x11u8; 32], true).unwrap();
        let hash = sha256d(b"message");
        let sig = key.sign(hash);
        assert!(sig.is_valid());
        assert!(key.public_key().verify(&sig, hash));
        assert!(!key.public_key().verify(&sig, sha256d(b"other")));
        assert_eq!(sig, key.sign(hash));
    }
}
