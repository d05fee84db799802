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

use bc::PublicKey;

use crate::{DerivationIndex, KeyOrigin, Xpriv, Xpub, XpubFp};

/// Extended keys which can reproduce public keys for the key origins recorded
/// in partially signed transactions.
///
/// A master key (depth 0) matches only origins with its own fingerprint and
/// derives the full path. A key at depth `n` derives the origin path past its
/// first `n` segments; the caller must compare the result against the
/// recorded public key since the account part of the path can't be checked.
pub trait DeriveKey {
    fn key_depth(&self) -> u8;

    fn key_fingerprint(&self) -> XpubFp;

    /// Derives the public key for the path suffix past the key's own depth.
    /// Returns `None` if the path can't be derived from this key.
    fn derive_suffix(&self, suffix: &[DerivationIndex]) -> Option<PublicKey>;

    fn derive_pubkey(&self, origin: &KeyOrigin) -> Option<PublicKey> {
        let depth = self.key_depth();
        if depth == 0 && origin.master_fp() != self.key_fingerprint() {
            return None;
        }
        let suffix = origin.derivation().suffix(depth as usize)?;
        self.derive_suffix(suffix)
    }

    /// Checks whether the public key recorded for the origin belongs to this
    /// key.
    fn owns(&self, origin: &KeyOrigin, pubkey: &PublicKey) -> bool {
        self.derive_pubkey(origin)
            .map(|pk| pk.inner() == pubkey.inner())
            .unwrap_or_default()
    }
}

impl DeriveKey for Xpriv {
    fn key_depth(&self) -> u8 { self.depth() }

    fn key_fingerprint(&self) -> XpubFp { self.fingerprint() }

    fn derive_suffix(&self, suffix: &[DerivationIndex]) -> Option<PublicKey> {
        Some(self.derive_priv(suffix).public_key())
    }
}

impl DeriveKey for Xpub {
    fn key_depth(&self) -> u8 { self.depth() }

    fn key_fingerprint(&self) -> XpubFp { self.fingerprint() }

    fn derive_suffix(&self, suffix: &[DerivationIndex]) -> Option<PublicKey> {
        let mut xpub = *self;
        for idx in suffix {
            match idx {
                DerivationIndex::Normal(idx) => xpub = xpub.ckd_pub(*idx),
                DerivationIndex::Hardened(_) => return None,
            }
        }
        Some(xpub.public_key())
    }
}
