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

//! Purpose and coin type conventions of BIP44, BIP49, BIP84 and BIP48.
//!
//! These are wallet heuristics, not part of BIP32: a derivation path segment
//! says nothing normative about how the key is used. The conventions are
//! applied only by the explicitly named methods below; the plain derivation
//! methods of [`Xpriv`] and [`Xpub`](crate::Xpub) never change the script
//! type or the network of a key.

use bc::ScriptType;
use invoice::Network;

use crate::{DerivationIndex, HardenedIndex, Idx, Xpriv};

/// Script type conventions keyed by hardened path segments.
pub trait ScriptTypeConvention: Sized {
    /// Script type for the purpose segment (the first one of the path).
    fn from_purpose(purpose: HardenedIndex) -> Option<Self>;

    /// Script type for the BIP48 script type segment (the fourth one of a
    /// multisig path).
    fn from_multisig_script(script: HardenedIndex) -> Option<Self>;
}

impl ScriptTypeConvention for ScriptType {
    fn from_purpose(purpose: HardenedIndex) -> Option<Self> {
        Some(match purpose.child_number() {
            44 => ScriptType::P2pkh,
            49 => ScriptType::P2shP2wpkh,
            84 => ScriptType::P2wpkh,
            48 => ScriptType::Multisig,
            45 => ScriptType::P2sh,
            _ => return None,
        })
    }

    fn from_multisig_script(script: HardenedIndex) -> Option<Self> {
        match script.child_number() {
            1 => Some(ScriptType::P2shP2wsh),
            2 => Some(ScriptType::P2wsh),
            _ => None,
        }
    }
}

/// Network for the coin type segment (the second one of the path).
///
/// Coin type `1'` is shared by all test networks, so a key which is already
/// on a test network keeps it.
pub fn network_from_coin_type(coin_type: HardenedIndex, current: Network) -> Option<Network> {
    match coin_type.child_number() {
        0 => Some(Network::Mainnet),
        1 if current.is_testnet() => Some(current),
        1 => Some(Network::Testnet),
        _ => None,
    }
}

impl Xpriv {
    /// Derives a child key, updating its script type and network from the
    /// purpose, coin type and BIP48 script type segments.
    pub fn ckd_priv_conventional(&self, idx: impl Into<DerivationIndex>) -> Xpriv {
        let idx = idx.into();
        let child = self.ckd_priv(idx);
        let DerivationIndex::Hardened(idx) = idx else {
            return child;
        };
        match self.depth() {
            0 => match ScriptType::from_purpose(idx) {
                Some(script_type) => child.with_script_type(script_type),
                None => child,
            },
            1 => match network_from_coin_type(idx, self.network()) {
                Some(network) => child.with_network(network),
                None => child,
            },
            3 if self.script_type() == ScriptType::Multisig => {
                match ScriptType::from_multisig_script(idx) {
                    Some(script_type) => child.with_script_type(script_type),
                    None => child,
                }
            }
            _ => child,
        }
    }

    /// Derives a key along the path applying the conventions at each step.
    pub fn derive_conventional<I: Into<DerivationIndex> + Copy>(
        &self,
        path: impl AsRef<[I]>,
    ) -> Xpriv {
        path.as_ref()
            .iter()
            .fold(self.clone(), |xpriv, idx| xpriv.ckd_priv_conventional(*idx))
    }
}
