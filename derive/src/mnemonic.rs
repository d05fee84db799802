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

//! BIP39 mnemonic phrases and their stretching into BIP32 seeds.

use bip39::Mnemonic;
use invoice::Network;
use zeroize::Zeroizing;

use crate::Xpriv;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum MnemonicError {
    /// invalid mnemonic - {0}
    #[from]
    Bip39(bip39::Error),
}

/// Parses English mnemonic phrase. Words are matched case-insensitively and
/// may be separated by any whitespace.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, MnemonicError> {
    let normalized =
        Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase());
    Mnemonic::parse_normalized(&normalized).map_err(|err| {
        debug!("mnemonic rejected: {err}");
        MnemonicError::from(err)
    })
}

/// Checks the word list and the checksum of the phrase.
pub fn validate_mnemonic(phrase: &str) -> bool { parse_mnemonic(phrase).is_ok() }

/// Computes 64-byte BIP39 seed from the phrase and the passphrase.
pub fn mnemonic_to_seed(
    phrase: &str,
    passphrase: &str,
) -> Result<Zeroizing<[u8; 64]>, MnemonicError> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed_normalized(passphrase)))
}

/// Generates English mnemonic for 16, 20, 24, 28 or 32 bytes of entropy.
pub fn mnemonic_from_entropy(entropy: &[u8]) -> Result<String, MnemonicError> {
    let mnemonic = Mnemonic::from_entropy(entropy)?;
    Ok(mnemonic.to_string())
}

impl Xpriv {
    /// Constructs master key from a mnemonic phrase and a passphrase.
    pub fn from_mnemonic(
        phrase: &str,
        passphrase: &str,
        network: Network,
    ) -> Result<Xpriv, MnemonicError> {
        let seed = mnemonic_to_seed(phrase, passphrase)?;
        Ok(Xpriv::new_master(network, seed.as_slice()))
    }
}
