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

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bc::PrivateKey;
use zeroize::Zeroizing;

use crate::base58::{self, Base58Error};
use crate::Network;

/// Errors parsing WIF private keys.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum WifError {
    /// invalid base58 encoding of WIF key - {0}
    #[from]
    Base58(Base58Error),

    /// WIF key has invalid length of {0} bytes.
    InvalidLength(usize),

    /// WIF key has unknown version byte {0:#04x}.
    InvalidVersion(u8),

    /// WIF key has invalid compression flag {0:#04x}.
    InvalidCompressionFlag(u8),

    /// WIF key contains invalid secret scalar.
    InvalidSecret,
}

/// Private key in wallet import format: version byte, 32-byte secret, an
/// optional `0x01` compression flag and base58 checksum.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Wif {
    pub key: PrivateKey,
    pub network: Network,
}

impl Wif {
    pub fn new(key: PrivateKey, network: Network) -> Self { Wif { key, network } }

    pub fn into_key(self) -> PrivateKey { self.key }
}

impl Display for Wif {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut data = Zeroizing::new(Vec::with_capacity(34));
        data.push(self.network.params().wif);
        data.extend_from_slice(self.key.secret_bytes().as_ref());
        if self.key.is_compressed() {
            data.push(0x01);
        }
        f.write_str(&base58::encode_check(data.as_slice()))
    }
}

impl FromStr for Wif {
    type Err = WifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Zeroizing::new(base58::decode_check(s)?);
        let compressed = match data.len() {
            33 => false,
            34 if data[33] == 0x01 => true,
            34 => return Err(WifError::InvalidCompressionFlag(data[33])),
            len => return Err(WifError::InvalidLength(len)),
        };
        let network = Network::with_wif_version(data[0]).ok_or(WifError::InvalidVersion(data[0]))?;
        let key =
            PrivateKey::from_slice(&data[1..33], compressed).map_err(|_| WifError::InvalidSecret)?;
        Ok(Wif { key, network })
    }
}
