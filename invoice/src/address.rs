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

//! Addresses: text representation of the standard output scripts.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bc::{hash160, PublicKey, Script, ScriptType};
use bech32::u5;

use crate::base58::{self, Base58Error};
use crate::Network;

/// Errors creating address from a scriptPubkey or a public key.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum AddressError {
    /// scriptPubkey can't be represented with any known address standard.
    UnsupportedScriptPubkey,

    /// addresses of {0} type can't be constructed from a public key.
    UnsupportedType(ScriptType),

    /// segwit addresses require compressed public key.
    UncompressedKey,
}

/// Errors parsing address strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AddressParseError {
    /// wrong Base58 encoding of address data - {0}
    #[from]
    Base58(Base58Error),

    /// wrong Bech32 encoding of address data - {0}
    #[from]
    Bech32(bech32::Error),

    /// address has an invalid version code {0:#04x}.
    InvalidAddressVersion(u8),

    /// segwit address has an empty data part.
    NoWitnessVersion,

    /// address has an unsupported witness version {0}.
    UnsupportedWitnessVersion(u8),

    /// segwit v0 address has an invalid program length of {0} bytes.
    InvalidProgramLength(usize),

    /// address has an invalid Bech32 variant {0:?}.
    InvalidBech32Variant(bech32::Variant),

    /// unrecognized address format in '{0}'.
    UnrecognizableFormat(String),
}

/// Internal address content: a script or public key hash.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum AddressPayload {
    /// P2PKH payload.
    Pkh([u8; 20]),

    /// P2SH and SegWit nested P2WPKH/WSH-in-P2SH payloads.
    Sh([u8; 20]),

    /// P2WPKH payload.
    Wpkh([u8; 20]),

    /// P2WSH payload.
    Wsh([u8; 32]),
}

impl AddressPayload {
    /// Constructs [`Address`] from the payload.
    pub fn into_address(self, network: Network) -> Address { Address::new(self, network) }

    /// Constructs payload from a given `scriptPubkey`, which must exactly
    /// match one of the standard templates.
    pub fn from_script(script: &Script) -> Result<Self, AddressError> {
        let mut hash20 = [0u8; 20];
        Ok(match script.script_type() {
            ScriptType::P2pkh => {
                hash20.copy_from_slice(&script[3..23]);
                AddressPayload::Pkh(hash20)
            }
            ScriptType::P2sh => {
                hash20.copy_from_slice(&script[2..22]);
                AddressPayload::Sh(hash20)
            }
            ScriptType::P2wpkh => {
                hash20.copy_from_slice(&script[2..22]);
                AddressPayload::Wpkh(hash20)
            }
            ScriptType::P2wsh => {
                let mut hash32 = [0u8; 32];
                hash32.copy_from_slice(&script[2..34]);
                AddressPayload::Wsh(hash32)
            }
            _ => return Err(AddressError::UnsupportedScriptPubkey),
        })
    }

    /// Constructs payload for a single-key script of the given type.
    pub fn from_pubkey(pubkey: &PublicKey, script_type: ScriptType) -> Result<Self, AddressError> {
        if script_type.is_segwit() && !pubkey.is_compressed() {
            return Err(AddressError::UncompressedKey);
        }
        Ok(match script_type {
            ScriptType::P2pkh => AddressPayload::Pkh(pubkey.hash160()),
            ScriptType::P2wpkh => AddressPayload::Wpkh(pubkey.hash160()),
            ScriptType::P2shP2wpkh => {
                AddressPayload::Sh(hash160(Script::p2wpkh(pubkey).as_slice()))
            }
            other => return Err(AddressError::UnsupportedType(other)),
        })
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> Script {
        match self {
            AddressPayload::Pkh(hash) => Script::p2pkh_from_hash(hash),
            AddressPayload::Sh(hash) => Script::p2sh_from_hash(hash),
            AddressPayload::Wpkh(hash) => Script::p2wpkh_from_hash(hash),
            AddressPayload::Wsh(hash) => Script::p2wsh_from_hash(hash),
        }
    }

    /// Detects type of the script the payload is paying to.
    pub fn script_type(self) -> ScriptType {
        match self {
            AddressPayload::Pkh(_) => ScriptType::P2pkh,
            AddressPayload::Sh(_) => ScriptType::P2sh,
            AddressPayload::Wpkh(_) => ScriptType::P2wpkh,
            AddressPayload::Wsh(_) => ScriptType::P2wsh,
        }
    }
}

impl From<AddressPayload> for Script {
    fn from(ap: AddressPayload) -> Self { ap.script_pubkey() }
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Address {
    /// Address payload (see [`AddressPayload`]).
    pub payload: AddressPayload,

    /// Network the address is used in.
    pub network: Network,
}

impl Address {
    pub fn new(payload: AddressPayload, network: Network) -> Self { Address { payload, network } }

    /// Constructs address for a given `scriptPubkey`.
    pub fn with(script: &Script, network: Network) -> Result<Self, AddressError> {
        let payload = AddressPayload::from_script(script)?;
        Ok(Address { payload, network })
    }

    /// Constructs legacy (`P2pkh`), native segwit (`P2wpkh`) or nested segwit
    /// (`P2shP2wpkh`) address of a public key.
    pub fn from_pubkey(
        pubkey: &PublicKey,
        script_type: ScriptType,
        network: Network,
    ) -> Result<Self, AddressError> {
        let payload = AddressPayload::from_pubkey(pubkey, script_type)?;
        Ok(Address { payload, network })
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> Script { self.payload.script_pubkey() }

    /// Returns if the address is testnet-, signet- or regtest-specific.
    pub fn is_testnet(self) -> bool { self.network.is_testnet() }

    pub fn script_type(self) -> ScriptType { self.payload.script_type() }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let params = self.network.params();
        let program = match self.payload {
            AddressPayload::Pkh(hash) | AddressPayload::Sh(hash) => {
                let mut prefixed = [0; 21];
                prefixed[0] = match self.payload {
                    AddressPayload::Pkh(_) => params.p2pkh,
                    _ => params.p2sh,
                };
                prefixed[1..].copy_from_slice(&hash);
                return f.write_str(&base58::encode_check(prefixed));
            }
            AddressPayload::Wpkh(ref hash) => &hash[..],
            AddressPayload::Wsh(ref hash) => &hash[..],
        };

        struct UpperWriter<W: fmt::Write>(W);
        impl<W: fmt::Write> fmt::Write for UpperWriter<W> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                for c in s.chars() {
                    self.0.write_char(c.to_ascii_uppercase())?;
                }
                Ok(())
            }
        }

        let mut upper_writer;
        let writer = if f.alternate() {
            upper_writer = UpperWriter(f);
            &mut upper_writer as &mut dyn fmt::Write
        } else {
            f as &mut dyn fmt::Write
        };
        let mut bech32_writer =
            bech32::Bech32Writer::new(params.bech32_hrp, bech32::Variant::Bech32, writer)?;
        let ver_u5 = u5::try_from_u8(0).expect("witness version 0 is a valid u5");
        bech32::WriteBase32::write_u5(&mut bech32_writer, ver_u5)?;
        bech32::ToBase32::write_base32(&program, &mut bech32_writer)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_base58 = || -> Result<Self, Self::Err> {
            let data = base58::decode_check(s)?;
            if data.len() != 21 {
                return Err(Base58Error::InvalidLength(data.len()).into());
            }
            let (network, script) = Network::with_address_version(data[0])
                .ok_or(AddressParseError::InvalidAddressVersion(data[0]))?;
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&data[1..]);
            let payload = if script { AddressPayload::Sh(hash) } else { AddressPayload::Pkh(hash) };
            Ok(Address::new(payload, network))
        };

        let parse_bech32 =
            |network: Network, data: Vec<u5>, variant: bech32::Variant| -> Result<Self, Self::Err> {
                let (version, program) =
                    data.split_first().ok_or(AddressParseError::NoWitnessVersion)?;
                if version.to_u8() != 0 {
                    return Err(AddressParseError::UnsupportedWitnessVersion(version.to_u8()));
                }
                if variant != bech32::Variant::Bech32 {
                    return Err(AddressParseError::InvalidBech32Variant(variant));
                }
                let program: Vec<u8> = bech32::FromBase32::from_base32(program)?;
                let payload = match program.len() {
                    20 => {
                        let mut hash = [0u8; 20];
                        hash.copy_from_slice(&program);
                        AddressPayload::Wpkh(hash)
                    }
                    32 => {
                        let mut hash = [0u8; 32];
                        hash.copy_from_slice(&program);
                        AddressPayload::Wsh(hash)
                    }
                    len => return Err(AddressParseError::InvalidProgramLength(len)),
                };
                Ok(Address::new(payload, network))
            };

        match bech32::decode(s) {
            Ok((hrp, data, variant)) => match Network::with_bech32_hrp(&hrp) {
                Some(network) => parse_bech32(network, data, variant),
                None => parse_base58(),
            },
            Err(_) => parse_base58().map_err(|err| match err {
                AddressParseError::Base58(Base58Error::Decode(_)) => {
                    AddressParseError::UnrecognizableFormat(s.to_owned())
                }
                err => err,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GENERATOR: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn generator() -> PublicKey { PublicKey::from_str(GENERATOR).unwrap() }

    #[test]
    fn pubkey_addresses() {
        let pk = generator();
        let addr = |ty, network| Address::from_pubkey(&pk, ty, network).unwrap().to_string();
        assert_eq!(addr(ScriptType::P2pkh, Network::Mainnet), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(addr(ScriptType::P2pkh, Network::Testnet), "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r");
        assert_eq!(
            addr(ScriptType::P2wpkh, Network::Mainnet),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
        assert_eq!(
            addr(ScriptType::P2wpkh, Network::Regtest),
            "bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080"
        );
        assert_eq!(
            addr(ScriptType::P2shP2wpkh, Network::Mainnet),
            "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN"
        );
        assert_eq!(
            addr(ScriptType::P2shP2wpkh, Network::Signet),
            "2NAUYAHhujozruyzpsFRP63mbrdaU5wnEpN"
        );
        assert_eq!(
            Address::from_pubkey(&pk, ScriptType::P2wsh, Network::Mainnet),
            Err(AddressError::UnsupportedType(ScriptType::P2wsh))
        );
    }

    #[test]
    fn uppercase() {
        let addr = Address::from_pubkey(&generator(), ScriptType::P2wpkh, Network::Mainnet).unwrap();
        assert_eq!(format!("{addr:#}"), "BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4");
        assert_eq!(Address::from_str("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4"), Ok(addr));
    }

    #[test]
    fn parse_and_script() {
        let mut witness_script = Script::new();
        witness_script.push_pubkey(&generator()).unwrap();
        witness_script.push_opcode(bc::OpCode::CheckSig).unwrap();
        let spk = Script::p2wsh(&witness_script);

        let s = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
        let addr = Address::from_str(s).unwrap();
        assert_eq!(addr.network, Network::Mainnet);
        assert_eq!(addr.script_type(), ScriptType::P2wsh);
        assert_eq!(addr.script_pubkey(), spk);
        assert_eq!(Address::with(&spk, Network::Mainnet), Ok(addr));
        assert_eq!(addr.to_string(), s);

        let addr = Address::from_str("2NAUYAHhujozruyzpsFRP63mbrdaU5wnEpN").unwrap();
        assert_eq!(addr.network, Network::Testnet);
        assert_eq!(addr.script_type(), ScriptType::P2sh);
        assert!(addr.is_testnet());
    }

    #[test]
    fn parse_failures() {
        assert_eq!(
            Address::with(&Script::new(), Network::Mainnet),
            Err(AddressError::UnsupportedScriptPubkey)
        );
        assert!(matches!(
            Address::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5"),
            Err(AddressParseError::UnrecognizableFormat(_))
        ));
        assert!(matches!(
            Address::from_str("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMh"),
            Err(AddressParseError::UnrecognizableFormat(_))
        ));
        assert_eq!(
            Address::from_str(&base58::encode_check([0; 20])),
            Err(AddressParseError::Base58(Base58Error::InvalidLength(20)))
        );
        let no_version = base58::encode_check([0x30; 21]);
        assert_eq!(
            Address::from_str(&no_version),
            Err(AddressParseError::InvalidAddressVersion(0x30))
        );
    }
}
