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

use std::str::FromStr;

use bc::ScriptType;

/// Pair of BIP32 extended key version prefixes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct XkeyVersions {
    pub private: [u8; 4],
    pub public: [u8; 4],
}

impl XkeyVersions {
    const fn from_u32(private: u32, public: u32) -> Self {
        XkeyVersions {
            private: private.to_be_bytes(),
            public: public.to_be_bytes(),
        }
    }
}

/// Script types matching SLIP-132 extended key version slots, in the order
/// of `xprv`, `yprv`, `zprv`, `Yprv` and `Zprv` prefixes. Keys of any other
/// script type use the first slot.
pub const XKEY_SCRIPT_TYPES: [ScriptType; 5] = [
    ScriptType::Unknown,
    ScriptType::P2shP2wpkh,
    ScriptType::P2wpkh,
    ScriptType::P2shP2wsh,
    ScriptType::P2wsh,
];

/// Immutable per-chain constants.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct NetworkParams {
    pub name: &'static str,
    /// Version byte of P2PKH base58 addresses.
    pub p2pkh: u8,
    /// Version byte of P2SH base58 addresses.
    pub p2sh: u8,
    pub bech32_hrp: &'static str,
    /// Version byte of WIF private keys.
    pub wif: u8,
    /// Extended key versions, one pair per [`XKEY_SCRIPT_TYPES`] slot.
    pub xkey: [XkeyVersions; 5],
    /// BIP44 coin type.
    pub coin_type: u32,
}

impl NetworkParams {
    /// Extended key versions used for keys of the given script type.
    pub fn xkey_versions(&self, script_type: ScriptType) -> XkeyVersions {
        let slot = XKEY_SCRIPT_TYPES
            .iter()
            .position(|ty| *ty == script_type)
            .unwrap_or_default();
        self.xkey[slot]
    }
}

const MAINNET_XKEY: [XkeyVersions; 5] = [
    XkeyVersions::from_u32(0x0488ade4, 0x0488b21e),
    XkeyVersions::from_u32(0x049d7878, 0x049d7cb2),
    XkeyVersions::from_u32(0x04b2430c, 0x04b24746),
    XkeyVersions::from_u32(0x0295b005, 0x0295b43f),
    XkeyVersions::from_u32(0x02aa7a99, 0x02aa7ed3),
];

const TESTNET_XKEY: [XkeyVersions; 5] = [
    XkeyVersions::from_u32(0x04358394, 0x043587cf),
    XkeyVersions::from_u32(0x044a4e28, 0x044a5262),
    XkeyVersions::from_u32(0x045f18bc, 0x045f1cf6),
    XkeyVersions::from_u32(0x024285b5, 0x024289ef),
    XkeyVersions::from_u32(0x02575048, 0x02575483),
];

static MAINNET: NetworkParams = NetworkParams {
    name: "bitcoin",
    p2pkh: 0x00,
    p2sh: 0x05,
    bech32_hrp: "bc",
    wif: 0x80,
    xkey: MAINNET_XKEY,
    coin_type: 0,
};

static TESTNET: NetworkParams = NetworkParams {
    name: "testnet",
    p2pkh: 0x6f,
    p2sh: 0xc4,
    bech32_hrp: "tb",
    wif: 0xef,
    xkey: TESTNET_XKEY,
    coin_type: 1,
};

static REGTEST: NetworkParams = NetworkParams {
    name: "regtest",
    p2pkh: 0x6f,
    p2sh: 0xc4,
    bech32_hrp: "bcrt",
    wif: 0xef,
    xkey: TESTNET_XKEY,
    coin_type: 1,
};

static SIGNET: NetworkParams = NetworkParams {
    name: "signet",
    p2pkh: 0x6f,
    p2sh: 0xc4,
    bech32_hrp: "tb",
    wif: 0xef,
    xkey: TESTNET_XKEY,
    coin_type: 1,
};

/// Bitcoin network
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum Network {
    /// Bitcoin mainnet
    #[default]
    #[display("bitcoin")]
    Mainnet,

    /// Bitcoin testnet3
    Testnet,

    /// Bitcoin regtest networks
    Regtest,

    /// Bitcoin signet
    Signet,
}

impl Network {
    /// All known networks. Networks sharing the same prefixes are detected as
    /// the first one in this list.
    pub const ALL: [Network; 4] =
        [Network::Mainnet, Network::Testnet, Network::Regtest, Network::Signet];

    pub fn params(self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Testnet => &TESTNET,
            Network::Regtest => &REGTEST,
            Network::Signet => &SIGNET,
        }
    }

    /// Detects whether the network is a kind of test network (testnet, signet,
    /// regtest).
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    fn detect(f: impl Fn(&NetworkParams) -> bool) -> Option<Network> {
        Self::ALL.into_iter().find(|network| f(network.params()))
    }

    /// Detects network from a base58 address version byte, returning whether
    /// it is a script hash version.
    pub fn with_address_version(version: u8) -> Option<(Network, bool)> {
        Self::detect(|p| p.p2pkh == version)
            .map(|network| (network, false))
            .or_else(|| Self::detect(|p| p.p2sh == version).map(|network| (network, true)))
    }

    /// Detects network from a bech32 human-readable part.
    pub fn with_bech32_hrp(hrp: &str) -> Option<Network> {
        Self::detect(|p| p.bech32_hrp.eq_ignore_ascii_case(hrp))
    }

    pub fn with_wif_version(version: u8) -> Option<Network> { Self::detect(|p| p.wif == version) }

    /// Detects network, script type and key kind (`true` for private keys)
    /// from an extended key version prefix.
    pub fn with_xkey_version(version: [u8; 4]) -> Option<(Network, ScriptType, bool)> {
        Self::ALL.into_iter().find_map(|network| {
            network
                .params()
                .xkey
                .iter()
                .zip(XKEY_SCRIPT_TYPES)
                .find_map(|(versions, script_type)| {
                    if versions.private == version {
                        Some((network, script_type, true))
                    } else if versions.public == version {
                        Some((network, script_type, false))
                    } else {
                        None
                    }
                })
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown bitcoin network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bitcoin" | "mainnet" => Network::Mainnet,
            "testnet" | "testnet3" => Network::Testnet,
            "regtest" => Network::Regtest,
            "signet" => Network::Signet,
            other => return Err(UnknownNetwork(other.to_owned())),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        for network in Network::ALL {
            assert_eq!(network.to_string(), network.params().name);
            assert_eq!(Network::from_str(network.params().name), Ok(network));
        }
        assert_eq!(Network::from_str("mainnet"), Ok(Network::Mainnet));
        assert_eq!(Network::from_str("liquid"), Err(UnknownNetwork(s!("liquid"))));
    }

    #[test]
    fn detection() {
        assert_eq!(Network::with_address_version(0x05), Some((Network::Mainnet, true)));
        assert_eq!(Network::with_address_version(0x6f), Some((Network::Testnet, false)));
        assert_eq!(Network::with_address_version(0x30), None);
        assert_eq!(Network::with_bech32_hrp("bcrt"), Some(Network::Regtest));
        assert_eq!(Network::with_bech32_hrp("TB"), Some(Network::Testnet));
        assert_eq!(Network::with_wif_version(0xef), Some(Network::Testnet));
        assert_eq!(Network::with_wif_version(0x00), None);
    }

    #[test]
    fn xkey_versions() {
        let zpub = Network::Mainnet.params().xkey_versions(ScriptType::P2wpkh).public;
        assert_eq!(zpub, [0x04, 0xb2, 0x47, 0x46]);
        assert_eq!(
            Network::with_xkey_version(zpub),
            Some((Network::Mainnet, ScriptType::P2wpkh, false))
        );
        let tprv = Network::Signet.params().xkey_versions(ScriptType::P2pkh).private;
        assert_eq!(
            Network::with_xkey_version(tprv),
            Some((Network::Testnet, ScriptType::Unknown, true))
        );
        assert_eq!(Network::with_xkey_version([0; 4]), None);
    }
}
