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

use amplify::{hex, Bytes20, Bytes32, Bytes4, Wrapper};
use bc::secp256k1::{Scalar, SecretKey, SECP256K1};
use bc::{
    hash160, hmac_sha512, ByteSource, DecodeError, FixedReader, PrivateKey, PublicKey, ScriptType,
    StreamDecode,
};
use invoice::base58::{self, Base58Error};
use invoice::{Address, AddressError, Network};
use zeroize::Zeroizing;

use crate::{DerivationIndex, DerivationParseError, DerivationPath, Idx, NormalIndex};

/// Length of the binary extended key serialization.
pub const XKEY_LEN: usize = 78;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum XkeyDecodeError {
    /// wrong length of extended key data ({0}).
    WrongExtendedKeyLength(usize),

    /// provided key is not a standard BIP-32 extended key (version {0:02x?}).
    UnknownKeyType([u8; 4]),

    /// version {0:02x?} belongs to the other kind of extended key (private
    /// instead of public or vice versa).
    KeyKindMismatch([u8; 4]),

    /// extended public key contains invalid compressed point.
    InvalidPubkey,

    /// xpriv contains invalid byte for the secret key type ({0:#04x}) which must be set to zero.
    InvalidType(u8),

    /// xpriv contains invalid data with secret key value overflowing over field order.
    InvalidSecretKey,

    /// master key (depth 0) has non-zero parent fingerprint or child number.
    InvalidMasterKey,

    /// {0}
    #[from]
    Stream(DecodeError),
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum XkeyParseError {
    /// wrong Base58 encoding of extended key data - {0}
    #[from]
    Base58(Base58Error),

    #[display(inner)]
    #[from]
    Decode(XkeyDecodeError),

    #[display(inner)]
    #[from]
    DerivationPath(DerivationParseError),

    /// invalid master key fingerprint - {0}
    #[from]
    InvalidMasterFp(hex::Error),
}

/// BIP32 chain code used for hierarchical derivation
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, RangeOps)]
pub struct ChainCode(Bytes32);

impl AsRef<[u8]> for ChainCode {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl From<[u8; 32]> for ChainCode {
    fn from(value: [u8; 32]) -> Self { Self(value.into()) }
}

impl From<ChainCode> for [u8; 32] {
    fn from(value: ChainCode) -> Self { value.0.into_inner() }
}

/// Deterministic part of the extended public key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct XpubCore {
    /// Public key
    pub public_key: PublicKey,
    /// BIP32 chain code used for hierarchical derivation
    pub chain_code: ChainCode,
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct XpubFp(
    #[from]
    #[from([u8; 4])]
    Bytes4,
);

impl AsRef<[u8]> for XpubFp {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl From<XpubFp> for [u8; 4] {
    fn from(value: XpubFp) -> Self { value.0.into_inner() }
}

impl XpubFp {
    pub const fn master() -> Self { Self(Bytes4::zero()) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct XpubId(
    #[from]
    #[from([u8; 20])]
    Bytes20,
);

impl AsRef<[u8]> for XpubId {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl XpubId {
    pub fn fingerprint(&self) -> XpubFp {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[..4]);
        XpubFp::from(bytes)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct XkeyMeta {
    pub depth: u8,
    pub parent_fp: XpubFp,
    pub child_number: DerivationIndex,
}

/// Fields common to both extended key kinds, in the order of their binary
/// serialization.
struct XkeyHeader {
    network: Network,
    script_type: ScriptType,
    private: bool,
    meta: XkeyMeta,
    chain_code: ChainCode,
}

impl XkeyHeader {
    fn decode(data: &[u8]) -> Result<Self, XkeyDecodeError> {
        if data.len() != XKEY_LEN {
            return Err(XkeyDecodeError::WrongExtendedKeyLength(data.len()));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let (network, script_type, private) = Network::with_xkey_version(version)
            .ok_or(XkeyDecodeError::UnknownKeyType(version))?;

        let depth = data[4];

        let mut parent_fp = [0u8; 4];
        parent_fp.copy_from_slice(&data[5..9]);

        let mut child_number = [0u8; 4];
        child_number.copy_from_slice(&data[9..13]);
        let child_number = u32::from_be_bytes(child_number);

        if depth == 0 && (parent_fp != [0u8; 4] || child_number != 0) {
            return Err(XkeyDecodeError::InvalidMasterKey);
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        Ok(XkeyHeader {
            network,
            script_type,
            private,
            meta: XkeyMeta {
                depth,
                parent_fp: parent_fp.into(),
                child_number: child_number.into(),
            },
            chain_code: chain_code.into(),
        })
    }

    fn encode(&self, buf: &mut [u8; XKEY_LEN]) {
        let versions = self.network.params().xkey_versions(self.script_type);
        buf[0..4].copy_from_slice(&match self.private {
            true => versions.private,
            false => versions.public,
        });
        buf[4] = self.meta.depth;
        buf[5..9].copy_from_slice(self.meta.parent_fp.as_ref());
        buf[9..13].copy_from_slice(&self.meta.child_number.to_be_bytes());
        buf[13..45].copy_from_slice(self.chain_code.as_ref());
    }

    fn version(data: &[u8]) -> [u8; 4] {
        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        version
    }
}

/// Extended public key.
///
/// Along with the key data it carries the network and the script type, which
/// select the SLIP-132 version prefix of the serialization. Both are
/// inherited by the derived children.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Xpub {
    network: Network,
    script_type: ScriptType,
    meta: XkeyMeta,
    core: XpubCore,
}

impl Xpub {
    pub fn decode(data: impl AsRef<[u8]>) -> Result<Xpub, XkeyDecodeError> {
        let data = data.as_ref();
        let header = XkeyHeader::decode(data)?;
        if header.private {
            return Err(XkeyDecodeError::KeyKindMismatch(XkeyHeader::version(data)));
        }
        let public_key =
            PublicKey::from_slice(&data[45..78]).map_err(|_| XkeyDecodeError::InvalidPubkey)?;

        Ok(Xpub {
            network: header.network,
            script_type: header.script_type,
            meta: header.meta,
            core: XpubCore {
                public_key,
                chain_code: header.chain_code,
            },
        })
    }

    pub fn encode(&self) -> [u8; XKEY_LEN] {
        let mut ret = [0; XKEY_LEN];
        XkeyHeader {
            network: self.network,
            script_type: self.script_type,
            private: false,
            meta: self.meta,
            chain_code: self.core.chain_code,
        }
        .encode(&mut ret);
        ret[45..78].copy_from_slice(&self.core.public_key.to_compressed_bytes());
        ret
    }

    pub fn network(&self) -> Network { self.network }

    pub fn script_type(&self) -> ScriptType { self.script_type }

    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    #[must_use]
    pub fn with_script_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = script_type;
        self
    }

    pub fn depth(&self) -> u8 { self.meta.depth }

    pub fn child_number(&self) -> DerivationIndex { self.meta.child_number }

    pub fn parent_fp(&self) -> XpubFp { self.meta.parent_fp }

    pub fn chain_code(&self) -> ChainCode { self.core.chain_code }

    pub fn public_key(&self) -> PublicKey { self.core.public_key }

    /// Key material without metadata; keys with equal cores derive the same
    /// children.
    pub fn core(&self) -> XpubCore { self.core }

    /// Returns the HASH160 of the public key
    pub fn identifier(&self) -> XpubId {
        XpubId::from(hash160(self.core.public_key.to_compressed_bytes()))
    }

    pub fn fingerprint(&self) -> XpubFp { self.identifier().fingerprint() }

    /// Address of the key for its script type; keys of unknown type produce
    /// legacy P2PKH addresses.
    pub fn address(&self) -> Result<Address, AddressError> {
        key_address(&self.core.public_key, self.script_type, self.network)
    }

    /// Public->Public child key derivation
    ///
    /// # Panics
    ///
    /// If the child key is invalid, i.e. the tweak is not below the curve
    /// order or the resulting point is at infinity. The probability of this
    /// is below 2^-127; use [`Xpub::try_ckd_pub`] to skip such children.
    pub fn ckd_pub(&self, child_no: NormalIndex) -> Xpub {
        self.try_ckd_pub(child_no).expect("negligible probability")
    }

    /// Public->Public child key derivation returning `None` for an invalid
    /// child, in which case BIP32 proceeds with the next index.
    pub fn try_ckd_pub(&self, child_no: NormalIndex) -> Option<Xpub> {
        let hmac = hmac_sha512(self.core.chain_code.as_ref(), &[
            &self.core.public_key.to_compressed_bytes(),
            &child_no.to_be_bytes(),
        ]);
        let tweak = SecretKey::from_slice(&hmac[..32]).ok()?;
        let tweaked = self
            .core
            .public_key
            .inner()
            .add_exp_tweak(SECP256K1, &Scalar::from(tweak))
            .ok()?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac[32..]);

        Some(Xpub {
            network: self.network,
            script_type: self.script_type,
            meta: XkeyMeta {
                depth: self.meta.depth.saturating_add(1),
                parent_fp: self.fingerprint(),
                child_number: child_no.into(),
            },
            core: XpubCore {
                public_key: PublicKey::compressed(tweaked),
                chain_code: chain_code.into(),
            },
        })
    }

    /// Derives an extended public key from a path of unhardened indexes.
    pub fn derive_pub(&self, path: impl AsRef<[NormalIndex]>) -> Self {
        path.as_ref()
            .iter()
            .fold(*self, |xpub, idx| xpub.ckd_pub(*idx))
    }

    /// Derives an extended public key from a path string; fails on hardened
    /// segments.
    pub fn derive_str(&self, path: &str) -> Result<Self, XkeyParseError> {
        let path = DerivationPath::<NormalIndex>::from_str(path)?;
        Ok(self.derive_pub(path))
    }
}

impl Display for Xpub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&base58::encode_check(self.encode()))
    }
}

impl FromStr for Xpub {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Xpub, XkeyParseError> {
        let data = base58::decode_check(inp)?;
        Ok(Xpub::decode(data)?)
    }
}

/// Extended private key; the secret is wiped when the key is dropped.
#[derive(Clone, Eq, PartialEq)]
pub struct Xpriv {
    network: Network,
    script_type: ScriptType,
    meta: XkeyMeta,
    chain_code: ChainCode,
    private_key: PrivateKey,
}

impl Debug for Xpriv {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xpriv")
            .field("network", &self.network)
            .field("script_type", &self.script_type)
            .field("meta", &self.meta)
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

impl Xpriv {
    /// Constructs master key from a seed.
    ///
    /// # Panics
    ///
    /// If the seed hashes to an invalid secret key, with a probability below
    /// 2^-127.
    pub fn new_master(network: Network, seed: &[u8]) -> Xpriv {
        let hmac = hmac_sha512(b"Bitcoin seed", &[seed]);
        let private_key = PrivateKey::from_slice(&hmac[..32], true).expect("negligible probability");
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac[32..]);

        Xpriv {
            network,
            script_type: ScriptType::Unknown,
            meta: XkeyMeta::default(),
            chain_code: chain_code.into(),
            private_key,
        }
    }

    pub fn decode(data: impl AsRef<[u8]>) -> Result<Xpriv, XkeyDecodeError> {
        let data = data.as_ref();
        let header = XkeyHeader::decode(data)?;
        if !header.private {
            return Err(XkeyDecodeError::KeyKindMismatch(XkeyHeader::version(data)));
        }
        if data[45] != 0x00 {
            return Err(XkeyDecodeError::InvalidType(data[45]));
        }
        let private_key = PrivateKey::from_slice(&data[46..78], true)
            .map_err(|_| XkeyDecodeError::InvalidSecretKey)?;

        Ok(Xpriv {
            network: header.network,
            script_type: header.script_type,
            meta: header.meta,
            chain_code: header.chain_code,
            private_key,
        })
    }

    pub fn encode(&self) -> Zeroizing<[u8; XKEY_LEN]> {
        let mut ret = Zeroizing::new([0; XKEY_LEN]);
        XkeyHeader {
            network: self.network,
            script_type: self.script_type,
            private: true,
            meta: self.meta,
            chain_code: self.chain_code,
        }
        .encode(&mut ret);
        ret[45] = 0;
        ret[46..78].copy_from_slice(self.private_key.secret_bytes().as_ref());
        ret
    }

    pub fn network(&self) -> Network { self.network }

    pub fn script_type(&self) -> ScriptType { self.script_type }

    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    #[must_use]
    pub fn with_script_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = script_type;
        self
    }

    pub fn depth(&self) -> u8 { self.meta.depth }

    pub fn child_number(&self) -> DerivationIndex { self.meta.child_number }

    pub fn parent_fp(&self) -> XpubFp { self.meta.parent_fp }

    pub fn chain_code(&self) -> ChainCode { self.chain_code }

    pub fn private_key(&self) -> &PrivateKey { &self.private_key }

    pub fn public_key(&self) -> PublicKey { self.private_key.public_key() }

    pub fn fingerprint(&self) -> XpubFp { self.identifier().fingerprint() }

    pub fn identifier(&self) -> XpubId {
        XpubId::from(hash160(self.public_key().to_compressed_bytes()))
    }

    pub fn to_xpub(&self) -> Xpub {
        Xpub {
            network: self.network,
            script_type: self.script_type,
            meta: self.meta,
            core: XpubCore {
                public_key: self.public_key(),
                chain_code: self.chain_code,
            },
        }
    }

    /// Address of the key for its script type; keys of unknown type produce
    /// legacy P2PKH addresses.
    pub fn address(&self) -> Result<Address, AddressError> {
        key_address(&self.public_key(), self.script_type, self.network)
    }

    /// Private->Private child key derivation
    ///
    /// # Panics
    ///
    /// If the child key is invalid, i.e. the tweak is not below the curve
    /// order or the child secret is zero. The probability of this is below
    /// 2^-127; use [`Xpriv::try_ckd_priv`] to skip such children.
    pub fn ckd_priv(&self, idx: impl Into<DerivationIndex>) -> Xpriv {
        self.try_ckd_priv(idx).expect("negligible probability")
    }

    /// Private->Private child key derivation returning `None` for an invalid
    /// child, in which case BIP32 proceeds with the next index.
    pub fn try_ckd_priv(&self, idx: impl Into<DerivationIndex>) -> Option<Xpriv> {
        let idx = idx.into();
        let index = idx.to_be_bytes();
        let hmac = match idx {
            DerivationIndex::Normal(_) => {
                // Non-hardened key: compute public data and use that
                let pubkey = self.public_key().to_compressed_bytes();
                hmac_sha512(self.chain_code.as_ref(), &[&pubkey, &index])
            }
            DerivationIndex::Hardened(_) => {
                // Hardened key: use only secret data to prevent public derivation
                let secret = self.private_key.secret_bytes();
                hmac_sha512(self.chain_code.as_ref(), &[&[0u8], &secret[..], &index])
            }
        };
        let tweak = SecretKey::from_slice(&hmac[..32]).ok()?;
        let secret = self.private_key.secret().add_tweak(&Scalar::from(tweak)).ok()?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac[32..]);

        Some(Xpriv {
            network: self.network,
            script_type: self.script_type,
            meta: XkeyMeta {
                depth: self.meta.depth.saturating_add(1),
                parent_fp: self.fingerprint(),
                child_number: idx,
            },
            chain_code: chain_code.into(),
            private_key: PrivateKey::new(secret, true),
        })
    }

    /// Derives an extended private key from a path.
    pub fn derive_priv<I: Into<DerivationIndex> + Copy>(&self, path: impl AsRef<[I]>) -> Xpriv {
        let mut xpriv = self.clone();
        for idx in path.as_ref() {
            xpriv = xpriv.ckd_priv(*idx);
        }
        xpriv
    }

    /// Derives an extended private key from a path string like
    /// `m/84h/0h/0h/0/1`.
    pub fn derive_str(&self, path: &str) -> Result<Xpriv, DerivationParseError> {
        let path = DerivationPath::<DerivationIndex>::from_str(path)?;
        Ok(self.derive_priv(path))
    }
}

impl Display for Xpriv {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = Zeroizing::new(base58::encode_check(self.encode().as_slice()));
        f.write_str(&s)
    }
}

impl FromStr for Xpriv {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Xpriv, XkeyParseError> {
        let data = Zeroizing::new(base58::decode_check(inp)?);
        Ok(Xpriv::decode(data.as_slice())?)
    }
}

fn key_address(
    pubkey: &PublicKey,
    script_type: ScriptType,
    network: Network,
) -> Result<Address, AddressError> {
    let script_type = match script_type {
        ScriptType::Unknown => ScriptType::P2pkh,
        other => other,
    };
    Address::from_pubkey(pubkey, script_type, network)
}

/// Incremental decoder state of the 78-byte extended key serialization. The
/// buffer is wiped once the key is decoded or the parser is reset.
#[derive(Debug, Default)]
pub struct XkeyState(FixedReader<XKEY_LEN>);

impl StreamDecode for Xpub {
    type State = XkeyState;
    type Error = XkeyDecodeError;

    fn decode_step(
        state: &mut XkeyState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, XkeyDecodeError> {
        if !state.0.feed(src)? {
            return Ok(None);
        }
        Xpub::decode(state.0.as_bytes()).map(Some)
    }
}

impl StreamDecode for Xpriv {
    type State = XkeyState;
    type Error = XkeyDecodeError;

    fn decode_step(
        state: &mut XkeyState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, XkeyDecodeError> {
        if !state.0.feed(src)? {
            return Ok(None);
        }
        let res = Xpriv::decode(state.0.as_bytes()).map(Some);
        state.0.reset();
        res
    }
}

/// Origin of a key: fingerprint of the master key and the derivation path
/// from it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct KeyOrigin {
    master_fp: XpubFp,
    derivation: DerivationPath,
}

impl KeyOrigin {
    pub fn new(master_fp: XpubFp, derivation: DerivationPath) -> Self {
        KeyOrigin {
            master_fp,
            derivation,
        }
    }

    pub const fn master_fp(&self) -> XpubFp { self.master_fp }

    pub fn derivation(&self) -> &DerivationPath { &self.derivation }
}

impl Display for KeyOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.master_fp, f)?;
        for segment in &self.derivation {
            f.write_str("/")?;
            Display::fmt(&segment, f)?;
        }
        Ok(())
    }
}

impl FromStr for KeyOrigin {
    type Err = XkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (master_fp, path) = match s.split_once('/') {
            None => (s, ""),
            Some(split) => split,
        };
        let master_fp = match master_fp {
            "" | "m" => XpubFp::master(),
            fp => XpubFp::from_str(fp)?,
        };
        Ok(KeyOrigin {
            master_fp,
            derivation: DerivationPath::from_str(path)?,
        })
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;
    use bc::{parse_bytes, Parser};

    use super::*;
    use crate::HardenedIndex;

    const TV1_M: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const TV1_M_0H: &str = "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw";

    fn master() -> Xpriv { Xpriv::from_str(TV1_M).unwrap() }

    #[test]
    fn roundtrip() {
        let xpriv = master();
        assert_eq!(xpriv.depth(), 0);
        assert_eq!(xpriv.network(), Network::Mainnet);
        assert_eq!(xpriv.script_type(), ScriptType::Unknown);
        assert_eq!(xpriv.fingerprint().to_string(), "3442193e");
        assert_eq!(xpriv.to_string(), TV1_M);

        let xpub = Xpub::from_str(TV1_M_0H).unwrap();
        assert_eq!(xpub.to_string(), TV1_M_0H);
        assert_eq!(xpub.parent_fp(), xpriv.fingerprint());
        assert_eq!(xpub.child_number(), DerivationIndex::hardened(0));
    }

    #[test]
    fn master_invariant() {
        let mut data = *master().encode();
        data[12] = 1;
        assert_eq!(Xpriv::decode(data), Err(XkeyDecodeError::InvalidMasterKey));
        data[12] = 0;
        data[45] = 1;
        assert_eq!(Xpriv::decode(data), Err(XkeyDecodeError::InvalidType(1)));
    }

    #[test]
    fn kind_mismatch() {
        let data = master().encode();
        assert_eq!(
            Xpub::decode(data.as_slice()),
            Err(XkeyDecodeError::KeyKindMismatch([0x04, 0x88, 0xad, 0xe4]))
        );
        assert_eq!(
            Xpub::decode(&data[..77]),
            Err(XkeyDecodeError::WrongExtendedKeyLength(77))
        );
        let mut data = *data;
        data[0] = 0xff;
        assert_eq!(
            Xpriv::decode(data),
            Err(XkeyDecodeError::UnknownKeyType([0xff, 0x88, 0xad, 0xe4]))
        );
    }

    #[test]
    fn slip132() {
        let xpub = master().to_xpub().with_script_type(ScriptType::P2wpkh);
        let s = xpub.to_string();
        assert!(s.starts_with("zpub"));
        let parsed = Xpub::from_str(&s).unwrap();
        assert_eq!(parsed.script_type(), ScriptType::P2wpkh);
        assert_eq!(parsed.core(), xpub.core());

        let tpriv = master().with_network(Network::Regtest);
        assert!(tpriv.to_string().starts_with("tprv"));
        assert_eq!(Xpriv::from_str(&tpriv.to_string()).unwrap().network(), Network::Testnet);
    }

    #[test]
    fn public_derivation() {
        let xpriv = master().derive_str("m/0h/1").unwrap();
        let xpub = xpriv.to_xpub();
        let child = xpriv.ckd_priv(NormalIndex::normal(7)).to_xpub();
        assert_eq!(xpub.ckd_pub(NormalIndex::normal(7)), child);
        assert_eq!(xpub.derive_str("7").unwrap(), child);
        assert!(matches!(xpub.derive_str("m/7h"), Err(XkeyParseError::DerivationPath(_))));
        assert_eq!(master().ckd_priv(HardenedIndex::hardened(0)).to_xpub().to_string(), TV1_M_0H);
    }

    #[test]
    fn derivation_bounds() {
        let xpriv = master();
        let xpub = xpriv.to_xpub();
        for idx in [NormalIndex::ZERO, NormalIndex::MAX] {
            let child = xpriv.try_ckd_priv(idx).unwrap();
            assert_eq!(child, xpriv.ckd_priv(idx));
            assert_eq!(xpub.try_ckd_pub(idx), Some(child.to_xpub()));
            assert_eq!(child.child_number(), DerivationIndex::Normal(idx));
        }
        let hardened = xpriv.try_ckd_priv(HardenedIndex::MAX).unwrap();
        assert_eq!(hardened.child_number(), DerivationIndex::from_index(u32::MAX));
        assert_eq!(hardened.depth(), 1);
        assert_ne!(hardened.to_xpub(), xpub.ckd_pub(NormalIndex::MAX));
    }

    #[test]
    fn stream_decode() {
        let xpriv = master();
        let data = xpriv.encode();
        let mut parser = Parser::<Xpriv>::new();
        for chunk in data.chunks(5) {
            parser.parse_slice(chunk);
        }
        assert!(parser.is_done());
        assert_eq!(parser.value(), Some(&xpriv));

        let xpub = parse_bytes::<Xpub>(&xpriv.to_xpub().encode()).unwrap();
        assert_eq!(xpub, xpriv.to_xpub());
        assert_eq!(
            parse_bytes::<Xpub>(&data[..70]),
            Err(XkeyDecodeError::Stream(DecodeError::UnexpectedEod))
        );
    }

    #[test]
    fn address() {
        let key = master().with_script_type(ScriptType::P2wpkh);
        let addr = key.address().unwrap();
        assert_eq!(addr.script_pubkey(), bc::Script::p2wpkh(&key.public_key()));
        assert_eq!(key.to_xpub().address(), Ok(addr));
        let legacy = master().address().unwrap();
        assert_eq!(legacy.script_type(), ScriptType::P2pkh);
    }

    #[test]
    fn origin() {
        let origin = KeyOrigin::from_str("0464238c/84h/1h/0h/0/0").unwrap();
        assert_eq!(origin.master_fp(), XpubFp::from(<[u8; 4]>::from_hex("0464238c").unwrap()));
        assert_eq!(origin.derivation().len(), 5);
        assert_eq!(origin.to_string(), "0464238c/84h/1h/0h/0/0");
        assert_eq!(KeyOrigin::from_str("m/0").unwrap().master_fp(), XpubFp::master());
        assert!(KeyOrigin::from_str("xyz/0").is_err());
    }
}
