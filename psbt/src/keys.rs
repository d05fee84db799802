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

use std::fmt::Debug;
use std::hash::Hash;

pub trait KeyType: Copy + Eq + Hash + Debug + 'static {
    const STANDARD: &'static [Self];
    fn from_u8(val: u8) -> Self;
    fn into_u8(self) -> u8;
    fn to_u8(&self) -> u8 { self.into_u8() }
    /// Whether the key carries data after the type byte.
    fn has_key_data(self) -> bool;
    fn is_standard(self) -> bool { Self::STANDARD.contains(&self) }
}

pub(crate) const PSBT_GLOBAL_UNSIGNED_TX: u8 = 0x00;
pub(crate) const PSBT_GLOBAL_XPUB: u8 = 0x01;
pub(crate) const PSBT_GLOBAL_VERSION: u8 = 0xFB;

pub(crate) const PSBT_IN_NON_WITNESS_UTXO: u8 = 0x00;
pub(crate) const PSBT_IN_WITNESS_UTXO: u8 = 0x01;
pub(crate) const PSBT_IN_PARTIAL_SIG: u8 = 0x02;
pub(crate) const PSBT_IN_SIGHASH_TYPE: u8 = 0x03;
pub(crate) const PSBT_IN_REDEEM_SCRIPT: u8 = 0x04;
pub(crate) const PSBT_IN_WITNESS_SCRIPT: u8 = 0x05;
pub(crate) const PSBT_IN_BIP32_DERIVATION: u8 = 0x06;
pub(crate) const PSBT_IN_FINAL_SCRIPTSIG: u8 = 0x07;
pub(crate) const PSBT_IN_FINAL_SCRIPTWITNESS: u8 = 0x08;

pub(crate) const PSBT_OUT_REDEEM_SCRIPT: u8 = 0x00;
pub(crate) const PSBT_OUT_WITNESS_SCRIPT: u8 = 0x01;
pub(crate) const PSBT_OUT_BIP32_DERIVATION: u8 = 0x02;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum GlobalKey {
    /// `PSBT_GLOBAL_UNSIGNED_TX`
    UnsignedTx,

    /// `PSBT_GLOBAL_XPUB`
    Xpub,

    /// `PSBT_GLOBAL_VERSION`
    Version,

    /// All unknown keys
    Unknown(u8),
}

impl KeyType for GlobalKey {
    const STANDARD: &'static [Self] = &[Self::UnsignedTx, Self::Xpub, Self::Version];

    fn from_u8(val: u8) -> Self {
        match val {
            PSBT_GLOBAL_UNSIGNED_TX => Self::UnsignedTx,
            PSBT_GLOBAL_XPUB => Self::Xpub,
            PSBT_GLOBAL_VERSION => Self::Version,
            unknown => Self::Unknown(unknown),
        }
    }

    fn into_u8(self) -> u8 {
        match self {
            GlobalKey::UnsignedTx => PSBT_GLOBAL_UNSIGNED_TX,
            GlobalKey::Xpub => PSBT_GLOBAL_XPUB,
            GlobalKey::Version => PSBT_GLOBAL_VERSION,
            GlobalKey::Unknown(key) => key,
        }
    }

    fn has_key_data(self) -> bool {
        match self {
            GlobalKey::UnsignedTx | GlobalKey::Version => false,
            GlobalKey::Xpub => true,
            GlobalKey::Unknown(_) => true,
        }
    }
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum InputKey {
    /// `PSBT_IN_NON_WITNESS_UTXO`
    NonWitnessUtxo,

    /// `PSBT_IN_WITNESS_UTXO`
    WitnessUtxo,

    /// `PSBT_IN_PARTIAL_SIG`
    PartialSig,

    /// `PSBT_IN_SIGHASH_TYPE`
    SighashType,

    /// `PSBT_IN_REDEEM_SCRIPT`
    RedeemScript,

    /// `PSBT_IN_WITNESS_SCRIPT`
    WitnessScript,

    /// `PSBT_IN_BIP32_DERIVATION`
    Bip32Derivation,

    /// `PSBT_IN_FINAL_SCRIPTSIG`
    FinalScriptSig,

    /// `PSBT_IN_FINAL_SCRIPTWITNESS`
    FinalWitness,

    /// All unknown keys
    Unknown(u8),
}

impl KeyType for InputKey {
    const STANDARD: &'static [Self] = &[
        Self::NonWitnessUtxo,
        Self::WitnessUtxo,
        Self::PartialSig,
        Self::SighashType,
        Self::RedeemScript,
        Self::WitnessScript,
        Self::Bip32Derivation,
        Self::FinalScriptSig,
        Self::FinalWitness,
    ];

    fn from_u8(val: u8) -> Self {
        match val {
            PSBT_IN_NON_WITNESS_UTXO => Self::NonWitnessUtxo,
            PSBT_IN_WITNESS_UTXO => Self::WitnessUtxo,
            PSBT_IN_PARTIAL_SIG => Self::PartialSig,
            PSBT_IN_SIGHASH_TYPE => Self::SighashType,
            PSBT_IN_REDEEM_SCRIPT => Self::RedeemScript,
            PSBT_IN_WITNESS_SCRIPT => Self::WitnessScript,
            PSBT_IN_BIP32_DERIVATION => Self::Bip32Derivation,
            PSBT_IN_FINAL_SCRIPTSIG => Self::FinalScriptSig,
            PSBT_IN_FINAL_SCRIPTWITNESS => Self::FinalWitness,
            unknown => Self::Unknown(unknown),
        }
    }

    fn into_u8(self) -> u8 {
        match self {
            InputKey::NonWitnessUtxo => PSBT_IN_NON_WITNESS_UTXO,
            InputKey::WitnessUtxo => PSBT_IN_WITNESS_UTXO,
            InputKey::PartialSig => PSBT_IN_PARTIAL_SIG,
            InputKey::SighashType => PSBT_IN_SIGHASH_TYPE,
            InputKey::RedeemScript => PSBT_IN_REDEEM_SCRIPT,
            InputKey::WitnessScript => PSBT_IN_WITNESS_SCRIPT,
            InputKey::Bip32Derivation => PSBT_IN_BIP32_DERIVATION,
            InputKey::FinalScriptSig => PSBT_IN_FINAL_SCRIPTSIG,
            InputKey::FinalWitness => PSBT_IN_FINAL_SCRIPTWITNESS,
            InputKey::Unknown(key) => key,
        }
    }

    fn has_key_data(self) -> bool {
        match self {
            InputKey::PartialSig | InputKey::Bip32Derivation | InputKey::Unknown(_) => true,
            InputKey::NonWitnessUtxo
            | InputKey::WitnessUtxo
            | InputKey::SighashType
            | InputKey::RedeemScript
            | InputKey::WitnessScript
            | InputKey::FinalScriptSig
            | InputKey::FinalWitness => false,
        }
    }
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum OutputKey {
    /// `PSBT_OUT_REDEEM_SCRIPT`
    RedeemScript,

    /// `PSBT_OUT_WITNESS_SCRIPT`
    WitnessScript,

    /// `PSBT_OUT_BIP32_DERIVATION`
    Bip32Derivation,

    /// All unknown keys
    Unknown(u8),
}

impl KeyType for OutputKey {
    const STANDARD: &'static [Self] =
        &[Self::RedeemScript, Self::WitnessScript, Self::Bip32Derivation];

    fn from_u8(val: u8) -> Self {
        match val {
            PSBT_OUT_REDEEM_SCRIPT => Self::RedeemScript,
            PSBT_OUT_WITNESS_SCRIPT => Self::WitnessScript,
            PSBT_OUT_BIP32_DERIVATION => Self::Bip32Derivation,
            unknown => Self::Unknown(unknown),
        }
    }

    fn into_u8(self) -> u8 {
        match self {
            OutputKey::RedeemScript => PSBT_OUT_REDEEM_SCRIPT,
            OutputKey::WitnessScript => PSBT_OUT_WITNESS_SCRIPT,
            OutputKey::Bip32Derivation => PSBT_OUT_BIP32_DERIVATION,
            OutputKey::Unknown(key) => key,
        }
    }

    fn has_key_data(self) -> bool {
        matches!(self, OutputKey::Bip32Derivation | OutputKey::Unknown(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip() {
        for val in 0..=u8::MAX {
            assert_eq!(GlobalKey::from_u8(val).into_u8(), val);
            assert_eq!(InputKey::from_u8(val).into_u8(), val);
            assert_eq!(OutputKey::from_u8(val).into_u8(), val);
        }
    }

    #[test]
    fn standard() {
        assert!(GlobalKey::from_u8(0xFB).is_standard());
        assert!(!GlobalKey::from_u8(0x02).is_standard());
        assert_eq!(InputKey::STANDARD.len(), 9);
        assert!(!InputKey::from_u8(0x09).is_standard());
        assert!(OutputKey::Bip32Derivation.has_key_data());
        assert!(!OutputKey::WitnessScript.has_key_data());
    }
}
