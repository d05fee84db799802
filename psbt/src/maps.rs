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

use std::io::{self, Write};

use bc::{
    parse_bytes, ConsensusEncode, DecodeError, NonStandardSighashType, PublicKey, Script,
    ScriptError, SighashType, Signature, StreamEncode, Tx, TxOut, Txid, Witness,
};
use derive::{DerivationIndex, DerivationPath, Idx, KeyOrigin, XkeyDecodeError, Xpub, XpubFp, XKEY_LEN};
use indexmap::IndexMap;

use crate::keys::*;
use crate::{GlobalKey, Input, InputKey, KeyType, Output, OutputKey, PartialSig, Psbt};

/// Errors in the content of a single PSBT key-value pair.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum FieldError {
    /// empty key outside of a map separator.
    EmptyKey,

    /// repeated key {0:#04x}.
    RepeatedKey(u8),

    /// repeated unknown key {0:#04x}.
    RepeatedUnknownKey(u8),

    /// key {0:#04x} must not contain additional key data.
    NonEmptyKeyData(u8),

    /// key {key:#04x} has key data of invalid length {len}.
    InvalidKeyLength { key: u8, len: usize },

    /// value of key {key:#04x} has invalid length {len}.
    InvalidValueLength { key: u8, len: usize },

    /// non-witness UTXO {found} doesn't match the spent transaction {expected}.
    TxidMismatch { expected: Txid, found: Txid },

    /// non-witness UTXO has no output #{0}.
    VoutOutOfRange(u32),

    /// empty signature data.
    EmptySig,

    /// {0}
    #[from]
    NonStandardSighash(NonStandardSighashType),

    /// key origin data have invalid length {0}.
    InvalidKeyOrigin(usize),

    /// invalid extended public key: {0}
    #[from]
    Xpub(XkeyDecodeError),

    /// unsupported PSBT version {0}.
    UnsupportedVersion(u32),

    /// {0}
    #[from]
    Script(ScriptError),

    /// invalid value data: {0}
    #[from]
    Decode(DecodeError),
}

/// Single key-value pair in its wire form.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct KeyPair {
    pub key_type: u8,
    pub key_data: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyPair {
    pub fn new(key_type: impl KeyType, key_data: Vec<u8>, value: impl Into<Vec<u8>>) -> Self {
        KeyPair {
            key_type: key_type.into_u8(),
            key_data,
            value: value.into(),
        }
    }
}

impl ConsensusEncode for KeyPair {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let mut key = Vec::with_capacity(1 + self.key_data.len());
        key.push(self.key_type);
        key.extend_from_slice(&self.key_data);
        let mut counter = key.as_slice().consensus_encode(writer)?;
        counter += self.value.as_slice().consensus_encode(writer)?;
        Ok(counter)
    }
}

fn pubkey_from_key_data(key: u8, data: &[u8]) -> Result<PublicKey, FieldError> {
    if data.len() != 33 && data.len() != 65 {
        return Err(FieldError::InvalidKeyLength {
            key,
            len: data.len(),
        });
    }
    PublicKey::from_slice(data).map_err(FieldError::from)
}

pub(crate) fn decode_origin(data: &[u8]) -> Result<KeyOrigin, FieldError> {
    if data.len() < 4 || data.len() % 4 != 0 {
        return Err(FieldError::InvalidKeyOrigin(data.len()));
    }
    let mut fp = [0u8; 4];
    fp.copy_from_slice(&data[..4]);
    let path = data[4..]
        .chunks_exact(4)
        .map(|chunk| {
            let mut index = [0u8; 4];
            index.copy_from_slice(chunk);
            DerivationIndex::from(u32::from_le_bytes(index))
        })
        .collect::<DerivationPath>();
    Ok(KeyOrigin::new(XpubFp::from(fp), path))
}

pub(crate) fn encode_origin(origin: &KeyOrigin) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + origin.derivation().len() * 4);
    data.extend_from_slice(origin.master_fp().as_ref());
    for index in origin.derivation() {
        data.extend_from_slice(&index.index().to_le_bytes());
    }
    data
}

fn u32_value(key: u8, value: &[u8]) -> Result<u32, FieldError> {
    let bytes = <[u8; 4]>::try_from(value).map_err(|_| FieldError::InvalidValueLength {
        key,
        len: value.len(),
    })?;
    Ok(u32::from_le_bytes(bytes))
}

fn script_value(value: &[u8]) -> Result<Script, FieldError> {
    Script::from_bytes(value.to_vec()).map_err(FieldError::from)
}

fn insert_unknown(
    unknown: &mut IndexMap<Vec<u8>, Vec<u8>>,
    key_type: u8,
    key_data: &[u8],
    value: &[u8],
) -> Result<(), FieldError> {
    let mut key = Vec::with_capacity(1 + key_data.len());
    key.push(key_type);
    key.extend_from_slice(key_data);
    if unknown.contains_key(&key) {
        return Err(FieldError::RepeatedUnknownKey(key_type));
    }
    unknown.insert(key, value.to_vec());
    Ok(())
}

/// Check for keys which may appear in a map only once.
fn check_singular<T>(field: &Option<T>, key_type: u8) -> Result<(), FieldError> {
    if field.is_some() {
        return Err(FieldError::RepeatedKey(key_type));
    }
    Ok(())
}

/// Key-value map of a single PSBT section.
pub trait KeyMap {
    type Keys: KeyType;

    /// Applies a key-value pair read from the wire.
    fn insert_pair(
        &mut self,
        key_type: Self::Keys,
        key_data: &[u8],
        value: &[u8],
    ) -> Result<(), FieldError>;

    /// Standard pairs in the order of their key types.
    fn standard_pairs(&self) -> Vec<KeyPair>;

    fn unknown_map(&self) -> &IndexMap<Vec<u8>, Vec<u8>>;

    /// Parses the raw key and dispatches it to [`KeyMap::insert_pair`].
    fn parse_pair(&mut self, key: &[u8], value: &[u8]) -> Result<(), FieldError> {
        let Some((&key_byte, key_data)) = key.split_first() else {
            return Err(FieldError::EmptyKey);
        };
        let key_type = Self::Keys::from_u8(key_byte);
        if key_type.is_standard() && !key_type.has_key_data() && !key_data.is_empty() {
            return Err(FieldError::NonEmptyKeyData(key_byte));
        }
        trace!("PSBT key {:?} with {} bytes of key data", key_type, key_data.len());
        self.insert_pair(key_type, key_data, value)
    }

    /// Writes all pairs followed by the map separator.
    fn encode_map(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let mut counter = 0;
        for pair in self.standard_pairs() {
            counter += pair.consensus_encode(writer)?;
        }
        for (key, value) in self.unknown_map() {
            let pair = KeyPair {
                key_type: key[0],
                key_data: key[1..].to_vec(),
                value: value.clone(),
            };
            counter += pair.consensus_encode(writer)?;
        }
        writer.write_all(&[0])?;
        Ok(counter + 1)
    }
}

impl KeyMap for Psbt {
    type Keys = GlobalKey;

    fn insert_pair(
        &mut self,
        key_type: GlobalKey,
        key_data: &[u8],
        value: &[u8],
    ) -> Result<(), FieldError> {
        match key_type {
            // The unsigned transaction is consumed before the map is created.
            GlobalKey::UnsignedTx => return Err(FieldError::RepeatedKey(PSBT_GLOBAL_UNSIGNED_TX)),
            GlobalKey::Xpub => {
                if key_data.len() != XKEY_LEN {
                    return Err(FieldError::InvalidKeyLength {
                        key: PSBT_GLOBAL_XPUB,
                        len: key_data.len(),
                    });
                }
                let xpub = Xpub::decode(key_data)?;
                if self.xpubs.contains_key(&xpub) {
                    return Err(FieldError::RepeatedKey(PSBT_GLOBAL_XPUB));
                }
                self.xpubs.insert(xpub, decode_origin(value)?);
            }
            GlobalKey::Version => {
                check_singular(&self.version, PSBT_GLOBAL_VERSION)?;
                let version = u32_value(PSBT_GLOBAL_VERSION, value)?;
                if version != 0 {
                    return Err(FieldError::UnsupportedVersion(version));
                }
                self.version = Some(version);
            }
            GlobalKey::Unknown(key_type) => {
                insert_unknown(&mut self.unknown, key_type, key_data, value)?
            }
        }
        Ok(())
    }

    fn standard_pairs(&self) -> Vec<KeyPair> {
        let mut pairs = vec![];
        let mut tx = Vec::with_capacity(self.tx.base_len());
        self.tx
            .encode_with(&mut tx, false)
            .expect("in-memory encoding can't error");
        pairs.push(KeyPair::new(GlobalKey::UnsignedTx, none!(), tx));
        for (xpub, origin) in &self.xpubs {
            pairs.push(KeyPair::new(GlobalKey::Xpub, xpub.encode().to_vec(), encode_origin(origin)));
        }
        if let Some(version) = self.version {
            pairs.push(KeyPair::new(GlobalKey::Version, none!(), version.to_le_bytes()));
        }
        pairs
    }

    fn unknown_map(&self) -> &IndexMap<Vec<u8>, Vec<u8>> { &self.unknown }
}

impl KeyMap for Input {
    type Keys = InputKey;

    fn insert_pair(
        &mut self,
        key_type: InputKey,
        key_data: &[u8],
        value: &[u8],
    ) -> Result<(), FieldError> {
        match key_type {
            InputKey::NonWitnessUtxo => {
                check_singular(&self.non_witness_utxo, PSBT_IN_NON_WITNESS_UTXO)?;
                let tx = parse_bytes::<Tx>(value)?;
                let txid = tx.txid();
                if txid != self.prev_output.txid {
                    return Err(FieldError::TxidMismatch {
                        expected: self.prev_output.txid,
                        found: txid,
                    });
                }
                if self.prev_output.vout as usize >= tx.outputs.len() {
                    return Err(FieldError::VoutOutOfRange(self.prev_output.vout));
                }
                self.non_witness_utxo = Some(tx);
            }
            InputKey::WitnessUtxo => {
                check_singular(&self.witness_utxo, PSBT_IN_WITNESS_UTXO)?;
                self.witness_utxo = Some(parse_bytes::<TxOut>(value)?);
            }
            InputKey::PartialSig => {
                let pubkey = pubkey_from_key_data(PSBT_IN_PARTIAL_SIG, key_data)?;
                if self.partial_sigs.contains_key(&pubkey) {
                    return Err(FieldError::RepeatedKey(PSBT_IN_PARTIAL_SIG));
                }
                let Some((sighash, der)) = value.split_last() else {
                    return Err(FieldError::EmptySig);
                };
                let sig = PartialSig::new(Signature::from_der(der)?, SighashType::from_u8(*sighash)?);
                self.partial_sigs.insert(pubkey, sig);
            }
            InputKey::SighashType => {
                check_singular(&self.sighash_type, PSBT_IN_SIGHASH_TYPE)?;
                let sighash_type = u32_value(PSBT_IN_SIGHASH_TYPE, value)?;
                self.sighash_type = Some(SighashType::from_standard_u32(sighash_type)?);
            }
            InputKey::RedeemScript => {
                check_singular(&self.redeem_script, PSBT_IN_REDEEM_SCRIPT)?;
                self.redeem_script = Some(script_value(value)?);
            }
            InputKey::WitnessScript => {
                check_singular(&self.witness_script, PSBT_IN_WITNESS_SCRIPT)?;
                self.witness_script = Some(script_value(value)?);
            }
            InputKey::Bip32Derivation => {
                let pubkey = pubkey_from_key_data(PSBT_IN_BIP32_DERIVATION, key_data)?;
                if self.bip32_derivation.contains_key(&pubkey) {
                    return Err(FieldError::RepeatedKey(PSBT_IN_BIP32_DERIVATION));
                }
                self.bip32_derivation.insert(pubkey, decode_origin(value)?);
            }
            InputKey::FinalScriptSig => {
                check_singular(&self.final_script_sig, PSBT_IN_FINAL_SCRIPTSIG)?;
                self.final_script_sig = Some(script_value(value)?);
            }
            InputKey::FinalWitness => {
                check_singular(&self.final_witness, PSBT_IN_FINAL_SCRIPTWITNESS)?;
                self.final_witness = Some(parse_bytes::<Witness>(value)?);
            }
            InputKey::Unknown(key_type) => {
                insert_unknown(&mut self.unknown, key_type, key_data, value)?
            }
        }
        Ok(())
    }

    fn standard_pairs(&self) -> Vec<KeyPair> {
        let mut pairs = vec![];
        if let Some(tx) = &self.non_witness_utxo {
            pairs.push(KeyPair::new(InputKey::NonWitnessUtxo, none!(), tx.to_vec()));
        }
        if let Some(txout) = &self.witness_utxo {
            pairs.push(KeyPair::new(InputKey::WitnessUtxo, none!(), txout.to_vec()));
        }
        for (pubkey, sig) in &self.partial_sigs {
            pairs.push(KeyPair::new(InputKey::PartialSig, pubkey.to_bytes(), sig.to_vec()));
        }
        if let Some(sighash_type) = self.sighash_type {
            pairs.push(KeyPair::new(
                InputKey::SighashType,
                none!(),
                sighash_type.to_u32().to_le_bytes(),
            ));
        }
        if let Some(script) = &self.redeem_script {
            pairs.push(KeyPair::new(InputKey::RedeemScript, none!(), script.as_slice()));
        }
        if let Some(script) = &self.witness_script {
            pairs.push(KeyPair::new(InputKey::WitnessScript, none!(), script.as_slice()));
        }
        for (pubkey, origin) in &self.bip32_derivation {
            pairs.push(KeyPair::new(
                InputKey::Bip32Derivation,
                pubkey.to_bytes(),
                encode_origin(origin),
            ));
        }
        if let Some(script) = &self.final_script_sig {
            pairs.push(KeyPair::new(InputKey::FinalScriptSig, none!(), script.as_slice()));
        }
        if let Some(witness) = &self.final_witness {
            pairs.push(KeyPair::new(InputKey::FinalWitness, none!(), witness.to_vec()));
        }
        pairs
    }

    fn unknown_map(&self) -> &IndexMap<Vec<u8>, Vec<u8>> { &self.unknown }
}

impl KeyMap for Output {
    type Keys = OutputKey;

    fn insert_pair(
        &mut self,
        key_type: OutputKey,
        key_data: &[u8],
        value: &[u8],
    ) -> Result<(), FieldError> {
        match key_type {
            OutputKey::RedeemScript => {
                check_singular(&self.redeem_script, PSBT_OUT_REDEEM_SCRIPT)?;
                self.redeem_script = Some(script_value(value)?);
            }
            OutputKey::WitnessScript => {
                check_singular(&self.witness_script, PSBT_OUT_WITNESS_SCRIPT)?;
                self.witness_script = Some(script_value(value)?);
            }
            OutputKey::Bip32Derivation => {
                let pubkey = pubkey_from_key_data(PSBT_OUT_BIP32_DERIVATION, key_data)?;
                if self.bip32_derivation.contains_key(&pubkey) {
                    return Err(FieldError::RepeatedKey(PSBT_OUT_BIP32_DERIVATION));
                }
                self.bip32_derivation.insert(pubkey, decode_origin(value)?);
            }
            OutputKey::Unknown(key_type) => {
                insert_unknown(&mut self.unknown, key_type, key_data, value)?
            }
        }
        Ok(())
    }

    fn standard_pairs(&self) -> Vec<KeyPair> {
        let mut pairs = vec![];
        if let Some(script) = &self.redeem_script {
            pairs.push(KeyPair::new(OutputKey::RedeemScript, none!(), script.as_slice()));
        }
        if let Some(script) = &self.witness_script {
            pairs.push(KeyPair::new(OutputKey::WitnessScript, none!(), script.as_slice()));
        }
        for (pubkey, origin) in &self.bip32_derivation {
            pairs.push(KeyPair::new(
                OutputKey::Bip32Derivation,
                pubkey.to_bytes(),
                encode_origin(origin),
            ));
        }
        pairs
    }

    fn unknown_map(&self) -> &IndexMap<Vec<u8>, Vec<u8>> { &self.unknown }
}
