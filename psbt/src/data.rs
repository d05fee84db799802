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

use bc::{Outpoint, PublicKey, Sats, Script, SighashType, Signature, Tx, TxOut, Witness};
use derive::{KeyOrigin, Xpub};
use indexmap::IndexMap;

use crate::PsbtError;

/// Signature collected for an input together with its sighash type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PartialSig {
    pub sig: Signature,
    pub sighash_type: SighashType,
}

impl PartialSig {
    pub fn new(sig: Signature, sighash_type: SighashType) -> Self { PartialSig { sig, sighash_type } }

    /// DER encoding followed by the sighash byte, as stored in the PSBT.
    pub fn to_vec(&self) -> Vec<u8> { self.sig.to_der_with_sighash(self.sighash_type) }
}

/// Partially signed transaction (BIP174, version 0).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Psbt {
    pub(crate) tx: Tx,

    /// Extended public keys with their origins, as listed in the global map.
    pub xpubs: IndexMap<Xpub, KeyOrigin>,

    /// `PSBT_GLOBAL_VERSION`; `None` if the key was absent.
    pub version: Option<u32>,

    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<Output>,

    /// Unknown global keys (including the key type byte) with their values.
    pub unknown: IndexMap<Vec<u8>, Vec<u8>>,
}

impl Psbt {
    pub const MAGIC: [u8; 5] = *b"psbt\xFF";

    /// Creates PSBT for a transaction which must not carry any signatures.
    pub fn from_unsigned_tx(tx: Tx) -> Result<Psbt, PsbtError> {
        if tx.inputs.iter().any(|input| !input.sig_script.is_empty() || !input.witness.is_empty()) {
            return Err(PsbtError::SignedUnsignedTx);
        }
        let inputs = tx
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| Input::new(index, input.prev_output))
            .collect();
        let outputs = (0..tx.outputs.len()).map(Output::new).collect();
        Ok(Psbt {
            tx,
            xpubs: empty!(),
            version: None,
            inputs,
            outputs,
            unknown: empty!(),
        })
    }

    /// Unsigned transaction of the global map.
    pub fn unsigned_tx(&self) -> &Tx { &self.tx }

    /// Number of key-value maps: the global one plus one per input and
    /// output.
    pub fn sections(&self) -> usize { 1 + self.tx.inputs.len() + self.tx.outputs.len() }

    pub fn input(&self, index: usize) -> Option<&Input> { self.inputs.get(index) }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> { self.inputs.get_mut(index) }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> { self.inputs.iter() }

    pub fn inputs_mut(&mut self) -> impl Iterator<Item = &mut Input> { self.inputs.iter_mut() }

    pub fn output(&self, index: usize) -> Option<&Output> { self.outputs.get(index) }

    pub fn output_mut(&mut self, index: usize) -> Option<&mut Output> {
        self.outputs.get_mut(index)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> { self.outputs.iter() }

    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut Output> { self.outputs.iter_mut() }

    /// Sum of the spent amounts, or `None` if some input has no UTXO
    /// information.
    pub fn input_sum(&self) -> Option<Sats> {
        self.inputs()
            .map(|input| input.prev_txout().map(|txout| txout.value))
            .try_fold(Sats::ZERO, |sum, value| Some(sum.saturating_add(value?)))
    }

    pub fn output_sum(&self) -> Sats { self.tx.total_output_value() }

    /// Transaction fee. Zero if the amount of any input is unknown or the
    /// outputs exceed the inputs.
    pub fn fee(&self) -> Sats {
        match self.input_sum() {
            Some(sum) => sum.saturating_sub(self.output_sum()),
            None => Sats::ZERO,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Input {
    /// The index of this input. Used in error reporting.
    pub(crate) index: usize,

    pub(crate) prev_output: Outpoint,

    /// The non-witness transaction this input spends from.
    pub non_witness_utxo: Option<Tx>,

    /// The transaction output this input spends from.
    pub witness_utxo: Option<TxOut>,

    /// A map from public keys to their corresponding signature as would be
    /// pushed to the stack from a scriptSig or witness.
    pub partial_sigs: IndexMap<PublicKey, PartialSig>,

    /// The sighash type to be used for this input. Signatures for this input
    /// must use the sighash type.
    pub sighash_type: Option<SighashType>,

    pub redeem_script: Option<Script>,

    pub witness_script: Option<Script>,

    /// A map from public keys needed to sign this input to their corresponding master key
    /// fingerprints and derivation paths.
    pub bip32_derivation: IndexMap<PublicKey, KeyOrigin>,

    pub final_script_sig: Option<Script>,

    pub final_witness: Option<Witness>,

    /// Unknown keys (including the key type byte) with their values.
    pub unknown: IndexMap<Vec<u8>, Vec<u8>>,
}

impl Input {
    pub fn new(index: usize, prev_output: Outpoint) -> Input {
        Input {
            index,
            prev_output,
            non_witness_utxo: None,
            witness_utxo: None,
            partial_sigs: empty!(),
            sighash_type: None,
            redeem_script: None,
            witness_script: None,
            bip32_derivation: empty!(),
            final_script_sig: None,
            final_witness: None,
            unknown: empty!(),
        }
    }

    #[inline]
    pub fn index(&self) -> usize { self.index }

    #[inline]
    pub fn prev_output(&self) -> Outpoint { self.prev_output }

    /// Output spent by this input, taken from the witness UTXO or, if absent,
    /// from the non-witness UTXO transaction.
    pub fn prev_txout(&self) -> Option<&TxOut> {
        self.witness_utxo.as_ref().or_else(|| {
            self.non_witness_utxo
                .as_ref()
                .and_then(|tx| tx.outputs.get(self.prev_output.vout as usize))
        })
    }

    /// Spent amount, if known.
    pub fn value(&self) -> Option<Sats> { self.prev_txout().map(|txout| txout.value) }

    /// Sighash type requested for the input, `SIGHASH_ALL` by default.
    pub fn sighash_type(&self) -> SighashType { self.sighash_type.unwrap_or_default() }

    pub fn is_finalized(&self) -> bool {
        self.final_script_sig.is_some() || self.final_witness.is_some()
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Output {
    /// The index of this output. Used in error reporting.
    pub(crate) index: usize,

    pub redeem_script: Option<Script>,

    pub witness_script: Option<Script>,

    /// A map from public keys needed to spend this output to their corresponding master key
    /// fingerprints and derivation paths.
    pub bip32_derivation: IndexMap<PublicKey, KeyOrigin>,

    /// Unknown keys (including the key type byte) with their values.
    pub unknown: IndexMap<Vec<u8>, Vec<u8>>,
}

impl Output {
    pub fn new(index: usize) -> Self {
        Output {
            index,
            redeem_script: None,
            witness_script: None,
            bip32_derivation: empty!(),
            unknown: empty!(),
        }
    }

    #[inline]
    pub fn index(&self) -> usize { self.index }
}
