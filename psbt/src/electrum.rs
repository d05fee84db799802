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

//! Unsigned transactions exported by Electrum for offline signing.
//!
//! The export is a transaction prefixed with `EPTF\xFF\x00`. Each input
//! names the extended public key and the two-level derivation of the key
//! which has to sign it. Legacy exports keep this data in the scriptSig of
//! the inputs; segwit exports put a 102-byte record in place of each input
//! witness, which also carries the spent amount.

use std::io::{self, Write};
use std::mem;

use amplify::Bytes;
use bc::{
    ByteSource, ConsensusEncode, DecodeError, FixedReader, Sats, Script, ScriptType, SighashType,
    StreamDecode, Tx, TxBodyState,
};
use derive::{NormalIndex, XkeyDecodeError, Xpriv, Xpub, XKEY_LEN};

pub const ELECTRUM_MAGIC: [u8; 6] = *b"EPTF\xFF\x00";
/// Length of the scriptSig data of a legacy export input.
pub const ELECTRUM_SCRIPT_SIG_LEN: usize = 87;
/// Length of the per-input record of a segwit export.
pub const ELECTRUM_RECORD_LEN: usize = 102;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ElectrumError {
    /// invalid magic bytes {0}.
    InvalidMagic(Bytes<6>),

    /// scriptSig of input #{0} has {1} bytes instead of 87.
    InvalidScriptSig(usize, usize),

    /// record of input #{0} doesn't start with 0xFF.
    InvalidRecord(usize),

    /// invalid extended public key in input #{0}: {1}
    Xpub(usize, XkeyDecodeError),

    /// {0}
    #[from]
    Decode(DecodeError),
}

/// Signing data for a single input.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElectrumInput {
    /// Account-level extended key; its version defines the script type.
    pub xpub: Xpub,
    /// Change flag and address index below the account key.
    pub derivation: [u16; 2],
    /// Spent amount; known only for segwit exports.
    pub amount: Option<Sats>,
}

fn u16_le(data: &[u8]) -> u16 { u16::from_le_bytes([data[0], data[1]]) }

impl ElectrumInput {
    fn from_script_sig(no: usize, script: &Script) -> Result<Self, ElectrumError> {
        if script.len() != ELECTRUM_SCRIPT_SIG_LEN {
            return Err(ElectrumError::InvalidScriptSig(no, script.len()));
        }
        let xpub = Xpub::decode(&script[5..5 + XKEY_LEN]).map_err(|err| ElectrumError::Xpub(no, err))?;
        Ok(ElectrumInput {
            xpub,
            derivation: [u16_le(&script[83..85]), u16_le(&script[85..87])],
            amount: None,
        })
    }

    fn from_record(no: usize, record: &[u8; ELECTRUM_RECORD_LEN]) -> Result<Self, ElectrumError> {
        if record[0] != 0xFF {
            return Err(ElectrumError::InvalidRecord(no));
        }
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&record[5..13]);
        let amount = u64::from_le_bytes(amount);
        let xpub = Xpub::decode(&record[20..20 + XKEY_LEN]).map_err(|err| ElectrumError::Xpub(no, err))?;
        Ok(ElectrumInput {
            xpub,
            derivation: [u16_le(&record[98..100]), u16_le(&record[100..102])],
            amount: (amount != 0).then_some(Sats::from(amount)),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ElectrumTx {
    tx: Tx,
    inputs: Vec<ElectrumInput>,
    segwit: bool,
}

impl ElectrumTx {
    /// Transaction with the Electrum data removed; signed inputs carry their
    /// scriptSig and witness.
    pub fn tx(&self) -> &Tx { &self.tx }

    pub fn into_tx(self) -> Tx { self.tx }

    pub fn inputs(&self) -> &[ElectrumInput] { &self.inputs }

    /// Whether the export used segwit serialization.
    pub fn is_segwit_export(&self) -> bool { self.segwit }

    /// Transaction fee; zero if the amount of any input is unknown or the
    /// outputs exceed the inputs.
    pub fn fee(&self) -> Sats {
        let Some(inputs) = self
            .inputs
            .iter()
            .try_fold(Sats::ZERO, |sum, input| Some(sum.saturating_add(input.amount?)))
        else {
            return Sats::ZERO;
        };
        inputs.saturating_sub(self.tx.total_output_value())
    }

    /// Signs inputs belonging to the `account` key and returns the number of
    /// signed inputs.
    ///
    /// An input belongs to the account if its extended key has the same
    /// public key and chain code; the script type of the input comes from the
    /// version of that key.
    pub fn sign(&mut self, account: &Xpriv) -> usize {
        let account_xpub = account.to_xpub();
        let mut count = 0usize;
        for (no, input) in self.inputs.iter().enumerate() {
            if input.xpub.core() != account_xpub.core() {
                continue;
            }
            let [change, index] = input.derivation;
            let key = account
                .ckd_priv(NormalIndex::normal(change))
                .ckd_priv(NormalIndex::normal(index));
            let key = key.private_key();
            let script_type = input.xpub.script_type();
            let res = match (script_type, input.amount) {
                (
                    ScriptType::Unknown
                    | ScriptType::P2pkh
                    | ScriptType::P2sh
                    | ScriptType::DirectScript,
                    _,
                ) => self.tx.sign_p2pkh_input(no, key, SighashType::all()),
                (ScriptType::P2wpkh | ScriptType::P2shP2wpkh, Some(amount)) => {
                    self.tx
                        .sign_p2wpkh_input(no, key, amount, script_type, SighashType::all())
                }
                (ScriptType::P2wpkh | ScriptType::P2shP2wpkh, None) => {
                    debug!("amount spent by input #{no} is unknown, skipping");
                    continue;
                }
                (script_type, _) => {
                    debug!("can't sign {script_type} input #{no}");
                    continue;
                }
            };
            match res {
                Ok(_) => count += 1,
                Err(err) => debug!("can't sign input #{no}: {err}"),
            }
        }
        count
    }
}

/// Writes the transaction without the Electrum envelope.
impl ConsensusEncode for ElectrumTx {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        self.tx.consensus_encode(writer)
    }
}

#[derive(Debug, Default)]
pub struct ElectrumState {
    magic: FixedReader<6>,
    body: TxBodyState,
    record: FixedReader<ELECTRUM_RECORD_LEN>,
    lock_time: FixedReader<4>,
    inputs: Vec<ElectrumInput>,
}

impl StreamDecode for ElectrumTx {
    type State = ElectrumState;
    type Error = ElectrumError;

    fn decode_step(
        state: &mut ElectrumState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, ElectrumError> {
        if !state.magic.is_complete() {
            if !state.magic.feed(src)? {
                return Ok(None);
            }
            let magic = *state.magic.as_bytes();
            if magic != ELECTRUM_MAGIC {
                return Err(ElectrumError::InvalidMagic(Bytes::from(magic)));
            }
        }

        let Some(segwit) = state.body.decode_step(src)? else {
            return Ok(None);
        };

        if segwit {
            while state.inputs.len() < state.body.tx().inputs.len() {
                if !state.record.feed(src)? {
                    return Ok(None);
                }
                let input = ElectrumInput::from_record(state.inputs.len(), state.record.as_bytes())?;
                state.record.reset();
                state.inputs.push(input);
            }
        }

        if !state.lock_time.feed(src)? {
            return Ok(None);
        }
        let mut st = mem::take(state);
        let mut tx = st.body.into_tx();
        tx.lock_time = u32::from_le_bytes(*st.lock_time.as_bytes());
        if !segwit {
            for (no, txin) in tx.inputs.iter_mut().enumerate() {
                st.inputs.push(ElectrumInput::from_script_sig(no, &txin.sig_script)?);
                txin.sig_script = Script::new();
            }
        }
        debug!(
            "Electrum {} export with {} inputs",
            if segwit { "segwit" } else { "legacy" },
            st.inputs.len()
        );
        Ok(Some(ElectrumTx {
            tx,
            inputs: st.inputs,
            segwit,
        }))
    }
}
