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
use std::io::{self, Write};
use std::iter::Sum;
use std::mem;
use std::str::FromStr;

use amplify::hex::{self, FromHex, ToHex};

use crate::{
    encode_list, sha256d, ByteSource, ConsensusEncode, DecodeError, FixedReader, Script,
    ScriptState, StreamDecode, StreamEncode, VarIntReader, Witness, WitnessState,
};

/// Maximal number of inputs or outputs accepted by the decoder.
pub const MAX_TX_ITEMS: u64 = 100_000;

pub const SEQ_FINAL: u32 = 0xFFFF_FFFF;

/// Transaction id: double SHA-256 of the transaction serialized without
/// witnesses. Displayed in reversed byte order.
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Txid([u8; 32]);

impl Txid {
    pub const fn to_byte_array(self) -> [u8; 32] { self.0 }
}

impl Display for Txid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut rev = self.0;
        rev.reverse();
        f.write_str(&rev.to_hex())
    }
}

impl FromStr for Txid {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = <[u8; 32]>::from_hex(s)?;
        bytes.reverse();
        Ok(Txid(bytes))
    }
}

/// Amount in satoshis.
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From, Display)]
#[display(inner)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Sats(u64);

impl Sats {
    pub const ZERO: Sats = Sats(0);

    pub const fn sats(self) -> u64 { self.0 }

    pub fn checked_add(self, other: Sats) -> Option<Sats> { self.0.checked_add(other.0).map(Sats) }

    pub fn saturating_add(self, other: Sats) -> Sats { Sats(self.0.saturating_add(other.0)) }

    pub fn saturating_sub(self, other: Sats) -> Sats { Sats(self.0.saturating_sub(other.0)) }
}

impl Sum for Sats {
    fn sum<I: Iterator<Item = Sats>>(iter: I) -> Self {
        iter.fold(Sats::ZERO, Sats::saturating_add)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display)]
#[display("{txid}:{vout}")]
pub struct Outpoint {
    pub txid: Txid,
    pub vout: u32,
}

impl Outpoint {
    pub const fn new(txid: Txid, vout: u32) -> Self { Outpoint { txid, vout } }
}

impl ConsensusEncode for Outpoint {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(self.txid.as_slice())?;
        writer.write_all(&self.vout.to_le_bytes())?;
        Ok(36)
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TxIn {
    pub prev_output: Outpoint,
    pub sig_script: Script,
    pub sequence: u32,
    pub witness: Witness,
}

impl TxIn {
    /// Unsigned input spending the given output with the final sequence.
    pub fn new(prev_output: Outpoint) -> Self {
        TxIn {
            prev_output,
            sig_script: none!(),
            sequence: SEQ_FINAL,
            witness: none!(),
        }
    }
}

impl ConsensusEncode for TxIn {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let mut counter = self.prev_output.consensus_encode(writer)?;
        counter += self.sig_script.consensus_encode(writer)?;
        counter += self.sequence.consensus_encode(writer)?;
        Ok(counter)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TxInState {
    txid: FixedReader<32>,
    vout: FixedReader<4>,
    sig_script: ScriptState,
    sequence: FixedReader<4>,
}

impl StreamDecode for TxIn {
    type State = TxInState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut TxInState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        if !(state.txid.feed(src)?
            && state.vout.feed(src)?
            && state.sig_script.feed(src)?
            && state.sequence.feed(src)?)
        {
            return Ok(None);
        }
        let mut st = mem::take(state);
        Ok(Some(TxIn {
            prev_output: Outpoint::new(
                Txid::from(*st.txid.as_bytes()),
                u32::from_le_bytes(*st.vout.as_bytes()),
            ),
            sig_script: st.sig_script.take(),
            sequence: u32::from_le_bytes(*st.sequence.as_bytes()),
            witness: none!(),
        }))
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TxOut {
    pub value: Sats,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(script_pubkey: Script, value: impl Into<Sats>) -> Self {
        TxOut {
            value: value.into(),
            script_pubkey,
        }
    }
}

impl ConsensusEncode for TxOut {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let mut counter = self.value.sats().consensus_encode(writer)?;
        counter += self.script_pubkey.consensus_encode(writer)?;
        Ok(counter)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TxOutState {
    value: FixedReader<8>,
    script_pubkey: ScriptState,
}

impl StreamDecode for TxOut {
    type State = TxOutState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut TxOutState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        if !(state.value.feed(src)? && state.script_pubkey.feed(src)?) {
            return Ok(None);
        }
        let mut st = mem::take(state);
        Ok(Some(TxOut {
            value: Sats::from(u64::from_le_bytes(*st.value.as_bytes())),
            script_pubkey: st.script_pubkey.take(),
        }))
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Tx {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Default for Tx {
    fn default() -> Self {
        Tx {
            version: 2,
            inputs: vec![],
            outputs: vec![],
            lock_time: 0,
        }
    }
}

impl Tx {
    /// Detects whether any of the inputs carries witness data, which requires
    /// segwit serialization.
    pub fn is_segwit(&self) -> bool { self.inputs.iter().any(|input| !input.witness.is_empty()) }

    pub fn txid(&self) -> Txid {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.encode_with(&mut buf, false)
            .expect("in-memory encoding can't error");
        Txid(sha256d(buf))
    }

    /// Hash of the full serialization, including witnesses; matches
    /// [`Tx::txid`] for non-segwit transactions.
    pub fn wtxid(&self) -> Txid { Txid(sha256d(self.to_vec())) }

    /// Length of the serialization without witness data.
    pub fn base_len(&self) -> usize {
        self.encode_with(&mut io::sink(), false)
            .expect("in-memory encoding can't error")
    }

    pub fn weight(&self) -> usize { self.base_len() * 3 + self.serialized_len() }

    pub fn vsize(&self) -> usize { (self.weight() + 3) / 4 }

    pub fn total_output_value(&self) -> Sats { self.outputs.iter().map(|out| out.value).sum() }

    /// Writes legacy serialization if `witness` is `false` or no input carries
    /// witness data; segwit serialization otherwise.
    pub fn encode_with(&self, writer: &mut dyn Write, witness: bool) -> Result<usize, io::Error> {
        let segwit = witness && self.is_segwit();
        let mut counter = self.version.consensus_encode(writer)?;
        if segwit {
            writer.write_all(&[0x00, 0x01])?;
            counter += 2;
        }
        counter += encode_list(&self.inputs, writer)?;
        counter += encode_list(&self.outputs, writer)?;
        if segwit {
            for input in &self.inputs {
                counter += input.witness.consensus_encode(writer)?;
            }
        }
        counter += self.lock_time.consensus_encode(writer)?;
        Ok(counter)
    }
}

impl ConsensusEncode for Tx {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        self.encode_with(writer, true)
    }
}

/// Decoder state for the part of a transaction preceding witnesses and the
/// lock time: version, optional segwit marker and flag, inputs and outputs.
///
/// Shared by the decoders of transaction-based formats which put their own
/// data between the outputs and the lock time.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TxBodyState {
    version: FixedReader<4>,
    /// First byte after the version: segwit marker or the start of the input
    /// count.
    marker: Option<u8>,
    flag: FixedReader<1>,
    input_count: VarIntReader,
    input: TxInState,
    output_count: VarIntReader,
    output: TxOutState,
    tx: Tx,
}

fn check_count(count: u64) -> Result<u64, DecodeError> {
    if count > MAX_TX_ITEMS {
        return Err(DecodeError::OversizedData {
            len: count,
            max: MAX_TX_ITEMS as usize,
        });
    }
    Ok(count)
}

impl TxBodyState {
    /// Continues decoding up to the end of the outputs. Once they are
    /// complete returns whether the segwit marker and flag were present;
    /// further calls return the same without consuming bytes.
    pub fn decode_step(&mut self, src: &mut dyn ByteSource) -> Result<Option<bool>, DecodeError> {
        if !self.version.feed(src)? {
            return Ok(None);
        }
        let segwit = match self.marker {
            Some(marker) => marker == 0x00,
            None => {
                let Some(byte) = src.next_byte()? else {
                    return Ok(None);
                };
                self.marker = Some(byte);
                self.tx.version = i32::from_le_bytes(*self.version.as_bytes());
                if byte != 0x00 {
                    self.input_count = VarIntReader::starting_with(byte);
                }
                byte == 0x00
            }
        };
        if segwit {
            if !self.flag.feed(src)? {
                return Ok(None);
            }
            let flag = self.flag.as_bytes()[0];
            if flag != 0x01 {
                return Err(DecodeError::InvalidSegwitFlag(flag));
            }
        }

        if !self.input_count.feed(src)? {
            return Ok(None);
        }
        let count = check_count(self.input_count.value())?;
        while (self.tx.inputs.len() as u64) < count {
            let Some(input) = TxIn::decode_step(&mut self.input, src)? else {
                return Ok(None);
            };
            self.tx.inputs.push(input);
        }

        if !self.output_count.feed(src)? {
            return Ok(None);
        }
        let count = check_count(self.output_count.value())?;
        while (self.tx.outputs.len() as u64) < count {
            let Some(output) = TxOut::decode_step(&mut self.output, src)? else {
                return Ok(None);
            };
            self.tx.outputs.push(output);
        }
        Ok(Some(segwit))
    }

    /// Transaction decoded so far; its lock time is not set.
    pub fn tx(&self) -> &Tx { &self.tx }

    pub fn tx_mut(&mut self) -> &mut Tx { &mut self.tx }

    pub fn into_tx(self) -> Tx { self.tx }
}

/// Incremental transaction decoder state.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TxState {
    body: TxBodyState,
    witness_no: usize,
    witness: WitnessState,
    lock_time: FixedReader<4>,
}

impl StreamDecode for Tx {
    type State = TxState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut TxState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        let Some(segwit) = state.body.decode_step(src)? else {
            return Ok(None);
        };

        if segwit {
            while state.witness_no < state.body.tx().inputs.len() {
                let Some(witness) = Witness::decode_step(&mut state.witness, src)? else {
                    return Ok(None);
                };
                state.body.tx_mut().inputs[state.witness_no].witness = witness;
                state.witness_no += 1;
            }
            if !state.body.tx().is_segwit() {
                return Err(DecodeError::SuperfluousWitness);
            }
        }

        if !state.lock_time.feed(src)? {
            return Ok(None);
        }
        let st = mem::take(state);
        let mut tx = st.body.into_tx();
        tx.lock_time = u32::from_le_bytes(*st.lock_time.as_bytes());
        Ok(Some(tx))
    }
}
