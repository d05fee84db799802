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
use std::str::FromStr;

use amplify::Bytes;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bc::{
    parse_bytes, ByteSource, ConsensusEncode, DecodeError, FixedReader, PrefixedReader,
    StreamDecode, StreamEncode, Tx,
};

use crate::maps::{FieldError, KeyMap};
use crate::keys::PSBT_GLOBAL_UNSIGNED_TX;
use crate::Psbt;

/// Maximal length of a key, including its type byte.
pub const MAX_KEY_LEN: usize = 1024;
/// Maximal length of a value.
pub const MAX_VALUE_LEN: usize = 4_000_000;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum PsbtErrorCategory {
    /// Magic bytes.
    Magic,
    /// Map structure: missing unsigned transaction or invalid global data.
    Scope,
    /// Key framing.
    Key,
    /// Value framing.
    Value,
    /// Unsigned transaction.
    Tx,
    /// Input map content.
    Input,
    /// Output map content.
    Output,
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum PsbtError {
    /// invalid magic bytes {0}.
    InvalidMagic(Bytes<5>),

    /// global map doesn't start with the unsigned transaction.
    NoUnsignedTx,

    /// unsigned transaction has non-empty scriptSig or witness.
    SignedUnsignedTx,

    /// invalid key: {0}
    Key(DecodeError),

    /// invalid value: {0}
    Value(DecodeError),

    /// invalid unsigned transaction: {0}
    Tx(DecodeError),

    /// invalid global map: {0}
    Global(FieldError),

    /// invalid input #{0}: {1}
    Input(usize, FieldError),

    /// invalid output #{0}: {1}
    Output(usize, FieldError),

    /// {0}
    #[from]
    Data(DecodeError),
}

impl PsbtError {
    pub fn category(&self) -> PsbtErrorCategory {
        match self {
            PsbtError::InvalidMagic(_) => PsbtErrorCategory::Magic,
            PsbtError::NoUnsignedTx | PsbtError::Global(_) => PsbtErrorCategory::Scope,
            PsbtError::Key(_) => PsbtErrorCategory::Key,
            PsbtError::Value(_) | PsbtError::Data(_) => PsbtErrorCategory::Value,
            PsbtError::Tx(_) | PsbtError::SignedUnsignedTx => PsbtErrorCategory::Tx,
            PsbtError::Input(..) => PsbtErrorCategory::Input,
            PsbtError::Output(..) => PsbtErrorCategory::Output,
        }
    }
}

/// Incremental PSBT decoder state.
///
/// Keys and values are read one at a time; a complete pair is applied to the
/// map of the current section right away, so only the pair being read is
/// buffered.
#[derive(Debug)]
pub struct PsbtState {
    magic: FixedReader<5>,
    key: PrefixedReader,
    value: PrefixedReader,
    pending_key: Option<Vec<u8>>,
    section: usize,
    psbt: Option<Psbt>,
}

impl Default for PsbtState {
    fn default() -> Self {
        PsbtState {
            magic: default!(),
            key: PrefixedReader::with_max(MAX_KEY_LEN),
            value: PrefixedReader::with_max(MAX_VALUE_LEN),
            pending_key: None,
            section: 0,
            psbt: None,
        }
    }
}

impl PsbtState {
    /// Index of the map being read: zero for the global map, then inputs
    /// and outputs.
    pub fn section(&self) -> usize { self.section }

    fn apply(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), PsbtError> {
        match self.psbt {
            None => {
                self.psbt = Some(unsigned_tx_pair(&key, &value)?);
                Ok(())
            }
            Some(ref mut psbt) => {
                let inputs = psbt.inputs.len();
                match self.section {
                    0 => psbt.parse_pair(&key, &value).map_err(PsbtError::Global),
                    no if no <= inputs => psbt.inputs[no - 1]
                        .parse_pair(&key, &value)
                        .map_err(|err| PsbtError::Input(no - 1, err)),
                    no => psbt.outputs[no - 1 - inputs]
                        .parse_pair(&key, &value)
                        .map_err(|err| PsbtError::Output(no - 1 - inputs, err)),
                }
            }
        }
    }
}

/// Processes the first pair of the global map, which must hold the unsigned
/// transaction.
fn unsigned_tx_pair(key: &[u8], value: &[u8]) -> Result<Psbt, PsbtError> {
    match key {
        [PSBT_GLOBAL_UNSIGNED_TX] => {}
        [PSBT_GLOBAL_UNSIGNED_TX, ..] => {
            return Err(PsbtError::Global(FieldError::NonEmptyKeyData(PSBT_GLOBAL_UNSIGNED_TX)))
        }
        _ => return Err(PsbtError::NoUnsignedTx),
    }
    let tx = parse_bytes::<Tx>(value).map_err(PsbtError::Tx)?;
    debug!(
        "PSBT unsigned transaction {} with {} inputs and {} outputs",
        tx.txid(),
        tx.inputs.len(),
        tx.outputs.len()
    );
    Psbt::from_unsigned_tx(tx)
}

impl StreamDecode for Psbt {
    type State = PsbtState;
    type Error = PsbtError;

    fn decode_step(
        state: &mut PsbtState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, PsbtError> {
        if !state.magic.is_complete() {
            if !state.magic.feed(src)? {
                return Ok(None);
            }
            let magic = *state.magic.as_bytes();
            if magic != Psbt::MAGIC {
                return Err(PsbtError::InvalidMagic(Bytes::from(magic)));
            }
        }

        loop {
            let key = match state.pending_key.take() {
                Some(key) => key,
                None => {
                    if !state.key.feed(src).map_err(PsbtError::Key)? {
                        return Ok(None);
                    }
                    state.key.take()
                }
            };

            if key.is_empty() {
                let Some(psbt) = &state.psbt else {
                    return Err(PsbtError::NoUnsignedTx);
                };
                state.section += 1;
                trace!("PSBT section {} is complete", state.section - 1);
                if state.section == psbt.sections() {
                    return Ok(state.psbt.take());
                }
                continue;
            }

            if !state.value.feed(src).map_err(PsbtError::Value)? {
                state.pending_key = Some(key);
                return Ok(None);
            }
            let value = state.value.take();
            state.apply(key, value)?;
        }
    }
}

impl ConsensusEncode for Psbt {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(&Psbt::MAGIC)?;
        let mut counter = Psbt::MAGIC.len();
        counter += self.encode_map(writer)?;
        for input in &self.inputs {
            counter += input.encode_map(writer)?;
        }
        for output in &self.outputs {
            counter += output.encode_map(writer)?;
        }
        Ok(counter)
    }
}

#[derive(Clone, Debug, Display, Error, From)]
#[display(inner)]
pub enum PsbtParseError {
    #[from]
    Base64(base64::DecodeError),

    #[from]
    Psbt(PsbtError),
}

impl Psbt {
    pub fn from_base64(s: &str) -> Result<Psbt, PsbtParseError> {
        let data = BASE64_STANDARD.decode(s)?;
        parse_bytes::<Psbt>(&data).map_err(PsbtParseError::from)
    }

    pub fn to_base64(&self) -> String { BASE64_STANDARD.encode(self.to_vec()) }
}

/// PSBT displays Base64-encoded string.
impl Display for Psbt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_base64()) }
}

impl FromStr for Psbt {
    type Err = PsbtParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_base64(s) }
}

#[cfg(test)]
mod test {
    use bc::{Parser, Script, TxIn, TxOut};

    use super::*;

    fn unsigned_tx() -> Tx {
        Tx {
            version: 2,
            inputs: vec![TxIn::new(default!())],
            outputs: vec![TxOut::new(Script::new(), 1000u64)],
            lock_time: 0,
        }
    }

    #[test]
    fn minimal() {
        let psbt = Psbt::from_unsigned_tx(unsigned_tx()).unwrap();
        let data = psbt.to_vec();
        assert_eq!(&data[..5], b"psbt\xFF");
        assert_eq!(&data[data.len() - 3..], &[0, 0, 0]);
        assert_eq!(parse_bytes::<Psbt>(&data).unwrap(), psbt);
        assert_eq!(Psbt::from_str(&psbt.to_string()).unwrap(), psbt);
    }

    #[test]
    fn magic() {
        let mut data = Psbt::from_unsigned_tx(unsigned_tx()).unwrap().to_vec();
        data[4] = 0xFE;
        let err = parse_bytes::<Psbt>(&data).unwrap_err();
        assert_eq!(err, PsbtError::InvalidMagic(Bytes::from(*b"psbt\xFE")));
        assert_eq!(err.category(), PsbtErrorCategory::Magic);
    }

    #[test]
    fn scope() {
        let mut data = Psbt::MAGIC.to_vec();
        data.extend([0x01, 0xFB, 0x04, 0, 0, 0, 0]);
        let err = parse_bytes::<Psbt>(&data).unwrap_err();
        assert_eq!(err, PsbtError::NoUnsignedTx);
        assert_eq!(err.category(), PsbtErrorCategory::Scope);

        let mut data = Psbt::MAGIC.to_vec();
        data.push(0x00);
        assert_eq!(parse_bytes::<Psbt>(&data).unwrap_err(), PsbtError::NoUnsignedTx);
    }

    #[test]
    fn truncated() {
        let data = Psbt::from_unsigned_tx(unsigned_tx()).unwrap().to_vec();
        for len in 0..data.len() {
            let err = parse_bytes::<Psbt>(&data[..len]).unwrap_err();
            assert_eq!(err, PsbtError::Data(DecodeError::UnexpectedEod));
            assert_eq!(err.category(), PsbtErrorCategory::Value);
        }

        let mut parser = Parser::<Psbt>::new();
        for byte in &data {
            assert_eq!(parser.parse_slice(&[*byte]), 1);
        }
        assert!(parser.is_done());
    }

    #[test]
    fn oversized_key() {
        let mut data = Psbt::MAGIC.to_vec();
        data.extend([0xFE, 0xFF, 0xFF, 0xFF, 0x00]);
        let err = parse_bytes::<Psbt>(&data).unwrap_err();
        assert_eq!(
            err,
            PsbtError::Key(DecodeError::OversizedData {
                len: 0xFFFFFF,
                max: MAX_KEY_LEN
            })
        );
        assert_eq!(err.category(), PsbtErrorCategory::Key);
    }
}
