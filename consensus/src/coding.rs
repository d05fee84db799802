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

use crate::{ByteSink, SourceError, VarInt};

/// Errors happening during consensus decoding.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum DecodeError {
    /// unexpected end of data.
    UnexpectedEod,

    /// data were not consumed entirely: {0} bytes are left.
    DataNotConsumed(usize),

    /// {0}
    #[from]
    Source(SourceError),

    /// non-minimal encoding of a variable-length integer.
    NonMinimalVarInt,

    /// data length {len} exceeds the maximum of {max} bytes.
    OversizedData { len: u64, max: usize },

    /// invalid segwit flag {0:#04x} following the segwit marker.
    InvalidSegwitFlag(u8),

    /// transaction uses segwit serialization but carries no witness data.
    SuperfluousWitness,

    /// invalid DER-encoded signature: {0}
    #[from]
    Der(DerError),

    /// invalid public key encoding.
    InvalidPubkey,

    /// private key is zero or exceeds the curve order.
    InvalidSecret,
}

/// Violations of the strict DER signature encoding.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum DerError {
    /// unexpected tag {0:#04x}.
    InvalidTag(u8),

    /// sequence length {0} is out of range.
    InvalidLength(usize),

    /// integer length {0} exceeds 33 bytes.
    IntegerTooLong(usize),

    /// integer is empty, negative or exceeds 256 bits.
    InvalidInteger,

    /// non-minimal integer encoding.
    NonMinimalInteger,

    /// sequence length does not match the lengths of the integers.
    InconsistentLength,
}

/// Consensus serialization of bitcoin data structures.
pub trait ConsensusEncode {
    /// Writes the object and returns the number of written bytes.
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error>;
}

impl ConsensusEncode for u8 {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(&[*self])?;
        Ok(1)
    }
}

impl ConsensusEncode for u32 {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(&self.to_le_bytes())?;
        Ok(4)
    }
}

impl ConsensusEncode for i32 {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(&self.to_le_bytes())?;
        Ok(4)
    }
}

impl ConsensusEncode for u64 {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(&self.to_le_bytes())?;
        Ok(8)
    }
}

impl<const LEN: usize> ConsensusEncode for [u8; LEN] {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        writer.write_all(self)?;
        Ok(LEN)
    }
}

/// Byte strings are written with a CompactSize length prefix.
impl ConsensusEncode for [u8] {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let len = VarInt::with(self.len()).consensus_encode(writer)?;
        writer.write_all(self)?;
        Ok(len + self.len())
    }
}

/// Writes a CompactSize-prefixed list of objects.
pub fn encode_list<T: ConsensusEncode>(
    items: &[T],
    writer: &mut dyn Write,
) -> Result<usize, io::Error> {
    let mut counter = VarInt::with(items.len()).consensus_encode(writer)?;
    for item in items {
        counter += item.consensus_encode(writer)?;
    }
    Ok(counter)
}

/// [`Write`] adaptor over a [`ByteSink`] which skips the first `offset`
/// bytes of the encoding and stops once the sink is full.
struct SinkWriter<'a> {
    sink: &'a mut dyn ByteSink,
    skip: usize,
    written: usize,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut consumed = 0;
        for byte in buf {
            if self.skip > 0 {
                self.skip -= 1;
            } else if self.sink.write(*byte) {
                self.written += 1;
            } else {
                break;
            }
            consumed += 1;
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Serialization into bounded sinks, available for every consensus-encodable
/// type.
pub trait StreamEncode: ConsensusEncode {
    /// Writes the serialization of the object starting from `offset` until
    /// the sink is full or the object ends. Returns the number of bytes
    /// written; the caller continues with `offset` increased by this number.
    fn serialize(&self, sink: &mut dyn ByteSink, offset: usize) -> usize {
        let mut writer = SinkWriter {
            sink,
            skip: offset,
            written: 0,
        };
        // A full sink terminates encoding with `WriteZero`, which is the
        // regular stop condition here.
        let _ = self.consensus_encode(&mut writer);
        writer.written
    }

    /// Length of the serialized object.
    fn serialized_len(&self) -> usize {
        self.consensus_encode(&mut io::sink())
            .expect("in-memory encoding can't error")
    }

    fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.consensus_encode(&mut buf)
            .expect("in-memory encoding can't error");
        buf
    }

    /// Serialization as a lowercase hex string.
    fn to_consensus_hex(&self) -> String { amplify::hex::ToHex::to_hex(self.to_vec().as_slice()) }
}

impl<T: ConsensusEncode + ?Sized> StreamEncode for T {}
