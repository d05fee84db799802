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

//! Bitcoin CompactSize (variable-length integer) codec.

use std::io::{self, Write};

use crate::{ByteSource, ConsensusEncode, DecodeError};

/// Bitcoin CompactSize unsigned integer.
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display, From)]
#[display(inner)]
pub struct VarInt(u64);

impl VarInt {
    pub const fn new(value: u64) -> Self { VarInt(value) }

    pub const fn with(len: usize) -> Self { VarInt(len as u64) }

    pub const fn to_u64(self) -> u64 { self.0 }

    /// Number of bytes taken by the encoded value: 1, 3, 5 or 9.
    pub const fn encoded_len(self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x1_0000..=0xFFFF_FFFF => 5,
            _ => 9,
        }
    }
}

impl ConsensusEncode for VarInt {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        match self.0 {
            0..=0xFC => writer.write_all(&[self.0 as u8])?,
            0xFD..=0xFFFF => {
                writer.write_all(&[0xFD])?;
                writer.write_all(&(self.0 as u16).to_le_bytes())?;
            }
            0x1_0000..=0xFFFF_FFFF => {
                writer.write_all(&[0xFE])?;
                writer.write_all(&(self.0 as u32).to_le_bytes())?;
            }
            _ => {
                writer.write_all(&[0xFF])?;
                writer.write_all(&self.0.to_le_bytes())?;
            }
        }
        Ok(self.encoded_len())
    }
}

/// Incremental CompactSize decoder.
///
/// The reader keeps the marker byte and the payload bytes received so far,
/// so it can be fed from any number of partial sources.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct VarIntReader {
    marker: Option<u8>,
    payload: [u8; 8],
    pos: usize,
    value: Option<u64>,
}

impl VarIntReader {
    pub fn new() -> Self { default!() }

    /// Creates reader for which the marker byte was already consumed by the
    /// caller.
    pub fn starting_with(marker: u8) -> Self {
        let mut reader = VarIntReader::new();
        reader.marker = Some(marker);
        reader
    }

    /// Feeds the reader from the source. Returns `true` once the value is
    /// complete; a complete reader never consumes more bytes.
    pub fn feed(&mut self, src: &mut dyn ByteSource) -> Result<bool, DecodeError> {
        if self.value.is_some() {
            return Ok(true);
        }
        let marker = match self.marker {
            Some(marker) => marker,
            None => match src.next_byte()? {
                Some(marker) => {
                    self.marker = Some(marker);
                    marker
                }
                None => return Ok(false),
            },
        };
        let (width, min) = match marker {
            0xFD => (2, 0xFD),
            0xFE => (4, 0x1_0000),
            0xFF => (8, 0x1_0000_0000),
            small => {
                self.value = Some(small as u64);
                return Ok(true);
            }
        };
        while self.pos < width {
            let Some(byte) = src.next_byte()? else {
                return Ok(false);
            };
            self.payload[self.pos] = byte;
            self.pos += 1;
        }
        let value = u64::from_le_bytes(self.payload);
        if value < min {
            return Err(DecodeError::NonMinimalVarInt);
        }
        self.value = Some(value);
        Ok(true)
    }

    #[inline]
    pub fn is_complete(&self) -> bool { self.value.is_some() }

    /// Decoded value; zero while the reader is not complete.
    #[inline]
    pub fn value(&self) -> u64 { self.value.unwrap_or_default() }

    pub fn reset(&mut self) { *self = VarIntReader::new() }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{SliceSource, StreamEncode};

    #[test]
    fn encoded_len() {
        assert_eq!(VarInt::new(0).encoded_len(), 1);
        assert_eq!(VarInt::new(0xFC).encoded_len(), 1);
        assert_eq!(VarInt::new(0xFD).encoded_len(), 3);
        assert_eq!(VarInt::new(0xFFFF).encoded_len(), 3);
        assert_eq!(VarInt::new(0x10000).encoded_len(), 5);
        assert_eq!(VarInt::new(0x1_0000_0000).encoded_len(), 9);
        assert_eq!(VarInt::new(0xFD).to_vec(), vec![0xFD, 0xFD, 0x00]);
        assert_eq!(VarInt::new(0x1234_5678).to_vec(), vec![0xFE, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn bytewise() {
        let data = [0xFEu8, 0x78, 0x56, 0x34, 0x12];
        let mut reader = VarIntReader::new();
        for (no, byte) in data.iter().enumerate() {
            let mut src = SliceSource::new(std::slice::from_ref(byte));
            assert_eq!(reader.feed(&mut src).unwrap(), no == data.len() - 1);
        }
        assert_eq!(reader.value(), 0x1234_5678);
    }

    #[test]
    fn non_minimal() {
        let mut src = SliceSource::new(&[0xFD, 0xFC, 0x00]);
        assert_eq!(VarIntReader::new().feed(&mut src), Err(DecodeError::NonMinimalVarInt));
        let mut src = SliceSource::new(&[0xFE, 0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(VarIntReader::new().feed(&mut src), Err(DecodeError::NonMinimalVarInt));
    }

    #[test]
    fn marker_consumed() {
        let mut src = SliceSource::new(&[0x00, 0x01]);
        let mut reader = VarIntReader::starting_with(0xFD);
        assert!(reader.feed(&mut src).unwrap());
        assert_eq!(reader.value(), 0x100);
    }
}
