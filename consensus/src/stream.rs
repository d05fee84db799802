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

//! Suspendable parsing protocol.
//!
//! Objects are decoded from a [`ByteSource`] which may provide only a part of
//! the data. A decoder consumes everything available, keeps its progress in an
//! object-specific state and resumes on the next call. [`Parser`] wraps such a
//! decoder together with its status, byte counter and the last error.

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt::Debug;

use zeroize::Zeroize;

use crate::{DecodeError, VarIntReader};

/// Errors reported by byte sources.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SourceError {
    /// no more data in the byte source.
    Exhausted,

    /// invalid hexadecimal character '{0}'.
    InvalidHex(char),
}

/// Source of bytes which may be drained in several rounds.
pub trait ByteSource {
    /// Number of bytes which can be read right now.
    fn available(&self) -> usize;

    /// Reads a single byte. Fails with [`SourceError::Exhausted`] if nothing
    /// is available.
    fn read(&mut self) -> Result<u8, SourceError>;

    /// Reads a byte if any is available.
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        if self.available() == 0 {
            return Ok(None);
        }
        self.read().map(Some)
    }
}

/// Bounded byte sink.
pub trait ByteSink {
    /// Number of bytes which can be written right now.
    fn available(&self) -> usize;

    /// Writes a single byte, returning `false` if the sink is full.
    fn write(&mut self, byte: u8) -> bool;
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self { SliceSource { data, pos: 0 } }

    pub fn position(&self) -> usize { self.pos }

    /// Part of the data which was not read yet.
    pub fn remaining(&self) -> &'a [u8] { &self.data[self.pos..] }
}

impl ByteSource for SliceSource<'_> {
    fn available(&self) -> usize { self.data.len() - self.pos }

    fn read(&mut self) -> Result<u8, SourceError> {
        let byte = *self.data.get(self.pos).ok_or(SourceError::Exhausted)?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Source reading bytes from hexadecimal text. Two characters make one byte;
/// a dangling last character is never reported as available.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HexSource<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> HexSource<'a> {
    pub fn new(text: &'a str) -> Self {
        HexSource {
            text: text.as_bytes(),
            pos: 0,
        }
    }
}

fn hex_nibble(c: u8) -> Result<u8, SourceError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(SourceError::InvalidHex(c as char)),
    }
}

impl ByteSource for HexSource<'_> {
    fn available(&self) -> usize { (self.text.len() - self.pos) / 2 }

    fn read(&mut self) -> Result<u8, SourceError> {
        if self.available() == 0 {
            return Err(SourceError::Exhausted);
        }
        let hi = hex_nibble(self.text[self.pos])?;
        let lo = hex_nibble(self.text[self.pos + 1])?;
        self.pos += 2;
        Ok((hi << 4) | lo)
    }
}

/// Unbounded in-memory sink.
#[derive(Wrapper, Clone, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
pub struct VecSink(Vec<u8>);

impl VecSink {
    pub fn new() -> Self { default!() }
}

impl ByteSink for VecSink {
    fn available(&self) -> usize { usize::MAX - self.0.len() }

    fn write(&mut self, byte: u8) -> bool {
        self.0.push(byte);
        true
    }
}

/// Sink writing into a fixed-size buffer.
#[derive(Eq, PartialEq, Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self { SliceSink { buf, pos: 0 } }

    pub fn written(&self) -> usize { self.pos }
}

impl ByteSink for SliceSink<'_> {
    fn available(&self) -> usize { self.buf.len() - self.pos }

    fn write(&mut self, byte: u8) -> bool {
        let Some(slot) = self.buf.get_mut(self.pos) else {
            return false;
        };
        *slot = byte;
        self.pos += 1;
        true
    }
}

/// Sink writing each byte as two lowercase hexadecimal characters into the
/// inner sink.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct HexSink<S: ByteSink>(S);

impl<S: ByteSink> HexSink<S> {
    pub fn new(inner: S) -> Self { HexSink(inner) }

    pub fn into_inner(self) -> S { self.0 }
}

impl<S: ByteSink> ByteSink for HexSink<S> {
    fn available(&self) -> usize { self.0.available() / 2 }

    fn write(&mut self, byte: u8) -> bool {
        const ALPHABET: &[u8; 16] = b"0123456789abcdef";
        if self.available() == 0 {
            return false;
        }
        self.0.write(ALPHABET[(byte >> 4) as usize]) && self.0.write(ALPHABET[(byte & 0x0F) as usize])
    }
}

/// Source adaptor counting consumed bytes.
pub(crate) struct Counted<'a> {
    inner: &'a mut dyn ByteSource,
    count: usize,
}

impl<'a> Counted<'a> {
    pub fn new(inner: &'a mut dyn ByteSource) -> Self { Counted { inner, count: 0 } }

    pub fn count(&self) -> usize { self.count }
}

impl ByteSource for Counted<'_> {
    fn available(&self) -> usize { self.inner.available() }

    fn read(&mut self) -> Result<u8, SourceError> {
        let byte = self.inner.read()?;
        self.count += 1;
        Ok(byte)
    }
}

/// Reader of a fixed number of bytes. The buffer is wiped on drop and on
/// reset, so it may hold key material.
#[derive(Clone)]
pub struct FixedReader<const LEN: usize> {
    buf: [u8; LEN],
    pos: usize,
}

impl<const LEN: usize> Default for FixedReader<LEN> {
    fn default() -> Self {
        FixedReader {
            buf: [0u8; LEN],
            pos: 0,
        }
    }
}

impl<const LEN: usize> Debug for FixedReader<LEN> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FixedReader<{LEN}>({}/{LEN})", self.pos)
    }
}

impl<const LEN: usize> PartialEq for FixedReader<LEN> {
    fn eq(&self, other: &Self) -> bool { self.pos == other.pos && self.buf == other.buf }
}

impl<const LEN: usize> Eq for FixedReader<LEN> {}

impl<const LEN: usize> Drop for FixedReader<LEN> {
    fn drop(&mut self) { self.buf.zeroize() }
}

impl<const LEN: usize> FixedReader<LEN> {
    pub fn new() -> Self { default!() }

    pub fn feed(&mut self, src: &mut dyn ByteSource) -> Result<bool, DecodeError> {
        while self.pos < LEN {
            let Some(byte) = src.next_byte()? else {
                return Ok(false);
            };
            self.buf[self.pos] = byte;
            self.pos += 1;
        }
        Ok(true)
    }

    #[inline]
    pub fn is_complete(&self) -> bool { self.pos == LEN }

    /// Number of bytes received so far.
    #[inline]
    pub fn position(&self) -> usize { self.pos }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; LEN] { &self.buf }

    pub fn reset(&mut self) {
        self.buf.zeroize();
        self.pos = 0;
    }
}

/// Reader of a CompactSize-prefixed byte string with an upper bound on its
/// length. Nothing is allocated for the declared length in advance.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PrefixedReader {
    len: VarIntReader,
    max: usize,
    data: Vec<u8>,
}

impl PrefixedReader {
    pub fn with_max(max: usize) -> Self {
        PrefixedReader {
            len: VarIntReader::new(),
            max,
            data: vec![],
        }
    }

    pub fn feed(&mut self, src: &mut dyn ByteSource) -> Result<bool, DecodeError> {
        if !self.len.feed(src)? {
            return Ok(false);
        }
        let len = self.len.value();
        if len > self.max as u64 {
            return Err(DecodeError::OversizedData { len, max: self.max });
        }
        while self.data.len() < len as usize {
            let Some(byte) = src.next_byte()? else {
                return Ok(false);
            };
            self.data.push(byte);
        }
        Ok(true)
    }

    /// Length declared by the prefix, if it is already known.
    pub fn declared_len(&self) -> Option<u64> { self.len.is_complete().then(|| self.len.value()) }

    pub fn is_complete(&self) -> bool {
        self.len.is_complete() && self.data.len() as u64 == self.len.value()
    }

    pub fn data(&self) -> &[u8] { &self.data }

    /// Takes the data out of the reader, resetting it for the next string.
    pub fn take(&mut self) -> Vec<u8> {
        self.len.reset();
        std::mem::take(&mut self.data)
    }

    pub fn reset(&mut self) {
        self.len.reset();
        self.data.zeroize();
    }
}

/// Status of an incremental parse.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Display)]
#[display(lowercase)]
pub enum ParseStatus {
    /// Object was parsed completely.
    Done,

    /// More data are required.
    #[default]
    Incomplete,

    /// Malformed data were met; the parser stays failed until reset.
    Failed,
}

/// Objects which can be decoded incrementally from a [`ByteSource`].
pub trait StreamDecode: Sized {
    /// Decoder progress kept between calls.
    type State: Default;
    type Error: StdError;

    /// Consumes bytes from the source. Returns `Ok(None)` when the source ran
    /// out before the object was complete; the next call continues from the
    /// saved state. Must not consume any byte past the end of the object.
    fn decode_step(
        state: &mut Self::State,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, Self::Error>;
}

/// Incremental parser holding an object being decoded together with its
/// status.
pub struct Parser<T: StreamDecode> {
    state: T::State,
    value: Option<T>,
    status: ParseStatus,
    bytes_parsed: usize,
    error: Option<T::Error>,
}

impl<T: StreamDecode> Default for Parser<T> {
    fn default() -> Self {
        Parser {
            state: default!(),
            value: None,
            status: ParseStatus::Incomplete,
            bytes_parsed: 0,
            error: None,
        }
    }
}

impl<T: StreamDecode> Parser<T> {
    pub fn new() -> Self { default!() }

    /// Feeds the parser with the data from the source and returns the number
    /// of consumed bytes.
    ///
    /// A failed parser consumes nothing. A parser which is done starts a new
    /// object from scratch.
    pub fn parse(&mut self, src: &mut dyn ByteSource) -> usize {
        match self.status {
            ParseStatus::Failed => return 0,
            ParseStatus::Done => {
                self.state = default!();
                self.value = None;
                self.bytes_parsed = 0;
            }
            ParseStatus::Incomplete => {}
        }

        let mut counted = Counted::new(src);
        let res = T::decode_step(&mut self.state, &mut counted);
        let consumed = counted.count();
        self.bytes_parsed += consumed;

        match res {
            Ok(Some(value)) => {
                self.value = Some(value);
                self.status = ParseStatus::Done;
                self.state = default!();
            }
            Ok(None) => self.status = ParseStatus::Incomplete,
            Err(err) => {
                debug!(
                    "failed to parse {} after {} bytes: {err}",
                    type_name::<T>(),
                    self.bytes_parsed
                );
                self.status = ParseStatus::Failed;
                self.state = default!();
                self.error = Some(err);
            }
        }
        consumed
    }

    /// Convenience method parsing a byte slice.
    pub fn parse_slice(&mut self, data: &[u8]) -> usize { self.parse(&mut SliceSource::new(data)) }

    #[inline]
    pub fn status(&self) -> ParseStatus { self.status }

    #[inline]
    pub fn is_done(&self) -> bool { self.status == ParseStatus::Done }

    #[inline]
    pub fn is_failed(&self) -> bool { self.status == ParseStatus::Failed }

    /// Number of bytes consumed by the current object.
    #[inline]
    pub fn bytes_parsed(&self) -> usize { self.bytes_parsed }

    pub fn error(&self) -> Option<&T::Error> { self.error.as_ref() }

    pub fn value(&self) -> Option<&T> { self.value.as_ref() }

    pub fn into_value(self) -> Option<T> { self.value }

    /// Discards any progress, the value and the error.
    pub fn reset(&mut self) { *self = Parser::default(); }
}

/// Decodes an object from a byte slice, requiring the slice to hold exactly
/// one complete object.
pub fn parse_bytes<T: StreamDecode>(data: &[u8]) -> Result<T, T::Error>
where T::Error: From<DecodeError> {
    parse_from(&mut SliceSource::new(data))
}

/// Decodes an object from hexadecimal text, requiring the text to hold
/// exactly one complete object.
pub fn parse_hex<T: StreamDecode>(hex: &str) -> Result<T, T::Error>
where T::Error: From<DecodeError> {
    if hex.len() % 2 != 0 {
        return Err(DecodeError::UnexpectedEod.into());
    }
    parse_from(&mut HexSource::new(hex))
}

fn parse_from<T: StreamDecode>(src: &mut dyn ByteSource) -> Result<T, T::Error>
where T::Error: From<DecodeError> {
    let mut state = T::State::default();
    match T::decode_step(&mut state, src)? {
        Some(value) if src.available() == 0 => Ok(value),
        Some(_) => Err(DecodeError::DataNotConsumed(src.available()).into()),
        None => Err(DecodeError::UnexpectedEod.into()),
    }
}
