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
use std::hash::{Hash, Hasher};
use std::io::{self, Write};

use crate::{parse_bytes, ByteSource, ConsensusEncode, DecodeError, DerError, StreamDecode};

/// Maximal length of a DER-encoded signature without the sighash byte.
pub const MAX_DER_LEN: usize = 72;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(uppercase)]
#[repr(u8)]
pub enum SighashFlag {
    /// 0x1: Sign all outputs.
    #[default]
    All = 0x01,
    /// 0x2: Sign no outputs --- anyone can choose the destination.
    None = 0x02,
    /// 0x3: Sign the output whose index matches this input's index. If none
    /// exists, sign the hash
    /// `0000000000000000000000000000000000000000000000000000000000000001`.
    Single = 0x03,
}

/// Sighash type which is not one of the six standard combinations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display("non-standard sighash type {0:#x}")]
pub struct NonStandardSighashType(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct SighashType {
    pub flag: SighashFlag,
    pub anyone_can_pay: bool,
}

impl SighashType {
    pub const ANYONE_CAN_PAY: u8 = 0x80;

    #[inline]
    pub const fn all() -> Self {
        SighashType {
            flag: SighashFlag::All,
            anyone_can_pay: false,
        }
    }
    #[inline]
    pub const fn none() -> Self {
        SighashType {
            flag: SighashFlag::None,
            anyone_can_pay: false,
        }
    }
    #[inline]
    pub const fn single() -> Self {
        SighashType {
            flag: SighashFlag::Single,
            anyone_can_pay: false,
        }
    }

    #[inline]
    pub const fn with_anyone_can_pay(mut self) -> Self {
        self.anyone_can_pay = true;
        self
    }

    /// Parses standard sighash types; any other bits set make the type
    /// non-standard.
    pub fn from_standard_u32(val: u32) -> Result<Self, NonStandardSighashType> {
        let flag = match val & !(Self::ANYONE_CAN_PAY as u32) {
            0x01 => SighashFlag::All,
            0x02 => SighashFlag::None,
            0x03 => SighashFlag::Single,
            _ => return Err(NonStandardSighashType(val)),
        };
        Ok(SighashType {
            flag,
            anyone_can_pay: val & Self::ANYONE_CAN_PAY as u32 != 0,
        })
    }

    #[inline]
    pub fn from_u8(val: u8) -> Result<Self, NonStandardSighashType> {
        Self::from_standard_u32(val as u32)
    }

    #[inline]
    pub const fn to_u8(self) -> u8 {
        let flag = self.flag as u8;
        if self.anyone_can_pay {
            flag | Self::ANYONE_CAN_PAY
        } else {
            flag
        }
    }

    #[inline]
    pub const fn to_u32(self) -> u32 { self.to_u8() as u32 }
}

impl Display for SighashType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.flag, f)?;
        if self.anyone_can_pay {
            f.write_str("|ANYONECANPAY")?;
        }
        Ok(())
    }
}

/// ECDSA signature with the recovery id.
///
/// Equality ignores the recovery id.
#[derive(Copy, Clone, Debug, Default)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    recovery_id: u8,
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool { self.r == other.r && self.s == other.s }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r.hash(state);
        self.s.hash(state);
    }
}

/// Strips leading zeros of a big-endian integer and adds a single zero byte
/// if the highest bit is set.
fn der_int(val: &[u8; 32]) -> Vec<u8> {
    let start = val.iter().position(|b| *b != 0).unwrap_or(31);
    let mut int = Vec::with_capacity(33);
    if val[start] & 0x80 != 0 {
        int.push(0);
    }
    int.extend_from_slice(&val[start..]);
    int
}

fn parse_der_int(int: &[u8]) -> Result<[u8; 32], DerError> {
    match int {
        [] => return Err(DerError::InvalidInteger),
        [first, ..] if first & 0x80 != 0 => return Err(DerError::InvalidInteger),
        [0, second, ..] if second & 0x80 == 0 => return Err(DerError::NonMinimalInteger),
        _ => {}
    }
    let int = if int[0] == 0 && int.len() > 1 { &int[1..] } else { int };
    if int.len() > 32 {
        return Err(DerError::InvalidInteger);
    }
    let mut val = [0u8; 32];
    val[32 - int.len()..].copy_from_slice(int);
    Ok(val)
}

impl Signature {
    pub const fn new(r: [u8; 32], s: [u8; 32]) -> Self { Signature { r, s, recovery_id: 0 } }

    /// Constructs signature from the 64-byte `r ∥ s` form.
    pub fn from_compact(data: [u8; 64]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&data[..32]);
        s.copy_from_slice(&data[32..]);
        Signature::new(r, s)
    }

    /// Parses either the 64-byte `r ∥ s` form or the 65-byte form which has
    /// the recovery id appended.
    pub fn from_bin(data: &[u8]) -> Option<Self> {
        let (compact, recid) = match data.len() {
            64 => (&data[..], 0),
            65 => (&data[..64], data[64]),
            _ => return None,
        };
        let mut buf = [0u8; 64];
        buf.copy_from_slice(compact);
        let mut sig = Signature::from_compact(buf);
        sig.recovery_id = recid;
        Some(sig)
    }

    pub fn from_der(data: &[u8]) -> Result<Self, DecodeError> { parse_bytes(data) }

    #[inline]
    pub const fn r(&self) -> &[u8; 32] { &self.r }
    #[inline]
    pub const fn s(&self) -> &[u8; 32] { &self.s }
    #[inline]
    pub const fn recovery_id(&self) -> u8 { self.recovery_id }
    pub fn set_recovery_id(&mut self, recovery_id: u8) { self.recovery_id = recovery_id }

    /// Checks that neither `r` nor `s` is zero.
    pub fn is_valid(&self) -> bool { self.r != [0u8; 32] && self.s != [0u8; 32] }

    pub fn to_compact(&self) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&self.r);
        buf[32..].copy_from_slice(&self.s);
        buf
    }

    /// 65-byte form with the recovery id appended.
    pub fn to_bin(&self) -> [u8; 65] {
        let mut buf = [0u8; 65];
        buf[..64].copy_from_slice(&self.to_compact());
        buf[64] = self.recovery_id;
        buf
    }

    /// Strict DER encoding with minimal integers.
    pub fn to_der(&self) -> Vec<u8> {
        let r = der_int(&self.r);
        let s = der_int(&self.s);
        let mut der = Vec::with_capacity(6 + r.len() + s.len());
        der.push(0x30);
        der.push((4 + r.len() + s.len()) as u8);
        der.push(0x02);
        der.push(r.len() as u8);
        der.extend_from_slice(&r);
        der.push(0x02);
        der.push(s.len() as u8);
        der.extend_from_slice(&s);
        der
    }

    /// DER encoding followed by the sighash type byte, as used in scripts,
    /// witnesses and PSBTs.
    pub fn to_der_with_sighash(&self, sighash_type: SighashType) -> Vec<u8> {
        let mut der = self.to_der();
        der.push(sighash_type.to_u8());
        der
    }
}

impl ConsensusEncode for Signature {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let der = self.to_der();
        writer.write_all(&der)?;
        Ok(der.len())
    }
}

/// Incremental DER decoder state.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct DerState {
    buf: Vec<u8>,
}

impl DerState {
    /// Validates the last received byte against the structure known so far.
    fn check_last(&self) -> Result<(), DerError> {
        let pos = self.buf.len() - 1;
        let byte = self.buf[pos];
        match pos {
            0 if byte != 0x30 => Err(DerError::InvalidTag(byte)),
            1 if !(6..=70).contains(&byte) => Err(DerError::InvalidLength(byte as usize)),
            2 if byte != 0x02 => Err(DerError::InvalidTag(byte)),
            3 if byte > 33 => Err(DerError::IntegerTooLong(byte as usize)),
            // r must leave room for the s tag, its length and at least one byte
            3 if byte as usize + 5 > self.buf[1] as usize => Err(DerError::InconsistentLength),
            _ => {
                let total = self.buf.get(1).copied().unwrap_or_default() as usize;
                let rlen = self.buf.get(3).copied().unwrap_or_default() as usize;
                if pos == 4 + rlen && byte != 0x02 {
                    Err(DerError::InvalidTag(byte))
                } else if pos == 5 + rlen && byte > 33 {
                    Err(DerError::IntegerTooLong(byte as usize))
                } else if pos == 5 + rlen && 4 + rlen + byte as usize != total {
                    Err(DerError::InconsistentLength)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn finish(&self) -> Result<Signature, DerError> {
        let total = self.buf.get(1).copied().ok_or(DerError::InconsistentLength)? as usize;
        let rlen = self.buf.get(3).copied().ok_or(DerError::InconsistentLength)? as usize;
        let slen = self.buf.get(5 + rlen).copied().ok_or(DerError::InconsistentLength)? as usize;
        if total != 4 + rlen + slen || self.buf.len() != total + 2 {
            return Err(DerError::InconsistentLength);
        }
        let r = self.buf.get(4..4 + rlen).ok_or(DerError::InconsistentLength)?;
        let s = self.buf.get(6 + rlen..).ok_or(DerError::InconsistentLength)?;
        Ok(Signature::new(parse_der_int(r)?, parse_der_int(s)?))
    }
}

impl StreamDecode for Signature {
    type State = DerState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut DerState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        loop {
            if let Some(total) = state.buf.get(1) {
                if state.buf.len() == *total as usize + 2 {
                    return state.finish().map(Some).map_err(DecodeError::from);
                }
            }
            let Some(byte) = src.next_byte()? else {
                return Ok(None);
            };
            state.buf.push(byte);
            state.check_last()?;
        }
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::{FromHex, ToHex};

    use super::*;
    use crate::{parse_hex, Parser, ParseStatus, StreamEncode};

    const DER: &str = "3045022100c9b3c5e5e6fb1e0b2dd4c6d40e5c7b6a2e3d2e8f4a1b5c6d7e8f9a0b1c2d3e4f02203a8f2b1c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8";

    #[test]
    fn der_roundtrip() {
        let sig = parse_hex::<Signature>(DER).unwrap();
        assert_eq!(sig.to_der().to_hex(), DER);
        assert_eq!(sig.serialized_len(), 0x47);
    }

    #[test]
    fn der_minimal() {
        let mut r = [0u8; 32];
        r[31] = 0x7F;
        let mut s = [0u8; 32];
        s[30] = 0x80;
        let sig = Signature::new(r, s);
        assert_eq!(sig.to_der(), Vec::<u8>::from_hex("300802017f0203008000").unwrap());
        assert_eq!(Signature::from_der(&sig.to_der()).unwrap(), sig);
    }

    #[test]
    fn der_violations() {
        assert_eq!(
            parse_hex::<Signature>("31"),
            Err(DecodeError::Der(DerError::InvalidTag(0x31)))
        );
        assert_eq!(
            parse_hex::<Signature>("3047"),
            Err(DecodeError::Der(DerError::InvalidLength(0x47)))
        );
        assert_eq!(
            parse_hex::<Signature>("304502220000"),
            Err(DecodeError::Der(DerError::IntegerTooLong(0x22)))
        );
        assert_eq!(
            parse_hex::<Signature>("3008020200010202007f"),
            Err(DecodeError::Der(DerError::NonMinimalInteger))
        );
        assert_eq!(
            parse_hex::<Signature>("30080201010201010000"),
            Err(DecodeError::Der(DerError::InconsistentLength))
        );
        assert_eq!(
            parse_hex::<Signature>("300602018102017f"),
            Err(DecodeError::Der(DerError::InvalidInteger))
        );
        // r longer than the sequence
        assert_eq!(
            parse_hex::<Signature>("3006022101020101"),
            Err(DecodeError::Der(DerError::InconsistentLength))
        );
        // s longer than the rest of the sequence
        assert_eq!(
            parse_hex::<Signature>("3006020101020201"),
            Err(DecodeError::Der(DerError::InconsistentLength))
        );
        let mut parser = Parser::<Signature>::new();
        parser.parse_slice(&[0x30, 0x06, 0x02, 0x21, 0x01, 0x02, 0x01, 0x01]);
        assert_eq!(parser.status(), ParseStatus::Failed);
        assert_eq!(parser.error(), Some(&DecodeError::Der(DerError::InconsistentLength)));
    }

    #[test]
    fn der_bytewise() {
        let data = Vec::<u8>::from_hex(DER).unwrap();
        let mut parser = Parser::<Signature>::new();
        for byte in &data {
            assert_ne!(parser.status(), ParseStatus::Done);
            assert_eq!(parser.parse_slice(std::slice::from_ref(byte)), 1);
        }
        assert_eq!(parser.status(), ParseStatus::Done);
        assert_eq!(parser.bytes_parsed(), data.len());
        assert_eq!(parser.value(), Some(&Signature::from_der(&data).unwrap()));
    }

    #[test]
    fn failure_is_sticky() {
        let mut parser = Parser::<Signature>::new();
        assert_eq!(parser.parse_slice(&[0x30, 0x02]), 2);
        assert_eq!(parser.status(), ParseStatus::Failed);
        assert_eq!(parser.parse_slice(&[0x30]), 0);
        assert_eq!(parser.error(), Some(&DecodeError::Der(DerError::InvalidLength(2))));
        parser.reset();
        assert_eq!(parser.status(), ParseStatus::Incomplete);
    }

    #[test]
    fn sighash() {
        let ty = SighashType::single().with_anyone_can_pay();
        assert_eq!(ty.to_u32(), 0x83);
        assert_eq!(SighashType::from_u8(0x83), Ok(ty));
        assert_eq!(ty.to_string(), "SINGLE|ANYONECANPAY");
        assert_eq!(SighashType::from_standard_u32(0x04), Err(NonStandardSighashType(4)));
    }
}
