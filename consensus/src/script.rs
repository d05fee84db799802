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

use amplify::hex::{self, FromHex, ToHex};

use crate::{
    hash160, sha256, ByteSource, ConsensusEncode, DecodeError, OpCode, PrefixedReader, PublicKey,
    Signature, SighashType, StreamDecode,
};

pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Type of a script or of the outputs controlled by a key.
///
/// Only [`ScriptType::P2pkh`], [`ScriptType::P2sh`], [`ScriptType::P2wpkh`]
/// and [`ScriptType::P2wsh`] are recognized from script bytes; the other
/// variants tag keys and redeem scripts.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum ScriptType {
    #[default]
    Unknown,
    /// Script used as-is, without hashing.
    DirectScript,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    #[display("p2sh-p2wpkh")]
    P2shP2wpkh,
    #[display("p2sh-p2wsh")]
    P2shP2wsh,
    Multisig,
}

impl ScriptType {
    /// Detects types spending through a segwit program, either native or
    /// nested into P2SH.
    pub fn is_segwit(self) -> bool {
        matches!(
            self,
            ScriptType::P2wpkh | ScriptType::P2wsh | ScriptType::P2shP2wpkh | ScriptType::P2shP2wsh
        )
    }

    /// Detects types where the segwit program is wrapped into P2SH.
    pub fn is_nested(self) -> bool {
        matches!(self, ScriptType::P2shP2wpkh | ScriptType::P2shP2wsh)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ScriptError {
    /// script length {0} exceeds the maximum of 10000 bytes.
    TooLong(usize),

    /// script of type {0} can't be constructed from this data.
    UnsupportedType(ScriptType),

    /// invalid multisig parameters: {threshold}-of-{keys}.
    InvalidMultisig { threshold: usize, keys: usize },
}

/// Bitcoin script as an owned byte buffer.
#[derive(Wrapper, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self { default!() }

    /// Wraps raw script bytes, checking the size limit.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ScriptError> {
        if bytes.len() > MAX_SCRIPT_SIZE {
            return Err(ScriptError::TooLong(bytes.len()));
        }
        Ok(Script(bytes))
    }

    pub fn as_slice(&self) -> &[u8] { &self.0 }

    pub fn into_bytes(self) -> Vec<u8> { self.0 }

    pub fn p2pkh_from_hash(hash: [u8; 20]) -> Self {
        let mut script = Vec::with_capacity(25);
        script.extend([OpCode::Dup as u8, OpCode::Hash160 as u8, 20]);
        script.extend(hash);
        script.extend([OpCode::EqualVerify as u8, OpCode::CheckSig as u8]);
        Script(script)
    }

    pub fn p2sh_from_hash(hash: [u8; 20]) -> Self {
        let mut script = Vec::with_capacity(23);
        script.extend([OpCode::Hash160 as u8, 20]);
        script.extend(hash);
        script.push(OpCode::Equal as u8);
        Script(script)
    }

    pub fn p2wpkh_from_hash(hash: [u8; 20]) -> Self {
        let mut script = vec![OpCode::PushBytes0 as u8, 20];
        script.extend(hash);
        Script(script)
    }

    pub fn p2wsh_from_hash(hash: [u8; 32]) -> Self {
        let mut script = vec![OpCode::PushBytes0 as u8, 32];
        script.extend(hash);
        Script(script)
    }

    pub fn p2pkh(pubkey: &PublicKey) -> Self { Script::p2pkh_from_hash(pubkey.hash160()) }

    pub fn p2wpkh(pubkey: &PublicKey) -> Self { Script::p2wpkh_from_hash(pubkey.hash160()) }

    pub fn p2sh(script: &Script) -> Self { Script::p2sh_from_hash(hash160(script.as_slice())) }

    pub fn p2wsh(script: &Script) -> Self { Script::p2wsh_from_hash(sha256(script.as_slice())) }

    /// Constructs scriptPubkey of the given type paying to a single key.
    pub fn from_pubkey(pubkey: &PublicKey, script_type: ScriptType) -> Result<Self, ScriptError> {
        Ok(match script_type {
            ScriptType::P2pkh => Script::p2pkh(pubkey),
            ScriptType::P2wpkh => Script::p2wpkh(pubkey),
            ScriptType::P2shP2wpkh => Script::p2sh(&Script::p2wpkh(pubkey)),
            other => return Err(ScriptError::UnsupportedType(other)),
        })
    }

    /// Constructs scriptPubkey of the given type which commits to this script
    /// used as a redeem or witness script.
    pub fn script_pubkey(&self, script_type: ScriptType) -> Result<Self, ScriptError> {
        Ok(match script_type {
            ScriptType::P2sh => Script::p2sh(self),
            ScriptType::P2wsh => Script::p2wsh(self),
            ScriptType::P2shP2wsh => Script::p2sh(&Script::p2wsh(self)),
            ScriptType::DirectScript => self.clone(),
            other => return Err(ScriptError::UnsupportedType(other)),
        })
    }

    /// Constructs bare `m`-of-`n` multisig script.
    pub fn multisig(threshold: usize, keys: &[PublicKey]) -> Result<Self, ScriptError> {
        let invalid = ScriptError::InvalidMultisig {
            threshold,
            keys: keys.len(),
        };
        if threshold == 0 || threshold > keys.len() || keys.len() > 16 {
            return Err(invalid);
        }
        let mut script = Script::new();
        script.push_opcode_byte(OpCode::push_num(threshold as u8).ok_or(invalid.clone())?)?;
        for key in keys {
            script.push_pubkey(key)?;
        }
        script.push_opcode_byte(OpCode::push_num(keys.len() as u8).ok_or(invalid)?)?;
        script.push_opcode(OpCode::CheckMultiSig)?;
        Ok(script)
    }

    fn reserve(&self, extra: usize) -> Result<(), ScriptError> {
        let len = self.0.len() + extra;
        if len > MAX_SCRIPT_SIZE {
            return Err(ScriptError::TooLong(len));
        }
        Ok(())
    }

    pub fn push_opcode(&mut self, op: OpCode) -> Result<(), ScriptError> {
        self.push_opcode_byte(op as u8)
    }

    fn push_opcode_byte(&mut self, op: u8) -> Result<(), ScriptError> {
        self.reserve(1)?;
        self.0.push(op);
        Ok(())
    }

    /// Appends raw bytes without any push opcode.
    pub fn push_slice(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        self.reserve(data.len())?;
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Pushes data onto the stack, selecting the shortest push opcode.
    pub fn push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let len = data.len();
        match len {
            0..=0x4b => {
                self.reserve(1 + len)?;
                self.0.push(len as u8);
            }
            0x4c..=0xff => {
                self.reserve(2 + len)?;
                self.0.extend([OpCode::PushData1 as u8, len as u8]);
            }
            0x100..=0xffff => {
                self.reserve(3 + len)?;
                self.0.push(OpCode::PushData2 as u8);
                self.0.extend((len as u16).to_le_bytes());
            }
            _ => {
                self.reserve(5 + len)?;
                self.0.push(OpCode::PushData4 as u8);
                self.0.extend((len as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
        Ok(())
    }

    pub fn push_pubkey(&mut self, pubkey: &PublicKey) -> Result<(), ScriptError> {
        self.push_data(&pubkey.to_bytes())
    }

    /// Pushes DER signature followed by the sighash type byte.
    pub fn push_signature(
        &mut self,
        sig: &Signature,
        sighash_type: SighashType,
    ) -> Result<(), ScriptError> {
        self.push_data(&sig.to_der_with_sighash(sighash_type))
    }

    /// Pushes serialized script as a single data element (e.g. P2SH redeem
    /// script in scriptSig).
    pub fn push_script(&mut self, script: &Script) -> Result<(), ScriptError> {
        self.push_data(script.as_slice())
    }

    pub fn script_type(&self) -> ScriptType {
        let s = self.as_slice();
        match s.len() {
            25 if s[0] == OpCode::Dup as u8
                && s[1] == OpCode::Hash160 as u8
                && s[2] == 20
                && s[23] == OpCode::EqualVerify as u8
                && s[24] == OpCode::CheckSig as u8 =>
            {
                ScriptType::P2pkh
            }
            23 if s[0] == OpCode::Hash160 as u8 && s[1] == 20 && s[22] == OpCode::Equal as u8 => {
                ScriptType::P2sh
            }
            22 if s[0] == OpCode::PushBytes0 as u8 && s[1] == 20 => ScriptType::P2wpkh,
            34 if s[0] == OpCode::PushBytes0 as u8 && s[1] == 32 => ScriptType::P2wsh,
            _ => ScriptType::Unknown,
        }
    }
}

impl Display for Script {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0.to_hex()) }
}

impl FromStr for Script {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Vec::<u8>::from_hex(s).map(Script) }
}

impl ConsensusEncode for Script {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        self.as_slice().consensus_encode(writer)
    }
}

/// Incremental decoder state for [`Script`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ScriptState(PrefixedReader);

impl Default for ScriptState {
    fn default() -> Self { ScriptState(PrefixedReader::with_max(MAX_SCRIPT_SIZE)) }
}

impl ScriptState {
    pub(crate) fn feed(&mut self, src: &mut dyn ByteSource) -> Result<bool, DecodeError> {
        self.0.feed(src)
    }

    pub(crate) fn take(&mut self) -> Script { Script(self.0.take()) }
}

impl StreamDecode for Script {
    type State = ScriptState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut ScriptState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        if !state.feed(src)? {
            return Ok(None);
        }
        Ok(Some(state.take()))
    }
}
