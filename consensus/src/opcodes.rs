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

/// Script opcodes used by the standard output templates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum OpCode {
    /// Push an empty array onto the stack; also the segwit v0 version byte.
    PushBytes0 = 0x00,
    /// Read the next byte as N; push the next N bytes as an array onto the stack.
    PushData1 = 0x4c,
    /// Read the next 2 bytes as N; push the next N bytes as an array onto the stack.
    PushData2 = 0x4d,
    /// Read the next 4 bytes as N; push the next N bytes as an array onto the stack.
    PushData4 = 0x4e,
    PushNum1 = 0x51,
    PushNum16 = 0x60,
    Return = 0x6a,
    Dup = 0x76,
    Equal = 0x87,
    EqualVerify = 0x88,
    Hash160 = 0xa9,
    CheckSig = 0xac,
    CheckSigVerify = 0xad,
    CheckMultiSig = 0xae,
    CheckMultiSigVerify = 0xaf,
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl OpCode {
    /// Opcode byte pushing a small number in range `1..=16`.
    pub fn push_num(n: u8) -> Option<u8> {
        (1..=16)
            .contains(&n)
            .then(|| OpCode::PushNum1 as u8 + n - 1)
    }

    /// Decodes number pushed by `OP_1`...`OP_16`.
    pub fn decode_num(byte: u8) -> Option<u8> {
        (OpCode::PushNum1 as u8..=OpCode::PushNum16 as u8)
            .contains(&byte)
            .then(|| byte - OpCode::PushNum1 as u8 + 1)
    }
}
