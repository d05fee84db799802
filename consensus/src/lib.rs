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

//! Bitcoin consensus data structures which can be parsed and serialized
//! incrementally, with bounded memory, from partial data.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate tracing;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod varint;
mod stream;
mod coding;
mod hashes;
mod keys;
mod sigs;
pub mod opcodes;
mod script;
mod witness;
mod tx;
mod sighash;
mod sign;

pub use coding::{encode_list, ConsensusEncode, DecodeError, DerError, StreamEncode};
pub use hashes::{hash160, hmac_sha512, ripemd160, sha256, sha256d};
pub use keys::{PrivateKey, PubkeyState, PublicKey};
pub use opcodes::OpCode;
pub use script::{Script, ScriptError, ScriptState, ScriptType, MAX_SCRIPT_SIZE};
pub use secp256k1;
pub use sighash::{SighashCache, SighashError, SIGHASH_SINGLE_BUG};
pub use sigs::{DerState, NonStandardSighashType, SighashFlag, SighashType, Signature, MAX_DER_LEN};
pub use sign::SignError;
pub use stream::{
    parse_bytes, parse_hex, ByteSink, ByteSource, FixedReader, HexSink, HexSource, ParseStatus,
    Parser, PrefixedReader, SliceSink, SliceSource, SourceError, StreamDecode, VecSink,
};
pub use tx::{
    Outpoint, Sats, Tx, TxBodyState, TxIn, TxInState, TxOut, TxOutState, TxState, Txid,
    MAX_TX_ITEMS, SEQ_FINAL,
};
pub use varint::{VarInt, VarIntReader};
pub use witness::{Witness, WitnessState, MAX_WITNESS_ELEMENTS, MAX_WITNESS_ELEMENT_LEN};
