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

//! Incremental, memory-bounded bitcoin codecs, hierarchical deterministic
//! keys and PSBT signing.
//!
//! The crate re-exports the workspace members: consensus data structures
//! and their streaming codecs (`bc`), network parameters and addresses
//! (`invoice`), extended keys and derivation (`derive`) and partially signed
//! transactions (`psbt`).

pub use derive::*;
pub use psbt::{
    add_checksum, descriptor_checksum, electrum, ElectrumError, ElectrumInput, ElectrumState,
    ElectrumTx, FieldError, GlobalKey, Input, InputKey, KeyMap, KeyPair, KeyType, Output,
    OutputKey, PartialSig, Psbt, PsbtError, PsbtErrorCategory, PsbtParseError, PsbtSignError,
    PsbtState, ELECTRUM_MAGIC, MAX_KEY_LEN, MAX_VALUE_LEN,
};
