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

//! Partially signed bitcoin transactions (BIP174) parsed incrementally from
//! partial data, signing with BIP32 keys and the Electrum unsigned
//! transaction format.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate tracing;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod keys;
mod data;
mod maps;
mod coders;
mod sign;
mod checksum;
pub mod electrum;

pub use checksum::{add_checksum, descriptor_checksum};
pub use coders::{PsbtError, PsbtErrorCategory, PsbtParseError, PsbtState, MAX_KEY_LEN, MAX_VALUE_LEN};
pub use data::{Input, Output, PartialSig, Psbt};
pub use electrum::{ElectrumError, ElectrumInput, ElectrumState, ElectrumTx, ELECTRUM_MAGIC};
pub use keys::{GlobalKey, InputKey, KeyType, OutputKey};
pub use maps::{FieldError, KeyMap, KeyPair};
pub use sign::PsbtSignError;
