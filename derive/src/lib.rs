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

//! BIP32 hierarchical deterministic keys: derivation indexes and paths,
//! extended keys, BIP39 mnemonics and purpose conventions.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate tracing;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod index;
mod path;
mod xkey;
mod derive;
pub mod convention;
mod mnemonic;

pub use bc::*;
pub use bip39::Mnemonic;
pub use convention::{network_from_coin_type, ScriptTypeConvention};
pub use derive::DeriveKey;
pub use index::{
    DerivationIndex, HardenedIndex, Idx, IndexError, IndexParseError, NormalIndex,
    HARDENED_INDEX_BOUNDARY,
};
pub use invoice::*;
pub use mnemonic::{
    mnemonic_from_entropy, mnemonic_to_seed, parse_mnemonic, validate_mnemonic, MnemonicError,
};
pub use path::{DerivationParseError, DerivationPath};
pub use xkey::{
    ChainCode, KeyOrigin, XkeyDecodeError, XkeyMeta, XkeyParseError, XkeyState, Xpriv, Xpub,
    XpubCore, XpubFp, XpubId, XKEY_LEN,
};
