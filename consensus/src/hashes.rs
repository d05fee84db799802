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

use bitcoin_hashes::{hash160, ripemd160, sha256, sha256d, sha512, Hash, HashEngine, Hmac, HmacEngine};
use zeroize::Zeroizing;

pub fn sha256(data: impl AsRef<[u8]>) -> [u8; 32] {
    sha256::Hash::hash(data.as_ref()).to_byte_array()
}

/// Double SHA-256 used for transaction ids and signature hashes.
pub fn sha256d(data: impl AsRef<[u8]>) -> [u8; 32] {
    sha256d::Hash::hash(data.as_ref()).to_byte_array()
}

pub fn ripemd160(data: impl AsRef<[u8]>) -> [u8; 20] {
    ripemd160::Hash::hash(data.as_ref()).to_byte_array()
}

/// RIPEMD-160 of SHA-256, used for public key and script hashes.
pub fn hash160(data: impl AsRef<[u8]>) -> [u8; 20] {
    hash160::Hash::hash(data.as_ref()).to_byte_array()
}

/// HMAC-SHA512 over the concatenation of `data` chunks. The output usually
/// carries key material and is wiped on drop.
pub fn hmac_sha512(key: &[u8], data: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    let mut engine = HmacEngine::<sha512::Hash>::new(key);
    for chunk in data {
        engine.input(chunk);
    }
    Zeroizing::new(Hmac::<sha512::Hash>::from_engine(engine).to_byte_array())
}
