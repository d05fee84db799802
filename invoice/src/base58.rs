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

//! Base58 and base58-check encodings with the bitcoin alphabet.

use bs58::Alphabet;

/// Errors decoding base58 strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum Base58Error {
    /// invalid base58 data - {0}
    #[from]
    Decode(bs58::decode::Error),

    /// base58 payload has an invalid length of {0} bytes.
    InvalidLength(usize),
}

/// Encodes data into base58 string without checksum.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    bs58::encode(data).with_alphabet(Alphabet::BITCOIN).into_string()
}

/// Decodes base58 string without checksum.
pub fn decode(s: &str) -> Result<Vec<u8>, Base58Error> {
    Ok(bs58::decode(s).with_alphabet(Alphabet::BITCOIN).into_vec()?)
}

/// Encodes data with the four first bytes of its double SHA-256 hash
/// appended.
pub fn encode_check(data: impl AsRef<[u8]>) -> String {
    bs58::encode(data)
        .with_alphabet(Alphabet::BITCOIN)
        .with_check()
        .into_string()
}

/// Decodes base58-check string, verifies and strips the checksum.
pub fn decode_check(s: &str) -> Result<Vec<u8>, Base58Error> {
    Ok(bs58::decode(s)
        .with_alphabet(Alphabet::BITCOIN)
        .with_check(None)
        .into_vec()?)
}
