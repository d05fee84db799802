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

//! Output descriptor checksums as defined by Bitcoin Core.

const INPUT_CHARSET: &str =
    "0123456789()[],'/*abcdefgh@:$%{}IJKLMNOPQRSTUVWXYZ&+-.;<=>?!^_|~ijklmnopqrstuvwxyzABCDEFGH`#\"\\ ";
const CHECKSUM_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u64; 5] = [0xf5dee51989, 0xa9fdca3312, 0x1bab10e32d, 0x3706b1677a, 0x644d626ffd];

fn poly_mod(mut c: u64, val: u64) -> u64 {
    let c0 = c >> 35;
    c = ((c & 0x7ffffffff) << 5) ^ val;
    for (bit, gen) in GENERATOR.iter().enumerate() {
        if c0 & (1 << bit) != 0 {
            c ^= gen;
        }
    }
    c
}

/// Computes the 8-character checksum of a descriptor. Returns `None` if the
/// descriptor contains characters outside of the descriptor character set.
pub fn descriptor_checksum(descriptor: &str) -> Option<String> {
    let mut c = 1u64;
    let mut cls = 0u64;
    let mut clscount = 0;
    for ch in descriptor.chars() {
        let pos = INPUT_CHARSET.find(ch)? as u64;
        c = poly_mod(c, pos & 31);
        cls = cls * 3 + (pos >> 5);
        clscount += 1;
        if clscount == 3 {
            c = poly_mod(c, cls);
            cls = 0;
            clscount = 0;
        }
    }
    if clscount > 0 {
        c = poly_mod(c, cls);
    }
    for _ in 0..8 {
        c = poly_mod(c, 0);
    }
    c ^= 1;

    let checksum = (0..8)
        .map(|j| CHECKSUM_CHARSET[((c >> (5 * (7 - j))) & 31) as usize] as char)
        .collect();
    Some(checksum)
}

/// Appends the checksum to a descriptor, as in `wpkh(...)#g3tyyea8`.
pub fn add_checksum(descriptor: &str) -> Option<String> {
    descriptor_checksum(descriptor).map(|checksum| format!("{descriptor}#{checksum}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn core_vectors() {
        assert_eq!(
            descriptor_checksum(
                "sh(multi(2,[00000000/111'/222]xprvA1RpRA33e1JQ7ifknakTFpgNXPmW2YvmhqLQYMmrj4xJXXWYpDPS3xz7iAxn8L39njGVyuoseXzU6rcxFLJ8HFsTjSyQbLYnMpCqE2VbFWc,xprv9uPDJpEQgRQfDcW7BkF7eTya6RPxXeJCqCJGHuCJ4GiRVLzkTXBAJMu2qaMWPrS7AANYqdq6vcBcBUdJCVVFceUvJFjaPdGZ2y9WACViL4L/0))"
            )
            .as_deref(),
            Some("ggrsrxfy")
        );
        assert_eq!(
            descriptor_checksum(
                "sh(multi(2,[00000000/111'/222]xpub6ERApfZwUNrhLCkDtcHTcxd75RbzS1ed54G1LkBUHQVHQKqhMkhgbmJbZRkrgZw4koxb5JaHWkY4ALHY2grBGRjaDMzQLcgJvLJuZZvRcEL,xpub68NZiKmJWnxxS6aaHmn81bvJeTESw724CRDs6HbuccFQN9Ku14VQrADWgqbhhTHBaohPX4CjNLf9fq9MYo6oDaPPLPxSb7gwQN3ih19Zm4Y/0))"
            )
            .as_deref(),
            Some("tjg09x5t")
        );
    }

    #[test]
    fn wpkh() {
        let descriptor = "wpkh(03d3b09e954f3e05800bf3bb4aec4734f8d7e3a233d90bfd75c234df702a132bfe)";
        assert_eq!(descriptor_checksum(descriptor).as_deref(), Some("g3tyyea8"));
        assert_eq!(add_checksum(descriptor).unwrap(), format!("{descriptor}#g3tyyea8"));
    }

    #[test]
    fn invalid_chars() {
        assert_eq!(descriptor_checksum("wpkh(é)"), None);
        assert_eq!(descriptor_checksum("pkh(\n)"), None);
        assert_eq!(descriptor_checksum("").map(|s| s.len()), Some(8));
    }
}
