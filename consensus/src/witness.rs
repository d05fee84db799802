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

use std::io::{self, Write};

use crate::{
    ByteSource, ConsensusEncode, DecodeError, PrefixedReader, PublicKey, Script, Signature,
    SighashType, StreamDecode, VarInt, VarIntReader,
};

/// Maximal length of a single witness element. Consensus limits witness data
/// only through the block weight, so this is the weight limit.
pub const MAX_WITNESS_ELEMENT_LEN: usize = 4_000_000;

/// Maximal number of elements in a witness stack; each element takes at
/// least one byte of the block weight.
pub const MAX_WITNESS_ELEMENTS: u64 = MAX_WITNESS_ELEMENT_LEN as u64;

/// Segwit witness: an ordered stack of byte strings.
#[derive(Wrapper, Clone, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
pub struct Witness(Vec<Vec<u8>>);

impl Witness {
    pub fn new() -> Self { default!() }

    pub fn from_elements(elements: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Witness(elements.into_iter().collect())
    }

    pub fn push(&mut self, element: impl Into<Vec<u8>>) { self.0.push(element.into()) }

    pub fn push_pubkey(&mut self, pubkey: &PublicKey) { self.push(pubkey.to_bytes()) }

    pub fn push_signature(&mut self, sig: &Signature, sighash_type: SighashType) {
        self.push(sig.to_der_with_sighash(sighash_type))
    }

    pub fn push_script(&mut self, script: &Script) { self.push(script.as_slice()) }

    pub fn clear(&mut self) { self.0.clear() }

    pub fn elements(&self) -> impl Iterator<Item = &[u8]> { self.0.iter().map(Vec::as_slice) }
}

impl ConsensusEncode for Witness {
    fn consensus_encode(&self, writer: &mut dyn Write) -> Result<usize, io::Error> {
        let mut counter = VarInt::with(self.0.len()).consensus_encode(writer)?;
        for element in &self.0 {
            counter += element.as_slice().consensus_encode(writer)?;
        }
        Ok(counter)
    }
}

/// Incremental decoder state for [`Witness`]. Progress inside the current
/// element is tracked by its own reader, separately from the element count.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct WitnessState {
    count: VarIntReader,
    element: PrefixedReader,
    witness: Witness,
}

impl Default for WitnessState {
    fn default() -> Self {
        WitnessState {
            count: VarIntReader::new(),
            element: PrefixedReader::with_max(MAX_WITNESS_ELEMENT_LEN),
            witness: Witness::new(),
        }
    }
}

impl StreamDecode for Witness {
    type State = WitnessState;
    type Error = DecodeError;

    fn decode_step(
        state: &mut WitnessState,
        src: &mut dyn ByteSource,
    ) -> Result<Option<Self>, DecodeError> {
        if !state.count.feed(src)? {
            return Ok(None);
        }
        let count = state.count.value();
        if count > MAX_WITNESS_ELEMENTS {
            return Err(DecodeError::OversizedData {
                len: count,
                max: MAX_WITNESS_ELEMENTS as usize,
            });
        }
        while (state.witness.len() as u64) < count {
            if !state.element.feed(src)? {
                return Ok(None);
            }
            let element = state.element.take();
            state.witness.push(element);
        }
        Ok(Some(std::mem::take(&mut state.witness)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Parser, ParseStatus, StreamEncode};

    #[test]
    fn chunked() {
        let witness = Witness::from_elements([vec![0x30; 71], vec![], vec![0x02; 33]]);
        let data = witness.to_vec();
        assert_eq!(data.len(), 1 + 72 + 1 + 34);

        for chunk in 1..data.len() {
            let mut parser = Parser::<Witness>::new();
            for part in data.chunks(chunk) {
                assert_eq!(parser.parse_slice(part), part.len());
            }
            assert_eq!(parser.status(), ParseStatus::Done);
            assert_eq!(parser.value(), Some(&witness));
        }
    }

    #[test]
    fn large() {
        let witness = Witness::from_elements([vec![0xAC; 20_000], vec![0x51; 3]]);
        let data = witness.to_vec();
        assert_eq!(crate::parse_bytes::<Witness>(&data), Ok(witness));

        let stack = Witness::from_elements((0..1001).map(|_| vec![0x01]));
        assert_eq!(crate::parse_bytes::<Witness>(&stack.to_vec()), Ok(stack));

        let mut oversized = vec![0x01, 0xFE];
        oversized.extend(((MAX_WITNESS_ELEMENT_LEN + 1) as u32).to_le_bytes());
        assert_eq!(
            crate::parse_bytes::<Witness>(&oversized),
            Err(DecodeError::OversizedData {
                len: MAX_WITNESS_ELEMENT_LEN as u64 + 1,
                max: MAX_WITNESS_ELEMENT_LEN
            })
        );
    }

    #[test]
    fn empty() {
        let mut parser = Parser::<Witness>::new();
        assert_eq!(parser.parse_slice(&[0x00, 0x01]), 1);
        assert_eq!(parser.value(), Some(&Witness::new()));
    }
}
