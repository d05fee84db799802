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

//! Signature hashes for legacy (pre-segwit) and BIP143 (segwit v0) inputs.

use crate::{
    sha256d, ConsensusEncode, Sats, Script, SighashFlag, SighashType, Tx, TxIn, TxOut,
};

/// Hash signed by `SIGHASH_SINGLE` legacy inputs which have no matching
/// output: number one in little-endian byte order.
pub const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SighashError {
    /// input index {index} is out of range for a transaction with {count} inputs.
    InvalidInputIndex { index: usize, count: usize },
}

/// Cache of the BIP143 transaction-wide hashes, which are shared by all
/// inputs signed with the same sighash type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SighashCache<'tx> {
    tx: &'tx Tx,
    hash_prevouts: [u8; 32],
    hash_sequence: [u8; 32],
    hash_outputs: [u8; 32],
}

fn hash_encoded<'a, T: ConsensusEncode + 'a>(items: impl IntoIterator<Item = &'a T>) -> [u8; 32] {
    let mut buf = vec![];
    for item in items {
        item.consensus_encode(&mut buf)
            .expect("in-memory encoding can't error");
    }
    sha256d(buf)
}

impl<'tx> SighashCache<'tx> {
    pub fn new(tx: &'tx Tx) -> Self {
        SighashCache {
            tx,
            hash_prevouts: hash_encoded(tx.inputs.iter().map(|input| &input.prev_output)),
            hash_sequence: hash_encoded(tx.inputs.iter().map(|input| &input.sequence)),
            hash_outputs: hash_encoded(&tx.outputs),
        }
    }

    pub fn tx(&self) -> &'tx Tx { self.tx }

    fn check_index(&self, index: usize) -> Result<&'tx TxIn, SighashError> {
        self.tx
            .inputs
            .get(index)
            .ok_or(SighashError::InvalidInputIndex {
                index,
                count: self.tx.inputs.len(),
            })
    }

    /// Computes BIP143 signature hash for a segwit v0 input spending `amount`
    /// with the given script code.
    pub fn segwit_v0(
        &self,
        index: usize,
        script_code: &Script,
        amount: Sats,
        sighash_type: SighashType,
    ) -> Result<[u8; 32], SighashError> {
        let input = self.check_index(index)?;
        let zero = [0u8; 32];

        let hash_prevouts = if sighash_type.anyone_can_pay { zero } else { self.hash_prevouts };
        let hash_sequence =
            if !sighash_type.anyone_can_pay && sighash_type.flag == SighashFlag::All {
                self.hash_sequence
            } else {
                zero
            };
        let hash_outputs = match sighash_type.flag {
            SighashFlag::All => self.hash_outputs,
            SighashFlag::Single if index < self.tx.outputs.len() => {
                hash_encoded([&self.tx.outputs[index]])
            }
            _ => zero,
        };

        let mut preimage = Vec::with_capacity(156 + script_code.len());
        preimage.extend(self.tx.version.to_le_bytes());
        preimage.extend(hash_prevouts);
        preimage.extend(hash_sequence);
        input
            .prev_output
            .consensus_encode(&mut preimage)
            .and_then(|_| script_code.consensus_encode(&mut preimage))
            .expect("in-memory encoding can't error");
        preimage.extend(amount.sats().to_le_bytes());
        preimage.extend(input.sequence.to_le_bytes());
        preimage.extend(hash_outputs);
        preimage.extend(self.tx.lock_time.to_le_bytes());
        preimage.extend(sighash_type.to_u32().to_le_bytes());
        Ok(sha256d(preimage))
    }

    /// Computes legacy signature hash; legacy hashes don't use the cache.
    pub fn legacy(
        &self,
        index: usize,
        script_code: &Script,
        sighash_type: SighashType,
    ) -> Result<[u8; 32], SighashError> {
        self.tx.sighash_legacy(index, script_code, sighash_type)
    }
}

impl Tx {
    /// Computes legacy signature hash, with `script_code` placed into the
    /// scriptSig of the input being signed.
    pub fn sighash_legacy(
        &self,
        index: usize,
        script_code: &Script,
        sighash_type: SighashType,
    ) -> Result<[u8; 32], SighashError> {
        let tx = self;
        let input = tx.inputs.get(index).ok_or(SighashError::InvalidInputIndex {
            index,
            count: tx.inputs.len(),
        })?;

        if sighash_type.flag == SighashFlag::Single && index >= tx.outputs.len() {
            return Ok(SIGHASH_SINGLE_BUG);
        }

        let inputs = if sighash_type.anyone_can_pay {
            vec![TxIn {
                prev_output: input.prev_output,
                sig_script: script_code.clone(),
                sequence: input.sequence,
                witness: none!(),
            }]
        } else {
            tx.inputs
                .iter()
                .enumerate()
                .map(|(no, txin)| {
                    let current = no == index;
                    TxIn {
                        prev_output: txin.prev_output,
                        sig_script: if current { script_code.clone() } else { none!() },
                        sequence: if !current && sighash_type.flag != SighashFlag::All {
                            0
                        } else {
                            txin.sequence
                        },
                        witness: none!(),
                    }
                })
                .collect()
        };

        let outputs = match sighash_type.flag {
            SighashFlag::All => tx.outputs.clone(),
            SighashFlag::None => vec![],
            SighashFlag::Single => {
                let mut outputs = vec![
                    TxOut {
                        value: Sats::from(u64::MAX),
                        script_pubkey: none!(),
                    };
                    index
                ];
                outputs.push(tx.outputs[index].clone());
                outputs
            }
        };

        let stripped = Tx {
            version: tx.version,
            inputs,
            outputs,
            lock_time: tx.lock_time,
        };
        let mut preimage = Vec::with_capacity(stripped.base_len() + 4);
        stripped
            .encode_with(&mut preimage, false)
            .expect("in-memory encoding can't error");
        preimage.extend(sighash_type.to_u32().to_le_bytes());
        Ok(sha256d(preimage))
    }

    /// BIP143 signature hash for the segwit v0 input at `index`. Use
    /// [`SighashCache`] when signing several inputs.
    pub fn sighash_segwit(
        &self,
        index: usize,
        script_code: &Script,
        amount: Sats,
        sighash_type: SighashType,
    ) -> Result<[u8; 32], SighashError> {
        SighashCache::new(self).segwit_v0(index, script_code, amount, sighash_type)
    }
}
