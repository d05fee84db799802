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

use bc::{PrivateKey, PublicKey, Script, ScriptType, SighashCache, SighashError, Signature};
use derive::{DerivationIndex, DerivationPath, DeriveKey, Xpriv};

use crate::{Input, PartialSig, Psbt};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum PsbtSignError {
    /// PSBT has no input #{0}.
    NoInput(usize),

    /// output spent by input #{0} is unknown.
    UnknownUtxo(usize),

    /// {0}
    #[from]
    Sighash(SighashError),
}

/// Keeps the key derived for the hardened part of the last used path, which
/// is normally shared by all inputs of a wallet.
struct AccountCache<'root> {
    root: &'root Xpriv,
    cached: Option<(Vec<DerivationIndex>, Xpriv)>,
}

impl<'root> AccountCache<'root> {
    fn new(root: &'root Xpriv) -> Self { AccountCache { root, cached: None } }

    fn derive(&mut self, path: &DerivationPath) -> PrivateKey {
        let (prefix, suffix) = path.split_at(path.hardened_prefix());
        let hit = matches!(&self.cached, Some((cached, _)) if cached.as_slice() == prefix);
        if !hit {
            trace!("deriving account key for {} hardened segments", prefix.len());
            self.cached = Some((prefix.to_vec(), self.root.derive_priv(prefix)));
        }
        let account = self.cached.as_ref().map(|(_, key)| key).unwrap_or(self.root);
        account.derive_priv(suffix).private_key().clone()
    }
}

impl Input {
    /// Computes signature hash for the key: a witness script is signed as
    /// segwit v0, a redeem script as legacy unless it is a P2WPKH program,
    /// otherwise the type of the spent output decides.
    pub fn sighash(&self, cache: &SighashCache, pubkey: &PublicKey) -> Result<[u8; 32], PsbtSignError> {
        let Some(prevout) = self.prev_txout() else {
            return Err(PsbtSignError::UnknownUtxo(self.index));
        };
        let sighash_type = self.sighash_type();
        let amount = prevout.value;
        let hash = match (&self.witness_script, &self.redeem_script) {
            (Some(witness_script), _) => {
                cache.segwit_v0(self.index, witness_script, amount, sighash_type)?
            }
            (None, Some(redeem_script)) if redeem_script.script_type() == ScriptType::P2wpkh => {
                cache.segwit_v0(self.index, &Script::p2pkh(pubkey), amount, sighash_type)?
            }
            (None, Some(redeem_script)) => cache.legacy(self.index, redeem_script, sighash_type)?,
            (None, None) if prevout.script_pubkey.script_type() == ScriptType::P2wpkh => {
                cache.segwit_v0(self.index, &Script::p2pkh(pubkey), amount, sighash_type)?
            }
            (None, None) => cache.legacy(self.index, &prevout.script_pubkey, sighash_type)?,
        };
        Ok(hash)
    }

    fn sign_with(&mut self, cache: &SighashCache, key: &PrivateKey) -> Result<Signature, PsbtSignError> {
        let pubkey = key.public_key();
        let hash = self.sighash(cache, &pubkey)?;
        let sig = key.sign(hash);
        self.partial_sigs
            .insert(pubkey, PartialSig::new(sig, self.sighash_type()));
        Ok(sig)
    }
}

impl Psbt {
    /// Signs every input for which the BIP32 derivation records a key of the
    /// `root` master key and returns the number of produced signatures.
    ///
    /// Derived keys not matching the recorded public key and inputs with
    /// unknown spent outputs are skipped.
    pub fn sign(&mut self, root: &Xpriv) -> usize {
        let master_fp = root.fingerprint();
        let cache = SighashCache::new(&self.tx);
        let mut accounts = AccountCache::new(root);
        let mut count = 0usize;

        for input in &mut self.inputs {
            let origins = input
                .bip32_derivation
                .iter()
                .filter(|(_, origin)| origin.master_fp() == master_fp)
                .map(|(pubkey, origin)| (*pubkey, origin.derivation().clone()))
                .collect::<Vec<_>>();
            for (pubkey, path) in origins {
                let mut key = accounts.derive(&path);
                if key.public_key().inner() != pubkey.inner() {
                    debug!("key derived at {path} doesn't match {pubkey}, skipping");
                    continue;
                }
                key.set_compressed(pubkey.is_compressed());
                match input.sign_with(&cache, &key) {
                    Ok(_) => {
                        debug!("signed input #{} with key {pubkey}", input.index);
                        count += 1;
                    }
                    Err(err) => debug!("can't sign input #{}: {err}", input.index),
                }
            }
        }
        count
    }

    /// Signs a single input with the given key, using the sighash type of
    /// the input.
    pub fn sign_input_with(&mut self, index: usize, key: &PrivateKey) -> Result<Signature, PsbtSignError> {
        let cache = SighashCache::new(&self.tx);
        let input = self.inputs.get_mut(index).ok_or(PsbtSignError::NoInput(index))?;
        input.sign_with(&cache, key)
    }

    /// Checks whether the output pays to a key derivable from `key`, according
    /// to its BIP32 derivation records.
    pub fn is_mine(&self, output: usize, key: &impl DeriveKey) -> bool {
        let Some(output) = self.outputs.get(output) else {
            return false;
        };
        output
            .bip32_derivation
            .iter()
            .any(|(pubkey, origin)| key.owns(origin, pubkey))
    }

    /// Checks whether the input spends an output of a key derivable from
    /// `key`.
    pub fn is_mine_input(&self, input: usize, key: &impl DeriveKey) -> bool {
        let Some(input) = self.inputs.get(input) else {
            return false;
        };
        input
            .bip32_derivation
            .iter()
            .any(|(pubkey, origin)| key.owns(origin, pubkey))
    }
}
