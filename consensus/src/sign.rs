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

use crate::{
    PrivateKey, Sats, Script, ScriptError, ScriptType, SighashError, SighashType, Signature, Tx,
    Witness,
};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum SignError {
    /// {0}
    #[from]
    Sighash(SighashError),

    /// {0}
    #[from]
    Script(ScriptError),

    /// script type {0} is not spent through a segwit program.
    NonSegwitType(ScriptType),
}

impl Tx {
    /// Signs legacy input and fills in its scriptSig with the signature, the
    /// public key and, unless `redeem_script` is a P2PKH script, the redeem
    /// script itself.
    pub fn sign_input(
        &mut self,
        index: usize,
        key: &PrivateKey,
        redeem_script: &Script,
        sighash_type: SighashType,
    ) -> Result<Signature, SignError> {
        let hash = self.sighash_legacy(index, redeem_script, sighash_type)?;
        let sig = key.sign(hash);

        let mut sig_script = Script::new();
        sig_script.push_signature(&sig, sighash_type)?;
        sig_script.push_pubkey(&key.public_key())?;
        if redeem_script.script_type() != ScriptType::P2pkh {
            sig_script.push_script(redeem_script)?;
        }
        self.inputs[index].sig_script = sig_script;
        Ok(sig)
    }

    /// Signs input spending P2PKH output of the key.
    pub fn sign_p2pkh_input(
        &mut self,
        index: usize,
        key: &PrivateKey,
        sighash_type: SighashType,
    ) -> Result<Signature, SignError> {
        let script = Script::p2pkh(&key.public_key());
        self.sign_input(index, key, &script, sighash_type)
    }

    /// Signs segwit v0 input of `script_type` spending `amount` and fills in
    /// its witness and, for nested types, its scriptSig.
    ///
    /// If `redeem_script` is a P2WPKH program the script code is the P2PKH
    /// script of the key and the witness holds the signature and the public
    /// key; otherwise `redeem_script` is a witness script which is used as the
    /// script code and appended to the witness.
    pub fn sign_segwit_input(
        &mut self,
        index: usize,
        key: &PrivateKey,
        redeem_script: &Script,
        amount: Sats,
        script_type: ScriptType,
        sighash_type: SighashType,
    ) -> Result<Signature, SignError> {
        if !script_type.is_segwit() {
            return Err(SignError::NonSegwitType(script_type));
        }
        let pubkey = key.public_key();
        let keyhash = redeem_script.script_type() == ScriptType::P2wpkh;
        let script_code = if keyhash { Script::p2pkh(&pubkey) } else { redeem_script.clone() };

        let hash = self.sighash_segwit(index, &script_code, amount, sighash_type)?;
        let sig = key.sign(hash);

        let mut sig_script = Script::new();
        if script_type.is_nested() {
            if keyhash {
                sig_script.push_script(redeem_script)?;
            } else {
                sig_script.push_script(&Script::p2wsh(redeem_script))?;
            }
        }
        let mut witness = Witness::new();
        witness.push_signature(&sig, sighash_type);
        witness.push_pubkey(&pubkey);
        if !keyhash {
            witness.push_script(redeem_script);
        }

        let input = &mut self.inputs[index];
        input.sig_script = sig_script;
        input.witness = witness;
        Ok(sig)
    }

    /// Signs input spending native or nested P2WPKH output of the key.
    pub fn sign_p2wpkh_input(
        &mut self,
        index: usize,
        key: &PrivateKey,
        amount: Sats,
        script_type: ScriptType,
        sighash_type: SighashType,
    ) -> Result<Signature, SignError> {
        let script = Script::p2wpkh(&key.public_key());
        self.sign_segwit_input(index, key, &script, amount, script_type, sighash_type)
    }
}
