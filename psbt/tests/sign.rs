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


use std::str::FromStr;

use bc::{
    parse_bytes, DecodeError, DerError, Outpoint, PublicKey, Sats, Script, SighashType,
    StreamEncode, Tx, TxIn, TxOut, Txid,
};
use derive::{KeyOrigin, Xpriv};
use psbt::{FieldError, Psbt, PsbtError, PsbtErrorCategory};

const ROOT: &str = "tprv8ZgxMBicQKsPebS6mVaXVsuDvaA1ZXvjQqvUXti579QopGm9sDSzzmsugujLRdChHV9WBuHNBf5Y3tU9VHWEkcdMzCB9qDYGa7EttgSZP9T";

const AMOUNT: u64 = 100_000;

fn root() -> Xpriv { Xpriv::from_str(ROOT).unwrap() }

fn pubkey(path: &str) -> PublicKey { root().derive_str(&format!("m/{path}")).unwrap().public_key() }

fn origin(path: &str) -> KeyOrigin {
    KeyOrigin::from_str(&format!("{}/{path}", root().fingerprint())).unwrap()
}

fn spending_tx(prev_output: Outpoint) -> Tx {
    let mut tx = Tx::default();
    tx.inputs.push(TxIn::new(prev_output));
    tx.outputs.push(TxOut::new(Script::p2wpkh(&pubkey("84h/1h/0h/1/0")), 90_000u64));
    tx
}

/// Signs the only input with the root key and checks that the produced
/// partial signature commits to `sighash` and survives re-encoding.
fn sign_and_verify(mut psbt: Psbt, pubkey: PublicKey, sighash: [u8; 32]) -> Psbt {
    assert_eq!(psbt.sign(&root()), 1);
    let partial = &psbt.input(0).unwrap().partial_sigs[&pubkey];
    assert_eq!(partial.sighash_type, psbt.input(0).unwrap().sighash_type());
    assert!(pubkey.verify(&partial.sig, sighash));

    let reparsed = parse_bytes::<Psbt>(&psbt.to_vec()).unwrap();
    assert_eq!(reparsed, psbt);
    psbt
}

/// Case: nested P2WPKH is signed with BIP143 over the P2PKH script code
#[test]
fn p2sh_p2wpkh() {
    let path = "49h/1h/0h/0/0";
    let pubkey = pubkey(path);
    let redeem_script = Script::p2wpkh(&pubkey);
    let tx = spending_tx(Outpoint::new(Txid::from([0x33; 32]), 1));

    let mut psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    let input = psbt.input_mut(0).unwrap();
    input.witness_utxo = Some(TxOut::new(Script::p2sh(&redeem_script), AMOUNT));
    input.redeem_script = Some(redeem_script.clone());
    input.bip32_derivation.insert(pubkey, origin(path));

    let sighash = tx
        .sighash_segwit(0, &Script::p2pkh(&pubkey), Sats::from(AMOUNT), SighashType::all())
        .unwrap();
    let psbt = sign_and_verify(psbt, pubkey, sighash);

    let sig = psbt.input(0).unwrap().partial_sigs[&pubkey].sig;
    let legacy = tx.sighash_legacy(0, &redeem_script, SighashType::all()).unwrap();
    assert!(!pubkey.verify(&sig, legacy));
}

/// Case: P2WSH input is signed with BIP143 over the witness script and the
/// requested sighash type
#[test]
fn p2wsh() {
    let path = "48h/1h/0h/2h/0/0";
    let pubkey = pubkey(path);
    let cosigner = self::pubkey("48h/1h/1h/2h/0/0");
    let witness_script = Script::multisig(1, &[pubkey, cosigner]).unwrap();
    let tx = spending_tx(Outpoint::new(Txid::from([0x44; 32]), 0));

    let mut psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    let input = psbt.input_mut(0).unwrap();
    input.witness_utxo = Some(TxOut::new(Script::p2wsh(&witness_script), AMOUNT));
    input.witness_script = Some(witness_script.clone());
    input.sighash_type = Some(SighashType::single().with_anyone_can_pay());
    input.bip32_derivation.insert(pubkey, origin(path));
    // key of another wallet is left unsigned
    input
        .bip32_derivation
        .insert(cosigner, KeyOrigin::from_str("deadbeef/48h/1h/1h/2h/0/0").unwrap());

    let sighash = tx
        .sighash_segwit(
            0,
            &witness_script,
            Sats::from(AMOUNT),
            SighashType::single().with_anyone_can_pay(),
        )
        .unwrap();
    let psbt = sign_and_verify(psbt, pubkey, sighash);
    assert_eq!(psbt.input(0).unwrap().partial_sigs.len(), 1);
}

/// Case: legacy P2PKH input takes the spent output from the non-witness UTXO
#[test]
fn legacy_p2pkh() {
    let path = "44h/1h/0h/0/3";
    let pubkey = pubkey(path);
    let mut prev_tx = Tx::default();
    prev_tx.inputs.push(TxIn::new(Outpoint::new(Txid::from([0x55; 32]), 0)));
    prev_tx.outputs.push(TxOut::new(Script::p2wpkh(&pubkey), 1_000u64));
    prev_tx.outputs.push(TxOut::new(Script::p2pkh(&pubkey), AMOUNT));
    let tx = spending_tx(Outpoint::new(prev_tx.txid(), 1));

    let mut psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    let input = psbt.input_mut(0).unwrap();
    input.non_witness_utxo = Some(prev_tx);
    input.bip32_derivation.insert(pubkey, origin(path));
    assert_eq!(input.value(), Some(Sats::from(AMOUNT)));

    let sighash = tx.sighash_legacy(0, &Script::p2pkh(&pubkey), SighashType::all()).unwrap();
    sign_and_verify(psbt, pubkey, sighash);
}

/// Case: partial signature with inconsistent DER lengths is rejected as an
/// input error instead of being accepted or crashing the decoder
#[test]
fn malformed_partial_sig() {
    let pubkey = pubkey("84h/1h/0h/0/0");
    let tx = spending_tx(Outpoint::new(Txid::from([0x66; 32]), 0));
    let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
    let mut key = vec![0x02];
    key.extend(pubkey.to_compressed_bytes());
    psbt.input_mut(0)
        .unwrap()
        .unknown
        .insert(key, vec![0x30, 0x06, 0x02, 0x21, 0x01, 0x02, 0x01, 0x01, 0x01]);

    let err = parse_bytes::<Psbt>(&psbt.to_vec()).unwrap_err();
    assert_eq!(err.category(), PsbtErrorCategory::Input);
    assert_eq!(
        err,
        PsbtError::Input(0, FieldError::Decode(DecodeError::Der(DerError::InconsistentLength)))
    );
}
