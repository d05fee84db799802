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
    parse_bytes, DecodeError, Outpoint, ParseStatus, Parser, Sats, Script, ScriptType,
    SighashType, StreamEncode, Tx, TxIn, TxOut, Txid,
};
use derive::{Xpriv, Xpub};
use psbt::{ElectrumError, ElectrumTx, ELECTRUM_MAGIC};

const ROOT: &str = "tprv8ZgxMBicQKsPebS6mVaXVsuDvaA1ZXvjQqvUXti579QopGm9sDSzzmsugujLRdChHV9WBuHNBf5Y3tU9VHWEkcdMzCB9qDYGa7EttgSZP9T";

fn account(path: &str) -> Xpriv { Xpriv::from_str(ROOT).unwrap().derive_str(path).unwrap() }

fn unsigned_tx() -> Tx {
    let change = account("m/84h/0h/0h/1/0").private_key().public_key();
    let mut tx = Tx::default();
    tx.inputs.push(TxIn::new(Outpoint::new(Txid::from([0x11; 32]), 0)));
    tx.inputs.push(TxIn::new(Outpoint::new(Txid::from([0x22; 32]), 1)));
    tx.outputs.push(TxOut::new(Script::p2wpkh(&change), 150_000u64));
    tx
}

fn script_sig(xpub: &Xpub, derivation: [u16; 2]) -> Vec<u8> {
    let mut data = vec![0x01, 0xFF, 0x4C, 0x53, 0xFF];
    data.extend(xpub.encode());
    data.extend(derivation[0].to_le_bytes());
    data.extend(derivation[1].to_le_bytes());
    data
}

fn record(xpub: &Xpub, derivation: [u16; 2], amount: u64) -> Vec<u8> {
    let mut data = vec![0xFF, 0x01, 0xFF, 0x4C, 0x53];
    data.extend(amount.to_le_bytes());
    data.extend([0x00, 0x01, 0xFF, 0x4C, 0x53, 0xFF, 0x00]);
    data.extend(xpub.encode());
    data.extend(derivation[0].to_le_bytes());
    data.extend(derivation[1].to_le_bytes());
    data
}

/// Legacy export: the Electrum data replaces the scriptSig of each input.
fn legacy_export(tx: &Tx, inputs: &[(Xpub, [u16; 2])]) -> Vec<u8> {
    let mut tx = tx.clone();
    for (txin, (xpub, derivation)) in tx.inputs.iter_mut().zip(inputs) {
        txin.sig_script = Script::from_bytes(script_sig(xpub, *derivation)).unwrap();
    }
    let mut data = ELECTRUM_MAGIC.to_vec();
    data.extend(tx.to_vec());
    data
}

/// Segwit export: records follow the outputs in place of the witnesses.
fn segwit_export(tx: &Tx, inputs: &[(Xpub, [u16; 2], u64)]) -> Vec<u8> {
    let plain = tx.to_vec();
    let (head, rest) = plain.split_at(4);
    let (body, lock_time) = rest.split_at(rest.len() - 4);
    let mut data = ELECTRUM_MAGIC.to_vec();
    data.extend(head);
    data.extend([0x00, 0x01]);
    data.extend(body);
    for (xpub, derivation, amount) in inputs {
        data.extend(record(xpub, *derivation, *amount));
    }
    data.extend(lock_time);
    data
}

/// Case: legacy export is signed by the account key for its own inputs
#[test]
fn legacy() {
    let account = account("m/44h/0h/0h");
    let foreign = self::account("m/44h/0h/1h").to_xpub();
    let tx = unsigned_tx();
    let data = legacy_export(&tx, &[(account.to_xpub(), [0, 3]), (foreign, [1, 7])]);

    let mut electrum = parse_bytes::<ElectrumTx>(&data).unwrap();
    assert!(!electrum.is_segwit_export());
    assert_eq!(electrum.tx(), &tx);
    assert_eq!(electrum.inputs().len(), 2);
    assert_eq!(electrum.inputs()[0].derivation, [0, 3]);
    assert_eq!(electrum.inputs()[0].amount, None);
    assert_eq!(electrum.inputs()[1].derivation, [1, 7]);
    assert_eq!(electrum.inputs()[1].xpub.core(), foreign.core());
    assert_eq!(electrum.fee(), Sats::ZERO);

    assert_eq!(electrum.sign(&account), 1);

    let mut expected = tx;
    let key = account.derive_str("m/0/3").unwrap();
    expected
        .sign_p2pkh_input(0, key.private_key(), SighashType::all())
        .unwrap();
    assert!(!expected.inputs[0].sig_script.is_empty());
    assert!(expected.inputs[1].sig_script.is_empty());
    assert_eq!(electrum.tx(), &expected);
    assert_eq!(electrum.to_vec(), expected.to_vec());
}

/// Case: segwit export carries amounts and signs P2WPKH inputs
#[test]
fn segwit() {
    let account = account("m/84h/0h/0h");
    let xpub = account.to_xpub().with_script_type(ScriptType::P2wpkh);
    let tx = unsigned_tx();
    let data = segwit_export(&tx, &[(xpub, [0, 0], 100_000), (xpub, [1, 2], 60_000)]);

    let mut electrum = parse_bytes::<ElectrumTx>(&data).unwrap();
    assert!(electrum.is_segwit_export());
    assert_eq!(electrum.tx(), &tx);
    assert_eq!(electrum.inputs()[0].xpub.script_type(), ScriptType::P2wpkh);
    assert_eq!(electrum.inputs()[1].amount, Some(Sats::from(60_000)));
    assert_eq!(electrum.fee(), Sats::from(10_000));

    assert_eq!(electrum.sign(&account), 2);

    let mut expected = tx;
    for (index, (path, amount)) in [("m/0/0", 100_000u64), ("m/1/2", 60_000)].into_iter().enumerate() {
        let key = account.derive_str(path).unwrap();
        expected
            .sign_p2wpkh_input(
                index,
                key.private_key(),
                Sats::from(amount),
                ScriptType::P2wpkh,
                SighashType::all(),
            )
            .unwrap();
    }
    assert!(expected.is_segwit());
    assert_eq!(electrum.tx(), &expected);
    assert_eq!(electrum.into_tx().to_vec(), expected.to_vec());
}

/// Case: unknown amount prevents segwit signing
#[test]
fn segwit_unknown_amount() {
    let account = account("m/84h/0h/0h");
    let xpub = account.to_xpub().with_script_type(ScriptType::P2wpkh);
    let tx = unsigned_tx();
    let data = segwit_export(&tx, &[(xpub, [0, 0], 0), (xpub, [0, 1], 5_000)]);

    let mut electrum = parse_bytes::<ElectrumTx>(&data).unwrap();
    assert_eq!(electrum.inputs()[0].amount, None);
    assert_eq!(electrum.fee(), Sats::ZERO);
    assert_eq!(electrum.sign(&account), 1);
    assert!(electrum.tx().inputs[0].witness.is_empty());
    assert_eq!(electrum.tx().inputs[1].witness.len(), 2);
}

/// Case: keys of another account don't sign
#[test]
fn foreign_account() {
    let xpub = account("m/44h/0h/0h").to_xpub();
    let tx = unsigned_tx();
    let data = legacy_export(&tx, &[(xpub, [0, 0]), (xpub, [0, 1])]);
    let mut electrum = parse_bytes::<ElectrumTx>(&data).unwrap();
    assert_eq!(electrum.sign(&account("m/44h/0h/1h")), 0);
    assert_eq!(electrum.tx(), &tx);
}

/// Case: incremental parsing gives the same result as the one-shot one
#[test]
fn chunked() {
    let xpub = account("m/84h/0h/0h").to_xpub().with_script_type(ScriptType::P2wpkh);
    let data = segwit_export(&unsigned_tx(), &[(xpub, [0, 0], 1), (xpub, [0, 1], 2)]);
    let expected = parse_bytes::<ElectrumTx>(&data).unwrap();
    for chunk in [1, 3, 50, 101, data.len()] {
        let mut parser = Parser::<ElectrumTx>::new();
        for part in data.chunks(chunk) {
            parser.parse_slice(part);
        }
        assert_eq!(parser.status(), ParseStatus::Done, "chunk size {chunk}");
        assert_eq!(parser.value(), Some(&expected));
    }
}

/// Case: malformed exports are rejected
#[test]
fn invalid() {
    let xpub = account("m/84h/0h/0h").to_xpub();
    let tx = unsigned_tx();

    let mut data = legacy_export(&tx, &[(xpub, [0, 0]), (xpub, [0, 1])]);
    data[0] = b'X';
    assert!(matches!(parse_bytes::<ElectrumTx>(&data), Err(ElectrumError::InvalidMagic(_))));

    let mut short = tx.clone();
    short.inputs[0].sig_script = Script::from_bytes(vec![0x01; 86]).unwrap();
    let mut data = ELECTRUM_MAGIC.to_vec();
    data.extend(short.to_vec());
    assert_eq!(parse_bytes::<ElectrumTx>(&data), Err(ElectrumError::InvalidScriptSig(0, 86)));

    let mut data = segwit_export(&tx, &[(xpub, [0, 0], 1), (xpub, [0, 1], 2)]);
    let second = data.len() - 4 - 102;
    data[second] = 0x00;
    assert_eq!(parse_bytes::<ElectrumTx>(&data), Err(ElectrumError::InvalidRecord(1)));

    let mut data = segwit_export(&tx, &[(xpub, [0, 0], 1), (xpub, [0, 1], 2)]);
    let first = data.len() - 4 - 2 * 102;
    data[first + 20..first + 24].copy_from_slice(&[0xFF; 4]);
    assert!(matches!(parse_bytes::<ElectrumTx>(&data), Err(ElectrumError::Xpub(0, _))));
}

/// Case: transaction framing errors inside the envelope surface as decoding
/// errors, including on byte-by-byte input
#[test]
fn body_framing() {
    let xpub = account("m/84h/0h/0h").to_xpub();
    let tx = unsigned_tx();

    let mut data = segwit_export(&tx, &[(xpub, [0, 0], 1), (xpub, [0, 1], 2)]);
    data[ELECTRUM_MAGIC.len() + 5] = 0x02;
    assert_eq!(
        parse_bytes::<ElectrumTx>(&data),
        Err(ElectrumError::Decode(DecodeError::InvalidSegwitFlag(0x02)))
    );

    let mut parser = Parser::<ElectrumTx>::new();
    for byte in &data {
        parser.parse_slice(&[*byte]);
    }
    assert_eq!(parser.status(), ParseStatus::Failed);
    assert_eq!(parser.error(), Some(&ElectrumError::Decode(DecodeError::InvalidSegwitFlag(0x02))));

    // input count above the transaction item limit
    let mut data = ELECTRUM_MAGIC.to_vec();
    data.extend([0x02, 0x00, 0x00, 0x00, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert!(matches!(
        parse_bytes::<ElectrumTx>(&data),
        Err(ElectrumError::Decode(DecodeError::OversizedData { len: 0xFFFF_FFFF, .. }))
    ));
}
