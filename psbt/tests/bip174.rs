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

use amplify::hex::{FromHex, ToHex};
use bc::{parse_bytes, ParseStatus, Parser, Sats, ScriptType, StreamEncode};
use derive::{DeriveKey, KeyOrigin, Xpriv, Xpub};
use psbt::{Psbt, PsbtError, PsbtErrorCategory, PsbtParseError};

/// Unsigned P2WPKH spend with BIP32 derivations for the input and the change
/// output, produced by a testnet wallet.
const PSBT: &str = "cHNidP8BAHICAAAAAUswu6MJzSuKPVEDD3cxwoPYynvQOnUP1xIga/Qyv+icAAAAAAD9////AqCGAQAAAAAAF6kUxD/8BOj9UucJiNpagTRzluc4gvKHErsNAAAAAAAWABTZJKDg5Ayidmusul21PNw16zUy2PDlFwAAAQEfQEIPAAAAAAAWABRw5Uq2fGtsTutqAZqDMypDuQmxmSIGA3s6OgE8GCKOcHDJe7XY0q/i/XSe6e933ErCDCCKR5WoGARkI4xUAACAAQAAgAAAAIAAAAAAAAAAAAAAIgID07CelU8+BYAL87tK7Ec0+NfjojPZC/11wjTfcCoTK/4YBGQjjFQAAIABAACAAAAAgAEAAAAAAAAAAA==";

/// Master key of the wallet which created the PSBT.
const ROOT: &str = "tprv8ZgxMBicQKsPebS6mVaXVsuDvaA1ZXvjQqvUXti579QopGm9sDSzzmsugujLRdChHV9WBuHNBf5Y3tU9VHWEkcdMzCB9qDYGa7EttgSZP9T";

const SIGHASH: &str = "bbeaac8cb45302f761df07f2c60d4d26844ddbbbcf3ca3e55e7aaf3292e9f324";
const SIG: &str = "3045022100b08c792f6c157e44f13e5cab2c31d438eb64102f9fb0393915692669f60ddab602203bd8a3cec7a6d8dce2bc62a116b35c5c06315ac0ada776e93261fb5635717910";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn psbt() -> Psbt { Psbt::from_base64(PSBT).unwrap() }

fn root() -> Xpriv { Xpriv::from_str(ROOT).unwrap() }

fn psbt_error(data: &[u8]) -> PsbtError { parse_bytes::<Psbt>(data).unwrap_err() }

/// Case: parsed maps reflect the transaction and the key origins
#[test]
fn parse() {
    let psbt = psbt();
    assert_eq!(psbt.version, None);
    assert!(psbt.xpubs.is_empty());
    assert_eq!(psbt.sections(), 4);
    assert_eq!(psbt.unsigned_tx().inputs.len(), 1);
    assert_eq!(psbt.unsigned_tx().outputs.len(), 2);

    let input = psbt.input(0).unwrap();
    assert_eq!(input.value(), Some(Sats::from(1_000_000)));
    assert_eq!(input.prev_txout().unwrap().script_pubkey.script_type(), ScriptType::P2wpkh);
    assert!(input.partial_sigs.is_empty());
    assert!(!input.is_finalized());
    let (pubkey, origin) = input.bip32_derivation.first().unwrap();
    assert_eq!(
        pubkey.to_string(),
        "037b3a3a013c18228e7070c97bb5d8d2afe2fd749ee9ef77dc4ac20c208a4795a8"
    );
    assert_eq!(*origin, KeyOrigin::from_str("0464238c/84h/1h/0h/0/0").unwrap());

    assert!(psbt.output(0).unwrap().bip32_derivation.is_empty());
    let (_, origin) = psbt.output(1).unwrap().bip32_derivation.first().unwrap();
    assert_eq!(origin.to_string(), "0464238c/84h/1h/0h/1/0");
    assert!(psbt.output(2).is_none());

    assert_eq!(psbt.input_sum(), Some(Sats::from(1_000_000)));
    assert_eq!(psbt.output_sum(), Sats::from(999_858));
    assert_eq!(psbt.fee(), Sats::from(142));
}

/// Case: serialization reproduces the parsed encoding
#[test]
fn roundtrip() {
    let psbt = psbt();
    assert_eq!(psbt.to_base64(), PSBT);
    assert_eq!(psbt.to_string(), PSBT);
    assert_eq!(Psbt::from_str(PSBT).unwrap(), psbt);
    assert_eq!(psbt.to_vec().len(), 280);
}

/// Case: every chunking of the data produces the same PSBT
#[test]
fn chunked_parsing() {
    let psbt = psbt();
    let data = psbt.to_vec();
    for chunk in [1, 2, 3, 5, 7, 13, 64, data.len()] {
        let mut parser = Parser::<Psbt>::new();
        for part in data.chunks(chunk) {
            parser.parse_slice(part);
        }
        assert_eq!(parser.status(), ParseStatus::Done, "chunk size {chunk}");
        assert_eq!(parser.value(), Some(&psbt));
    }
}

/// Case: the master key signs the input with the BIP143 signature
#[test]
fn sign() {
    init_tracing();
    let mut psbt = psbt();
    assert_eq!(psbt.sign(&root()), 1);

    let input = psbt.input(0).unwrap();
    assert_eq!(input.partial_sigs.len(), 1);
    let (pubkey, sig) = input.partial_sigs.first().unwrap();
    assert_eq!(sig.sig.to_der().to_hex(), SIG);
    assert_eq!(sig.to_vec().to_hex(), format!("{SIG}01"));
    assert!(pubkey.verify(&sig.sig, <[u8; 32]>::from_hex(SIGHASH).unwrap()));

    let reparsed = Psbt::from_base64(&psbt.to_base64()).unwrap();
    assert_eq!(reparsed, psbt);
    assert_eq!(reparsed.fee(), Sats::from(142));
}

/// Case: keys of other wallets don't sign
#[test]
fn sign_foreign() {
    init_tracing();
    let mut psbt = psbt();
    let other = Xpriv::new_master(root().network(), &[0x42; 32]);
    assert_eq!(psbt.sign(&other), 0);
    assert!(psbt.input(0).unwrap().partial_sigs.is_empty());
    assert_eq!(psbt.to_base64(), PSBT);
}

/// Case: explicit key signs the input the same way as the master key
#[test]
fn sign_with_key() {
    let mut psbt = psbt();
    let key = root().derive_str("m/84h/1h/0h/0/0").unwrap();
    let sig = psbt.sign_input_with(0, key.private_key()).unwrap();
    assert_eq!(sig.to_der().to_hex(), SIG);
    assert!(psbt.sign_input_with(1, key.private_key()).is_err());

    let mut signed = self::psbt();
    signed.sign(&root());
    assert_eq!(signed, psbt);
}

/// Case: output ownership is detected with the master and the account keys
#[test]
fn is_mine() {
    let psbt = psbt();
    let root = root();
    assert!(psbt.is_mine(1, &root));
    assert!(!psbt.is_mine(0, &root));
    assert!(!psbt.is_mine(2, &root));
    assert!(psbt.is_mine_input(0, &root));

    let account = root.derive_str("m/84h/1h/0h").unwrap().to_xpub();
    assert_eq!(account.depth(), 3);
    assert!(psbt.is_mine(1, &account));
    assert!(psbt.is_mine_input(0, &account));
    assert!(!psbt.is_mine(0, &account));

    let other = root.derive_str("m/84h/1h/1h").unwrap().to_xpub();
    assert!(!psbt.is_mine(1, &other));

    let (pubkey, origin) = psbt.output(1).unwrap().bip32_derivation.first().unwrap();
    assert_eq!(account.derive_pubkey(origin).map(|pk| pk.to_string()), Some(pubkey.to_string()));
}

/// Case: PSBT created from a transaction has empty maps
#[test]
fn from_unsigned_tx() {
    let tx = psbt().unsigned_tx().clone();
    let psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    assert_eq!(psbt.sections(), 4);
    assert_eq!(psbt.input_sum(), None);
    assert_eq!(psbt.fee(), Sats::ZERO);
    let reparsed = parse_bytes::<Psbt>(&psbt.to_vec()).unwrap();
    assert_eq!(reparsed.unsigned_tx(), &tx);

    let mut signed = tx;
    signed.inputs[0].witness.push(vec![1]);
    assert_eq!(Psbt::from_unsigned_tx(signed), Err(PsbtError::SignedUnsignedTx));
}

/// Case: errors are categorized by the part of the PSBT which is broken
#[test]
fn error_categories() {
    let data = psbt().to_vec();

    let mut broken = data.clone();
    broken[0] = b'x';
    assert_eq!(psbt_error(&broken).category(), PsbtErrorCategory::Magic);

    assert_eq!(psbt_error(&data[..data.len() - 1]).category(), PsbtErrorCategory::Value);
    assert!(matches!(
        Psbt::from_base64("not base64!"),
        Err(PsbtParseError::Base64(_))
    ));

    let tx = psbt().unsigned_tx().clone();

    let mut psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    psbt.version = Some(2);
    assert_eq!(psbt_error(&psbt.to_vec()).category(), PsbtErrorCategory::Scope);

    let mut psbt = Psbt::from_unsigned_tx(tx.clone()).unwrap();
    psbt.input_mut(0).unwrap().non_witness_utxo = Some(tx.clone());
    let err = psbt_error(&psbt.to_vec());
    assert_eq!(err.category(), PsbtErrorCategory::Input);
    assert!(matches!(err, PsbtError::Input(0, _)));

    let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
    psbt.output_mut(1).unwrap().unknown.insert(vec![0x02, 0x01], vec![]);
    let err = psbt_error(&psbt.to_vec());
    assert_eq!(err.category(), PsbtErrorCategory::Output);
    assert!(matches!(err, PsbtError::Output(1, _)));
}

/// Case: unknown keys survive a roundtrip
#[test]
fn unknown_keys() {
    let mut psbt = psbt();
    psbt.unknown.insert(vec![0x70, 0x01], vec![0xAA]);
    psbt.input_mut(0).unwrap().unknown.insert(vec![0x0F], vec![]);
    psbt.output_mut(0).unwrap().unknown.insert(vec![0x0F, 0x0E], vec![1, 2, 3]);
    let reparsed = Psbt::from_base64(&psbt.to_base64()).unwrap();
    assert_eq!(reparsed, psbt);
    assert_eq!(reparsed.unknown.get(&vec![0x70, 0x01]), Some(&vec![0xAA]));
}

/// Case: global xpub with the account origin is kept
#[test]
fn global_xpub() {
    let mut psbt = psbt();
    let account = root().derive_str("m/84h/1h/0h").unwrap().to_xpub();
    let origin = KeyOrigin::from_str("0464238c/84h/1h/0h").unwrap();
    psbt.xpubs.insert(account, origin.clone());
    let reparsed = Psbt::from_base64(&psbt.to_base64()).unwrap();
    let (xpub, found) = reparsed.xpubs.first().unwrap();
    assert_eq!(found, &origin);
    assert_eq!(xpub.core(), account.core());
    assert_eq!(
        Xpub::from_str("vpub5ZPuhnR4mMzpsAf88YuT5CuKRCQsZ9XKtjJEPELX1q93ScRG5DfTVMxv8a2soGUiUwU8SfMSLYqL3eFeMTQZaSoCcBzcBzbUg94Ly4hAihf")
            .unwrap()
            .core(),
        account.core()
    );
}
