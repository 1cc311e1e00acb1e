#![allow(dead_code)]

use std::process::Command;

use equity::diagnostics::CompileError;
use equity::parser::ast::Contract;

pub fn equityc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_equityc"))
}

/// Compiles `source` and returns the top-level (last) contract.
pub fn compile_last(source: &str) -> Contract {
    let mut contracts = equity::compile(source).unwrap_or_else(|e| panic!("compilation failed: {e}"));
    contracts.pop().expect("no contracts")
}

pub fn body_hex(source: &str) -> String {
    equity::hex::encode(&compile_last(source).body)
}

pub fn compile_err(source: &str) -> CompileError {
    match equity::compile(source) {
        Ok(_) => panic!("expected compilation to fail"),
        Err(e) => e,
    }
}

pub fn compile_should_fail_with(source: &str, expected: &str) {
    let msg = compile_err(source).to_string();
    assert!(msg.contains(expected), "expected error containing '{expected}', got: {msg}");
}

pub const TRIVIAL_LOCK: &str = "
contract TrivialLock() locks amount of asset {
  clause trivialUnlock() {
    unlock amount of asset
  }
}
";

pub const LOCK_WITH_PUBLIC_KEY: &str = "
contract LockWithPublicKey(publicKey: PublicKey) locks amount of asset {
  clause unlockWithSig(sig: Signature) {
    verify checkTxSig(publicKey, sig)
    unlock amount of asset
  }
}
";

pub const LOCK_WITH_PK_HASH: &str = "
contract LockWithPublicKeyHash(pubKeyHash: Hash) locks amount of asset {
  clause spend(pubKey: PublicKey, sig: Signature) {
    verify sha3(pubKey) == pubKeyHash
    verify checkTxSig(pubKey, sig)
    unlock amount of asset
  }
}
";

pub const LOCK_WITH_2OF3_KEYS: &str = "
contract LockWith3Keys(pubkey1, pubkey2, pubkey3: PublicKey) locks amount of asset {
  clause unlockWith2Sigs(sig1, sig2: Signature) {
    verify checkTxMultiSig([pubkey1, pubkey2, pubkey3], [sig1, sig2])
    unlock amount of asset
  }
}
";

pub const LOCK_TO_OUTPUT: &str = "
contract LockToOutput(address: Program) locks amount of asset {
  clause relock() {
    lock amount of asset with address
  }
}
";

pub const TRADE_OFFER: &str = "
contract TradeOffer(requestedAsset: Asset, requestedAmount: Amount, sellerProgram: Program, sellerKey: PublicKey) locks amount of asset {
  clause trade() {
    lock requestedAmount of requestedAsset with sellerProgram
    unlock amount of asset
  }
  clause cancel(sellerSig: Signature) {
    verify checkTxSig(sellerKey, sellerSig)
    unlock amount of asset
  }
}
";

pub const ESCROWED_TRANSFER: &str = "
contract EscrowedTransfer(agent: PublicKey, sender: Program, recipient: Program) locks amount of asset {
  clause approve(sig: Signature) {
    verify checkTxSig(agent, sig)
    lock amount of asset with recipient
  }
  clause reject(sig: Signature) {
    verify checkTxSig(agent, sig)
    lock amount of asset with sender
  }
}
";

pub const REVEAL_PREIMAGE: &str = "
contract RevealPreimage(hash: Hash) locks amount of asset {
  clause reveal(string: String) {
    verify sha3(string) == hash
    unlock amount of asset
  }
}
";

pub const PRICE_CHANGER: &str = "
contract PriceChanger(askAmount: Amount, askAsset: Asset, sellerKey: PublicKey, sellerProg: Program) locks valueAmount of valueAsset {
  clause changePrice(newAmount: Amount, newAsset: Asset, sig: Signature) {
    verify checkTxSig(sellerKey, sig)
    lock valueAmount of valueAsset with PriceChanger(newAmount, newAsset, sellerKey, sellerProg)
  }
  clause redeem() {
    lock askAmount of askAsset with sellerProg
    unlock valueAmount of valueAsset
  }
}
";

pub const TEST_DEFINE_VAR: &str = "
contract TestDefineVar(result: Integer) locks valueAmount of valueAsset {
  clause LockWithMath(left: Integer, right: Integer) {
    define calculate: Integer = left + right
    verify left != calculate
    verify result == calculate
    unlock valueAmount of valueAsset
  }
}
";

pub const TEST_ASSIGN_VAR: &str = "
contract TestAssignVar(result: Integer) locks valueAmount of valueAsset {
  clause check(first: Integer, second: Integer) {
    assign first = first + second
    verify result == first
    unlock valueAmount of valueAsset
  }
}
";

pub const TEST_CONSTANT_MATH: &str = "
contract TestConstantMath(result: Integer, hashByte: Hash, hashStr: Hash, outcome: Boolean) locks valueAmount of valueAsset {
  clause calculation(left: Integer, right: Integer, boolResult: Boolean) {
    verify result == left + right + 10
    verify hashByte == sha3(0x31323330)
    verify hashStr == sha3('string')
    verify !outcome
    verify boolResult && (result == left + 20)
    unlock valueAmount of valueAsset
  }
}
";
