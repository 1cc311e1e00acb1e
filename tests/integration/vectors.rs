mod common;
use common::*;

#[test]
fn trivial_lock() {
    assert_eq!(body_hex(TRIVIAL_LOCK), "51");
}

#[test]
fn lock_with_public_key() {
    assert_eq!(body_hex(LOCK_WITH_PUBLIC_KEY), "ae7cac");
}

#[test]
fn lock_with_public_key_hash() {
    assert_eq!(body_hex(LOCK_WITH_PK_HASH), "5279aa887cae7cac");
}

#[test]
fn lock_with_2_of_3_keys() {
    assert_eq!(body_hex(LOCK_WITH_2OF3_KEYS), "537a547a526bae71557a536c7cad");
}

#[test]
fn lock_to_output() {
    assert_eq!(body_hex(LOCK_TO_OUTPUT), "00c3c251547ac1");
}

#[test]
fn trade_offer() {
    assert_eq!(body_hex(TRADE_OFFER), "547a6413000000007b7b51547ac1631a000000547a547aae7cac");
}

#[test]
fn escrowed_transfer() {
    assert_eq!(
        body_hex(ESCROWED_TRANSFER),
        "537a641a000000537a7cae7cac6900c3c251557ac16328000000537a7cae7cac6900c3c251547ac1"
    );
}

#[test]
fn reveal_preimage() {
    assert_eq!(body_hex(REVEAL_PREIMAGE), "7caa87");
}

#[test]
fn price_changer() {
    let contract = compile_last(PRICE_CHANGER);
    assert!(contract.recursive);
    assert_eq!(
        equity::hex::encode(&contract.body),
        "557a6432000000557a5479ae7cac6900c3c25100597a89587a89587a89587a89557a890274787e008901c07ec1633a000000007b537a51567ac1"
    );
}

#[test]
fn define_var() {
    assert_eq!(body_hex(TEST_DEFINE_VAR), "52797b937b7887916987");
}

#[test]
fn assign_var() {
    assert_eq!(body_hex(TEST_ASSIGN_VAR), "7b7b9387");
}

#[test]
fn constant_math() {
    assert_eq!(
        body_hex(TEST_CONSTANT_MATH),
        "765779577a935a93887c0431323330aa887c06737472696e67aa887c91697b011493879a"
    );
}

#[test]
fn opcode_text_matches_body() {
    let contract = compile_last(LOCK_WITH_PK_HASH);
    assert_eq!(contract.opcodes, "2 PICK SHA3 EQUALVERIFY SWAP TXSIGHASH SWAP CHECKSIG");
}

#[test]
fn trade_offer_opcode_text() {
    let contract = compile_last(TRADE_OFFER);
    assert_eq!(
        contract.opcodes,
        "4 ROLL JUMPIF:$clause1 0 ROT ROT 1 4 ROLL CHECKOUTPUT JUMP:$_end $clause1 4 ROLL 4 ROLL TXSIGHASH SWAP CHECKSIG $_end"
    );
}

#[test]
fn non_recursive_contracts_flagged() {
    assert!(!compile_last(TRADE_OFFER).recursive);
    assert!(!compile_last(LOCK_TO_OUTPUT).recursive);
}

#[test]
fn compilation_is_deterministic() {
    for src in [TRADE_OFFER, PRICE_CHANGER, TEST_CONSTANT_MATH] {
        assert_eq!(compile_last(src).body, compile_last(src).body);
    }
}

#[test]
fn predicate_call() {
    let contract = compile_last(
        "contract Delegate(pred: Predicate, n: Integer) locks amount of asset {
           clause c(x: Integer) { verify pred(x, n) unlock amount of asset }
         }",
    );
    assert_eq!(contract.opcodes, "SWAP ROT 2 3 ROLL 0 CHECKPREDICATE");
    assert_eq!(equity::hex::encode(&contract.body), "7c7b52537a00c0");
}

#[test]
fn size_builtin() {
    let contract = compile_last(
        "contract Sized(s: String, n: Integer) locks amount of asset {
           clause c() { verify size(s) == n unlock amount of asset }
         }",
    );
    assert_eq!(contract.opcodes, "SIZE NIP EQUAL");
    assert_eq!(equity::hex::encode(&contract.body), "827787");
}

#[test]
fn concat_builtins() {
    let contract = compile_last(
        "contract Joined(a: String, b: String) locks amount of asset {
           clause c() { verify concat(a, b) == 0x0102 unlock amount of asset }
         }",
    );
    assert_eq!(contract.opcodes, "CAT 0x0102 EQUAL");
    assert_eq!(equity::hex::encode(&contract.body), "7e02010287");

    let contract = compile_last(
        "contract Pushed(a: String, b: String) locks amount of asset {
           clause c() { verify concatpush(a, b) == 0x0102 unlock amount of asset }
         }",
    );
    assert_eq!(contract.opcodes, "CATPUSHDATA 0x0102 EQUAL");
}

#[test]
fn block_height_builtins() {
    let contract = compile_last(
        "contract Window(after: Integer, before: Integer) locks amount of asset {
           clause c() { verify above(after) verify below(before) unlock amount of asset }
         }",
    );
    assert_eq!(contract.opcodes, "BLOCKHEIGHT LESSTHAN VERIFY BLOCKHEIGHT GREATERTHAN");
    assert_eq!(equity::hex::encode(&contract.body), "cd9f69cda0");
}

#[test]
fn arithmetic_builtins() {
    let contract = compile_last(
        "contract Bounds(a: Integer, b: Integer) locks amount of asset {
           clause c() { verify max(a, b) > abs(min(a, b)) unlock amount of asset }
         }",
    );
    // Both operands are read twice: copied for max, consumed for min.
    assert_eq!(contract.opcodes, "2DUP MAX ROT ROT MIN ABS GREATERTHAN");
    assert_eq!(equity::hex::encode(&contract.body), "6ea47b7ba390a0");
}
