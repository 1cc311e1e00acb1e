mod common;
use common::*;

use equity::diagnostics::CompileError;
use equity::{instantiate, ContractArg};

const KEY_AND_MINIMUM: &str = "
contract KeyAndMinimum(publicKey: PublicKey, minimum: Integer) locks amount of asset {
  clause spend(sig: Signature) {
    verify checkTxSig(publicKey, sig)
    verify amount >= minimum
    unlock amount of asset
  }
}
";

#[test]
fn non_recursive_program() {
    let contract = compile_last(LOCK_WITH_PUBLIC_KEY);
    let program = instantiate(&contract.body, &contract.params, false, &[ContractArg::String(vec![0xaa, 0xbb])]).unwrap();
    assert_eq!(equity::hex::encode(&program), "02aabb7403ae7cac00c0");
}

#[test]
fn recursive_program_embeds_body_then_depth_over() {
    let contract = compile_last(PRICE_CHANGER);
    let args = [
        ContractArg::Integer(100),
        ContractArg::String(vec![0x01]),
        ContractArg::String(vec![0x02]),
        ContractArg::String(vec![0x03]),
    ];
    let program = instantiate(&contract.body, &contract.params, contract.recursive, &args).unwrap();
    let text = equity::hex::encode(&program);

    // Arguments are pushed last-parameter first.
    assert!(text.starts_with("0103010201010164"), "{text}");
    assert!(text.contains(&equity::hex::encode(&contract.body)));
    assert!(text.ends_with("747800c0"), "{text}");
}

#[test]
fn arguments_must_match_parameter_types() {
    let contract = compile_last(KEY_AND_MINIMUM);
    let err = instantiate(
        &contract.body,
        &contract.params,
        false,
        &[ContractArg::String(vec![0x02; 33]), ContractArg::Boolean(true)],
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Instantiation { .. }));
    assert!(err.to_string().contains("parameter \"minimum\" has type Integer"), "{err}");

    let program = instantiate(
        &contract.body,
        &contract.params,
        false,
        &[ContractArg::String(vec![0x02; 33]), ContractArg::Integer(1000)],
    )
    .unwrap();
    // 1000 is pushed as two little-endian bytes ahead of the 33-byte key.
    assert!(equity::hex::encode(&program).starts_with("02e80321"));
}

#[test]
fn wrong_argument_count() {
    let contract = compile_last(KEY_AND_MINIMUM);
    let err = instantiate(&contract.body, &contract.params, false, &[ContractArg::Integer(1)]).unwrap_err();
    assert_eq!(err.to_string(), "Instantiation error: got 1 arguments, want 2");
}

#[test]
fn small_integers_use_short_pushes() {
    let contract = compile_last(
        "contract Flag(on: Boolean, n: Integer) locks amount of asset {
           clause c() { verify on verify n > 0 unlock amount of asset } }",
    );
    let program =
        instantiate(&contract.body, &contract.params, false, &[ContractArg::Boolean(false), ContractArg::Integer(16)])
            .unwrap();
    assert!(equity::hex::encode(&program).starts_with("600074"));
}

#[test]
fn hash_parameter_takes_string_argument() {
    let contract = compile_last(REVEAL_PREIMAGE);
    let program = instantiate(&contract.body, &contract.params, false, &[ContractArg::String(vec![0u8; 32])]).unwrap();
    assert_eq!(program[0], 0x20);
    assert_eq!(program.len(), 1 + 32 + 1 + 1 + 3 + 1 + 1);
}
