mod common;
use common::*;

use equity::diagnostics::CompileError;

// ---- syntax ----

#[test]
fn missing_of_keyword() {
    let err = compile_err("contract C() locks amount asset { clause c() { unlock amount of asset } }");
    assert!(matches!(err, CompileError::Syntax { .. }));
    assert_eq!(err.to_string(), "Syntax error: expected of, found identifier");
}

#[test]
fn unknown_parameter_type() {
    compile_should_fail_with(
        "contract C(x: Float) locks amount of asset { clause c() { verify x > 0 unlock amount of asset } }",
        "unknown type Float",
    );
}

#[test]
fn stray_character() {
    compile_should_fail_with(
        "contract C() locks amount of asset { clause c() { unlock amount of asset @ } }",
        "unexpected character '@'",
    );
}

#[test]
fn unterminated_clause_body() {
    compile_should_fail_with(
        "contract C() locks amount of asset { clause c() { unlock amount of asset",
        "expected }, found end of file",
    );
}

#[test]
fn empty_source() {
    compile_should_fail_with("", "expected contract, found end of file");
}

// ---- usage ----

#[test]
fn signature_contract_parameter() {
    let err = compile_err(
        "contract C(s: Signature) locks amount of asset { clause c() { verify size(s) > 0 unlock amount of asset } }",
    );
    assert!(matches!(err, CompileError::Usage { .. }));
    assert!(err.to_string().contains("contract parameters cannot have type Signature"));
}

#[test]
fn value_typed_contract_parameter() {
    compile_should_fail_with(
        "contract C(v: Value) locks amount of asset { clause c() { unlock amount of asset } }",
        "Value-typed contract parameter \"v\" must appear in a \"locks\" clause",
    );
}

#[test]
fn unused_contract_parameter() {
    let err = compile_err(
        "contract C(p: Program, q: Program) locks amount of asset { clause c() { lock amount of asset with p } }",
    );
    assert_eq!(err.to_string(), "Usage error: parameter \"q\" is unused");
}

#[test]
fn unused_clause_parameter() {
    compile_should_fail_with(
        "contract C() locks amount of asset { clause c(sig: Signature) { unlock amount of asset } }",
        "parameter \"sig\" is unused in clause \"c\"",
    );
}

// ---- disposal ----

#[test]
fn value_never_disposed() {
    let err = compile_err(
        "contract C(n: Integer) locks amount of asset { clause c() { verify n > 0 } }",
    );
    assert!(matches!(err, CompileError::Disposal { .. }));
    assert_eq!(
        err.to_string(),
        "Disposal error: valueAmount \"amount\" or valueAsset \"asset\" not disposed in clause \"c\""
    );
}

#[test]
fn lock_and_unlock_of_same_value() {
    compile_should_fail_with(
        "contract C(p: Program) locks amount of asset { clause c() { lock amount of asset with p unlock amount of asset } }",
        "disposed multiple times in clause \"c\"",
    );
}

#[test]
fn disposal_in_both_branches_counts_twice() {
    compile_should_fail_with(
        "contract C(p: Program, q: Program, n: Integer) locks amount of asset {
           clause c() {
             if n > 0 { lock amount of asset with p } else { lock amount of asset with q }
           }
         }",
        "disposed multiple times",
    );
}

// ---- type ----

#[test]
fn verify_of_non_boolean() {
    let err = compile_err(
        "contract C(n: Integer) locks amount of asset { clause c() { verify n + 1 unlock amount of asset } }",
    );
    assert!(matches!(err, CompileError::Type { .. }));
    assert_eq!(
        err.to_string(),
        "Type error: expression \"(n + 1)\" in verify statement in clause \"c\" has type \"Integer\", must be Boolean"
    );
}

#[test]
fn lock_with_non_program() {
    compile_should_fail_with(
        "contract C(k: PublicKey) locks amount of asset { clause c() { lock amount of asset with k } }",
        "program \"k\" in lock statement in clause \"c\" has type \"PublicKey\", must be Program",
    );
}

#[test]
fn undefined_variable() {
    compile_should_fail_with(
        "contract C() locks amount of asset { clause c() { verify missing > 0 unlock amount of asset } }",
        "variable \"missing\" is undefined",
    );
}

#[test]
fn builtin_argument_type() {
    compile_should_fail_with(
        "contract C(p: Program) locks amount of asset {
           clause c(sig: Signature) { verify checkTxSig(p, sig) unlock amount of asset } }",
        "argument \"p\" to \"checkTxSig\" has type \"Program\", must be PublicKey",
    );
}

#[test]
fn boolean_equality_rejected() {
    compile_should_fail_with(
        "contract C(a: Boolean, b: Boolean) locks amount of asset { clause c() { verify a == b unlock amount of asset } }",
        "cannot compare Boolean operands",
    );
}

#[test]
fn unlock_of_other_value() {
    compile_should_fail_with(
        "contract C(n: Amount, t: Asset) locks amount of asset {
           clause c(p: Program) { lock amount of asset with p unlock n of t } }",
        "must be the contract value",
    );
}

#[test]
fn assign_to_contract_parameter() {
    compile_should_fail_with(
        "contract C(n: Integer) locks amount of asset { clause c() { assign n = n + 1 verify n > 0 unlock amount of asset } }",
        "assign target \"n\" in clause \"c\" is a contract parameter",
    );
}

#[test]
fn contract_call_arity() {
    compile_should_fail_with(
        "contract Inner(k: PublicKey) locks amount of asset {
           clause s(sig: Signature) { verify checkTxSig(k, sig) unlock amount of asset } }
         contract Outer(k: PublicKey) locks amount of asset {
           clause c() { lock amount of asset with Inner(k, k) } }",
        "\"Inner\" takes 1 arguments, got 2",
    );
}

// ---- structural ----

#[test]
fn contract_used_before_definition() {
    let err = compile_err(
        "contract Outer(k: PublicKey) locks amount of asset {
           clause c() { lock amount of asset with Inner(k) } }
         contract Inner(k: PublicKey) locks amount of asset {
           clause s(sig: Signature) { verify checkTxSig(k, sig) unlock amount of asset } }",
    );
    assert!(matches!(err, CompileError::Structural { .. }));
    assert!(err.to_string().contains("unknown contract \"Inner\" called in clause \"c\""), "{err}");
}

#[test]
fn contract_without_clauses() {
    compile_should_fail_with("contract E() locks amount of asset { }", "contract \"E\" has no clauses");
}
