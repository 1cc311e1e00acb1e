//! Snapshot tests for error message formatting.
//!
//! Run `cargo insta review` to review changes.

use insta::assert_snapshot;

fn error_text(source: &str) -> String {
    match equity::compile(source) {
        Ok(_) => panic!("expected compilation to fail"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn syntax_error() {
    let source = r#"
        contract C() locks amount of asset {
            clause c() {
                unlock amount asset
            }
        }
    "#;
    assert_snapshot!(error_text(source), @"Syntax error: expected of, found identifier");
}

#[test]
fn hash_comparison_type_error() {
    let source = r#"
        contract C(h: Hash, n: Integer) locks amount of asset {
            clause c() {
                verify h == n
                unlock amount of asset
            }
        }
    "#;
    assert_snapshot!(
        error_text(source),
        @r#"Type error: operands of "==" in "(h == n)" have mismatched types "Hash" and "Integer""#
    );
}

#[test]
fn usage_error() {
    let source = r#"
        contract C(pk: PublicKey) locks amount of asset {
            clause c(sig: Signature) {
                unlock amount of asset
            }
        }
    "#;
    assert_snapshot!(error_text(source), @r#"Usage error: parameter "pk" is unused"#);
}

#[test]
fn disposal_error() {
    let source = r#"
        contract C(p: Program) locks value of token {
            clause c() {
                lock value of token with p
                unlock value of token
            }
        }
    "#;
    assert_snapshot!(
        error_text(source),
        @r#"Disposal error: valueAmount "value" or valueAsset "token" disposed multiple times in clause "c""#
    );
}

#[test]
fn branch_error() {
    let source = r#"
        contract C(p: Program, n: Integer) locks amount of asset {
            clause c(fee: Amount, feeAsset: Asset) {
                if n > 1 {
                    lock fee of feeAsset with p
                } else {
                }
                unlock amount of asset
            }
        }
    "#;
    assert_snapshot!(
        error_text(source),
        @r#"Structural error: branches of if statement "(n > 1)" in clause "c" lock or unlock different numbers of values (1 and 0) but statements follow it"#
    );
}

#[test]
fn instantiation_error() {
    let contracts = equity::compile(
        "contract C(pk: PublicKey, n: Integer) locks amount of asset {
           clause c(sig: Signature) { verify checkTxSig(pk, sig) verify n > 0 unlock amount of asset } }",
    )
    .unwrap();
    let c = &contracts[0];
    let args = [equity::ContractArg::String(vec![0xab]), equity::ContractArg::Boolean(true)];
    let err = equity::instantiate(&c.body, &c.params, c.recursive, &args).unwrap_err();
    assert_snapshot!(
        err.to_string(),
        @r#"Instantiation error: argument 1 (true) has type boolean, but parameter "n" has type Integer"#
    );
}
