mod common;
use common::*;

use equity::imports::MemoryProvider;

const INNER: &str = "
contract LockWithPublicKey(publicKey: PublicKey) locks amount of asset {
  clause unlockWithSig(sig: Signature) {
    verify checkTxSig(publicKey, sig)
    unlock amount of asset
  }
}
";

const OUTER: &str = "
import 'keys.equity'
contract Forward(pk: PublicKey) locks amount of asset {
  clause relock() {
    lock amount of asset with LockWithPublicKey(pk)
  }
}
";

#[test]
fn imported_contract_is_callable() {
    let provider: MemoryProvider = [("keys.equity", INNER)].into_iter().collect();
    let contracts = equity::compile_with_provider(OUTER, None, &provider).unwrap();
    assert_eq!(contracts.len(), 2);
    assert_eq!(contracts[0].name, "LockWithPublicKey");
    assert_eq!(contracts[1].name, "Forward");
    assert_eq!(contracts[1].clauses[0].contracts, vec!["LockWithPublicKey".to_string()]);

    // The imported body is embedded in the caller's program.
    let inner_body = equity::hex::encode(&contracts[0].body);
    assert!(equity::hex::encode(&contracts[1].body).contains(&inner_body));
}

#[test]
fn import_matches_inline_definition() {
    let provider: MemoryProvider = [("keys.equity", INNER)].into_iter().collect();
    let imported = equity::compile_with_provider(OUTER, None, &provider).unwrap();
    let inline = format!("{INNER}\n{}", OUTER.replace("import 'keys.equity'", ""));
    let inlined = equity::compile(&inline).unwrap();
    assert_eq!(imported[1].body, inlined[1].body);
}

#[test]
fn missing_import() {
    compile_should_fail_with(OUTER, "Import error: \"keys.equity\": not found");
}

#[test]
fn circular_import() {
    let provider: MemoryProvider = [
        ("a.equity", "import 'b.equity'\n contract A() locks v of t { clause x() { unlock v of t } }"),
        ("b.equity", "import 'a.equity'\n contract B() locks v of t { clause x() { unlock v of t } }"),
    ]
    .into_iter()
    .collect();
    let err = equity::compile_with_provider(
        "import 'a.equity'\n contract M() locks v of t { clause x() { unlock v of t } }",
        None,
        &provider,
    )
    .unwrap_err();
    assert!(err.to_string().contains("circular import: a.equity -> b.equity -> a.equity"), "{err}");
}

#[test]
fn imported_contracts_are_checked_like_local_ones() {
    let provider: MemoryProvider =
        [("bad.equity", "contract Bad(k: PublicKey) locks v of t { clause x() { unlock v of t } }")]
            .into_iter()
            .collect();
    let err = equity::compile_with_provider(
        "import 'bad.equity'\n contract M() locks v of t { clause x() { unlock v of t } }",
        None,
        &provider,
    )
    .unwrap_err();
    // Parsing succeeds; the unused parameter is found when the spliced contracts compile.
    assert_eq!(err.to_string(), "Usage error: parameter \"k\" is unused");
}

#[test]
fn compile_file_uses_extra_roots() {
    let project = tempfile::tempdir().unwrap();
    let lib = tempfile::tempdir().unwrap();
    std::fs::write(lib.path().join("keys.equity"), INNER).unwrap();
    let entry = project.path().join("forward.equity");
    std::fs::write(&entry, OUTER).unwrap();

    let err = equity::compile_file(&entry, &[]).unwrap_err();
    assert!(err.to_string().contains("not found"));

    let contracts = equity::compile_file(&entry, &[lib.path().to_path_buf()]).unwrap();
    assert_eq!(contracts.last().unwrap().name, "Forward");
}

#[test]
fn entry_directory_searched_before_extra_roots() {
    let project = tempfile::tempdir().unwrap();
    let lib = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("keys.equity"), INNER).unwrap();
    std::fs::write(lib.path().join("keys.equity"), "this is not equity").unwrap();
    let entry = project.path().join("forward.equity");
    std::fs::write(&entry, OUTER).unwrap();

    let contracts = equity::compile_file(&entry, &[lib.path().to_path_buf()]).unwrap();
    assert_eq!(contracts.len(), 2);
}
