mod common;
use common::*;

use std::path::Path;
use std::process::Output;

fn write_source(dir: &Path, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn compile_prints_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "trade.equity", TRADE_OFFER);

    let output = equityc().arg("compile").arg(&file).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("contract TradeOffer"));
    assert!(out.contains("recursive: false"));
    assert!(out.contains("body: 547a6413000000007b7b51547ac1631a000000547a547aae7cac"));
    assert!(!out.contains("steps:"));
}

#[test]
fn compile_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);

    let output = equityc().args(["compile", "--json"]).arg(&file).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let contract = &json[0];
    assert_eq!(contract["name"], "LockWithPublicKey");
    assert_eq!(contract["body_bytecode"], "ae7cac");
    assert_eq!(contract["body_opcodes"], "TXSIGHASH SWAP CHECKSIG");
    assert!(contract.get("steps").is_none());
}

#[test]
fn compile_json_with_steps() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);

    let output = equityc().args(["compile", "--json", "--steps"]).arg(&file).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let steps = json[0]["steps"].as_array().unwrap();
    assert_eq!(steps.last().unwrap()["opcodes"], "CHECKSIG");
}

#[test]
fn config_file_selects_json_and_import_roots() {
    let project = tempfile::tempdir().unwrap();
    let lib_dir = project.path().join("lib");
    std::fs::create_dir(&lib_dir).unwrap();
    write_source(&lib_dir, "keys.equity", LOCK_WITH_PUBLIC_KEY);
    write_source(
        project.path(),
        "equity.toml",
        "[imports]\npaths = [\"lib\"]\n\n[output]\nformat = \"json\"\n",
    );
    let file = write_source(
        project.path(),
        "main.equity",
        "import 'keys.equity'
         contract Forward(pk: PublicKey) locks amount of asset {
           clause relock() { lock amount of asset with LockWithPublicKey(pk) } }",
    );

    let output = equityc().arg("compile").arg(&file).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["name"], "Forward");
}

#[test]
fn bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "equity.toml", "[output]\nformat = \"yaml\"\n");
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);

    let output = equityc().arg("compile").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("error[config]"));
}

#[test]
fn compile_error_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(
        dir.path(),
        "bad.equity",
        "contract C() locks amount of asset { clause c() { verify true } }",
    );

    let output = equityc().arg("compile").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not disposed in clause \"c\""));
}

#[test]
fn instantiate_binds_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);

    let output = equityc().arg("instantiate").arg(&file).arg("0xaabb").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "02aabb7403ae7cac00c0");
}

#[test]
fn instantiate_selects_named_contract() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!("{LOCK_WITH_PUBLIC_KEY}\n{LOCK_TO_OUTPUT}");
    let file = write_source(dir.path(), "both.equity", &source);

    let output = equityc()
        .arg("instantiate")
        .arg(&file)
        .args(["--contract", "LockWithPublicKey", "0xaabb"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "02aabb7403ae7cac00c0");

    let output = equityc().arg("instantiate").arg(&file).args(["--contract", "Missing"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no contract named \"Missing\""));
}

#[test]
fn instantiate_errors_use_compile_diagnostic_format() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);
    let prefix = format!("error [{}]: Instantiation error: ", file.display());

    let missing = equityc().arg("instantiate").arg(&file).args(["--contract", "Missing"]).output().unwrap();
    assert!(stderr(&missing).starts_with(&prefix), "stderr: {}", stderr(&missing));

    let count = equityc().arg("instantiate").arg(&file).output().unwrap();
    assert_eq!(count.status.code(), Some(1));
    assert!(stderr(&count).starts_with(&prefix), "stderr: {}", stderr(&count));
    assert!(stderr(&count).contains("got 0 arguments, want 1"));
}

#[test]
fn instantiate_rejects_mistyped_argument() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "lock.equity", LOCK_WITH_PUBLIC_KEY);

    let output = equityc().arg("instantiate").arg(&file).arg("true").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("parameter \"publicKey\" has type PublicKey"));
}

#[test]
fn version_subcommand() {
    let output = equityc().arg("version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with(equity::VERSION));
}
