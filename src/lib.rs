pub mod span;
pub mod diagnostics;
pub mod hex;
pub mod lexer;
pub mod parser;
pub mod imports;
pub mod typeck;
pub mod analysis;
pub mod codegen;
pub mod instantiate;
pub mod config;

use diagnostics::CompileError;
use imports::{FsProvider, NoImports, SourceProvider};
use parser::ast::Contract;
use std::path::{Path, PathBuf};

pub use instantiate::{instantiate, ContractArg};

/// Release version of the compiler.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `VERSION`, plus `+` and the first 8 characters of `commit` when it is at least that long.
pub fn version_with_commit(commit: &str) -> String {
    match commit.get(..8) {
        Some(short) => format!("{VERSION}+{short}"),
        None => VERSION.to_string(),
    }
}

/// Compile a source string with no import support (lex → parse → typeck → analysis → codegen).
/// Returns every contract in order; the last one is the top-level contract.
pub fn compile(source: &str) -> Result<Vec<Contract>, CompileError> {
    compile_with_provider(source, None, &NoImports)
}

/// Compile a source string, resolving `import` directives through `provider`.
/// `origin` names the source so that imports leading back to it are reported as cycles.
pub fn compile_with_provider(
    source: &str,
    origin: Option<&str>,
    provider: &dyn SourceProvider,
) -> Result<Vec<Contract>, CompileError> {
    let contracts = imports::resolve(source, origin, provider)?;
    tracing::debug!(count = contracts.len(), "parsed contracts");
    analysis::compile_contracts(contracts)
}

/// Compile from a file path. Imports are looked up next to the entry file first,
/// then under `extra_roots` in order.
pub fn compile_file(entry_file: &Path, extra_roots: &[PathBuf]) -> Result<Vec<Contract>, CompileError> {
    let source = std::fs::read_to_string(entry_file).map_err(|e| {
        CompileError::import(entry_file.display().to_string(), format!("failed to read entry file: {e}"))
    })?;
    let mut roots = vec![entry_file.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)];
    roots.extend(extra_roots.iter().cloned());

    let provider = FsProvider::new(roots);
    let origin = entry_file.file_name().map(|n| n.to_string_lossy().into_owned());
    compile_with_provider(&source, origin.as_deref(), &provider)
}
