use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::diagnostics::{CompileError, SourceError};
use crate::parser::{self, ast::Contract};

/// Resolves an import path to source bytes.
pub trait SourceProvider {
    fn load(&self, path: &str) -> Result<Vec<u8>, SourceError>;
}

/// Looks import paths up under a list of search roots, first hit wins.
/// Absolute paths are read as-is.
#[derive(Debug, Clone, Default)]
pub struct FsProvider {
    roots: Vec<PathBuf>,
}

impl FsProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl SourceProvider for FsProvider {
    fn load(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return read_file(requested);
        }
        for root in &self.roots {
            let candidate = root.join(requested);
            if candidate.is_file() {
                return read_file(&candidate);
            }
        }
        Err(SourceError::NotFound)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::NotFound),
        Err(e) => Err(SourceError::Unreadable(e)),
    }
}

/// In-memory sources keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: HashMap<String, Vec<u8>>,
}

impl<P: Into<String>, S: Into<Vec<u8>>> FromIterator<(P, S)> for MemoryProvider {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        Self { files: iter.into_iter().map(|(p, s)| (p.into(), s.into())).collect() }
    }
}

impl SourceProvider for MemoryProvider {
    fn load(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        self.files.get(path).cloned().ok_or(SourceError::NotFound)
    }
}

/// Provider for sources that must not import anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

impl SourceProvider for NoImports {
    fn load(&self, _path: &str) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::NotFound)
    }
}

struct Resolver<'p> {
    provider: &'p dyn SourceProvider,
    /// Import paths currently being resolved, outermost first.
    stack: Vec<String>,
    /// Import paths already spliced; a file imported twice contributes its contracts once.
    loaded: HashSet<String>,
}

impl Resolver<'_> {
    fn resolve_source(&mut self, source: &str) -> Result<Vec<Contract>, CompileError> {
        let file = parser::parse(source)?;
        let mut contracts = Vec::new();
        for import in &file.imports {
            contracts.extend(self.resolve_import(&import.node)?);
        }
        contracts.extend(file.contracts);
        Ok(contracts)
    }

    fn resolve_import(&mut self, path: &str) -> Result<Vec<Contract>, CompileError> {
        if self.stack.iter().any(|p| p == path) {
            let mut chain = self.stack.clone();
            chain.push(path.to_string());
            return Err(CompileError::import(path, format!("circular import: {}", chain.join(" -> "))));
        }
        if !self.loaded.insert(path.to_string()) {
            tracing::debug!(path, "import already resolved, skipping");
            return Ok(Vec::new());
        }

        let bytes = self
            .provider
            .load(path)
            .map_err(|e| CompileError::import(path, e.to_string()))?;
        let source = String::from_utf8(bytes)
            .map_err(|_| CompileError::import(path, "source is not valid UTF-8"))?;
        tracing::debug!(path, bytes = source.len(), "resolving import");

        self.stack.push(path.to_string());
        let result = self.resolve_source(&source);
        self.stack.pop();

        result.map_err(|e| match e {
            CompileError::Import { .. } => e,
            nested => CompileError::import(path, nested.to_string()),
        })
    }
}

/// Parses `source` and splices in the contracts of every import, depth-first,
/// ahead of the importing file's own contracts. `origin` names the entry file so
/// that an import chain leading back to it is reported as circular.
pub fn resolve(
    source: &str,
    origin: Option<&str>,
    provider: &dyn SourceProvider,
) -> Result<Vec<Contract>, CompileError> {
    let mut resolver = Resolver {
        provider,
        stack: origin.map(|o| vec![o.to_string()]).unwrap_or_default(),
        loaded: HashSet::new(),
    };
    resolver.resolve_source(source)
}
