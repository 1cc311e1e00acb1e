use std::collections::HashMap;
use std::fmt;

use super::types::TypeDesc;
use crate::diagnostics::CompileError;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Builtin,
    Contract,
    ContractParam,
    ContractValue,
    Clause,
    ClauseParam,
    ClauseVariable,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Builtin => "builtin",
            Role::Contract => "contract",
            Role::ContractParam => "contract parameter",
            Role::ContractValue => "contract value",
            Role::Clause => "clause",
            Role::ClauseParam => "clause parameter",
            Role::ClauseVariable => "clause variable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub ty: TypeDesc,
    pub role: Role,
}

/// Name table as a stack of scopes: global, contract, clause, then one per if-body.
#[derive(Debug)]
pub struct TypeEnv {
    scopes: Vec<HashMap<String, Entry>>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Adds `name` to the innermost scope. A name visible from any enclosing scope is a conflict.
    pub fn add(&mut self, name: &str, ty: TypeDesc, role: Role, span: Span) -> Result<(), CompileError> {
        if let Some(existing) = self.lookup(name) {
            return Err(CompileError::type_err(
                format!("{role} \"{name}\" conflicts with {}", existing.role),
                span,
            ));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Entry { ty, role });
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Narrows the type of `name` in whichever scope holds it.
    pub fn refine(&mut self, name: &str, ty: TypeDesc) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(entry) = scope.get_mut(name) {
                entry.ty = ty;
                return true;
            }
        }
        false
    }
}
