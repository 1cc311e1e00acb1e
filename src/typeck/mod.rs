pub mod builtins;
pub mod check;
pub mod env;
pub mod types;

use std::collections::HashMap;

use crate::diagnostics::CompileError;
use crate::parser::ast::Contract;
use crate::span::Span;
use env::{Role, TypeEnv};
use types::TypeDesc;

/// Builds the outermost scope: every builtin, then every contract name.
pub fn global_env(contracts: &[Contract]) -> Result<TypeEnv, CompileError> {
    let mut env = TypeEnv::new();
    for b in builtins::all() {
        env.add(b.name, TypeDesc::Nil, Role::Builtin, Span::dummy())?;
    }
    for c in contracts {
        env.add(&c.name, TypeDesc::Contract, Role::Contract, c.span)?;
    }
    Ok(env)
}

/// Declared parameter types of each contract, for checking contract calls.
pub fn contract_signatures(contracts: &[Contract]) -> HashMap<String, Vec<TypeDesc>> {
    contracts
        .iter()
        .map(|c| (c.name.clone(), c.params.iter().map(|p| p.ty).collect()))
        .collect()
}

/// Pushes the contract scope: parameters, the locked value, and clause names.
pub fn enter_contract(env: &mut TypeEnv, contract: &Contract) -> Result<(), CompileError> {
    env.push_scope();
    for p in &contract.params {
        env.add(&p.name, p.ty, Role::ContractParam, p.span)?;
    }
    env.add(&contract.value.amount, TypeDesc::Amount, Role::ContractValue, contract.span)?;
    env.add(&contract.value.asset, TypeDesc::Asset, Role::ContractValue, contract.span)?;
    for clause in &contract.clauses {
        env.add(&clause.name, TypeDesc::Nil, Role::Clause, clause.span)?;
    }
    Ok(())
}
