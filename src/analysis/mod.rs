//! Clause-level invariants and the per-contract compile driver.

pub mod values;

use std::collections::HashMap;

use crate::codegen::{self, Callee, ClauseCode, ContractInfo};
use crate::diagnostics::CompileError;
use crate::parser::ast::{Clause, Contract, Expr, Param, Stmt, ValueInfo};
use crate::span::Spanned;
use crate::typeck::check::ClauseChecker;
use crate::typeck::env::{Role, TypeEnv};
use crate::typeck::types::TypeDesc;
use crate::typeck;

/// True if some lock in the contract relocks value with a call to the contract itself.
pub fn check_recursive(contract: &Contract) -> bool {
    fn any_self_lock(stmts: &[Spanned<Stmt>], name: &str) -> bool {
        stmts.iter().any(|s| match &s.node {
            Stmt::Lock { program, .. } => {
                matches!(&program.node, Expr::Call { callee, .. } if callee.node.references(name))
            }
            Stmt::If { then_body, else_body, .. } => {
                any_self_lock(then_body, name) || any_self_lock(else_body, name)
            }
            _ => false,
        })
    }
    contract.clauses.iter().any(|c| any_self_lock(&c.statements, &contract.name))
}

pub fn prohibit_signature_params(contract: &Contract) -> Result<(), CompileError> {
    match contract.params.iter().find(|p| p.ty == TypeDesc::Signature) {
        Some(p) => Err(CompileError::usage(format!(
            "contract parameter \"{}\" has type Signature, but contract parameters cannot have type Signature",
            p.name
        ))),
        None => Ok(()),
    }
}

pub fn prohibit_value_params(contract: &Contract) -> Result<(), CompileError> {
    if let Some(p) = contract.params.iter().find(|p| p.ty == TypeDesc::Value) {
        return Err(CompileError::usage(format!(
            "Value-typed contract parameter \"{}\" must appear in a \"locks\" clause",
            p.name
        )));
    }
    for clause in &contract.clauses {
        if let Some(p) = clause.params.iter().find(|p| p.ty == TypeDesc::Value) {
            return Err(CompileError::usage(format!(
                "Value-typed parameter \"{}\" of clause \"{}\" must appear in a \"requires\" clause",
                p.name, clause.name
            )));
        }
    }
    Ok(())
}

fn clause_references(clause: &Clause, name: &str) -> bool {
    clause.statements.iter().any(|s| s.node.references(name))
}

/// Every contract parameter must be referenced by at least one clause.
pub fn require_params_used(contract: &Contract) -> Result<(), CompileError> {
    for p in &contract.params {
        if !contract.clauses.iter().any(|c| clause_references(c, &p.name)) {
            return Err(CompileError::usage(format!("parameter \"{}\" is unused", p.name)));
        }
    }
    Ok(())
}

/// Every clause parameter must be referenced by its clause.
pub fn require_clause_params_used(clause: &Clause) -> Result<(), CompileError> {
    for p in &clause.params {
        if !clause_references(clause, &p.name) {
            return Err(CompileError::usage(format!(
                "parameter \"{}\" is unused in clause \"{}\"",
                p.name, clause.name
            )));
        }
    }
    Ok(())
}

/// Number of output-index slots `stmts` consume, taking the larger branch of each `if`.
fn output_slots(stmts: &[Spanned<Stmt>]) -> usize {
    stmts
        .iter()
        .map(|s| match &s.node {
            Stmt::Lock { .. } | Stmt::Unlock { .. } => 1,
            Stmt::If { then_body, else_body, .. } => output_slots(then_body).max(output_slots(else_body)),
            _ => 0,
        })
        .sum()
}

/// An `if` followed by further statements must consume the same number of
/// output slots in both branches.
pub fn check_branches(clause: &Clause) -> Result<(), CompileError> {
    fn check_list(stmts: &[Spanned<Stmt>], followed: bool, clause: &str) -> Result<(), CompileError> {
        for (i, stmt) in stmts.iter().enumerate() {
            let Stmt::If { cond, then_body, else_body } = &stmt.node else { continue };
            let followed = followed || i + 1 < stmts.len();
            let (t, f) = (output_slots(then_body), output_slots(else_body));
            if followed && t != f {
                return Err(CompileError::structural(format!(
                    "branches of if statement \"{}\" in clause \"{clause}\" lock or unlock different numbers of values ({t} and {f}) but statements follow it",
                    cond.node
                )));
            }
            check_list(then_body, followed, clause)?;
            check_list(else_body, followed, clause)?;
        }
        Ok(())
    }
    check_list(&clause.statements, false, &clause.name)
}

/// The contract value must be locked or unlocked exactly once, matched by text.
pub fn require_value_disposed_once(value: &ValueInfo, clause: &Clause) -> Result<(), CompileError> {
    fn count(stmts: &[Spanned<Stmt>], value: &ValueInfo) -> usize {
        stmts
            .iter()
            .map(|s| match &s.node {
                Stmt::Lock { amount, asset, .. } | Stmt::Unlock { amount, asset } => {
                    usize::from(amount.node.to_string() == value.amount && asset.node.to_string() == value.asset)
                }
                Stmt::If { then_body, else_body, .. } => count(then_body, value) + count(else_body, value),
                _ => 0,
            })
            .sum()
    }

    let what = match count(&clause.statements, value) {
        1 => return Ok(()),
        0 => "not disposed",
        _ => "disposed multiple times",
    };
    Err(CompileError::disposal(format!(
        "valueAmount \"{}\" or valueAsset \"{}\" {what} in clause \"{}\"",
        value.amount, value.asset, clause.name
    )))
}

/// Numbers lock outputs in statement order. Both branches of an `if` start
/// from the same index and the count resumes after the longer one.
pub fn assign_indexes(clause: &mut Clause) {
    fn assign(stmts: &mut [Spanned<Stmt>], mut next: i64) -> i64 {
        for stmt in stmts {
            match &mut stmt.node {
                Stmt::Lock { index, .. } => {
                    *index = next;
                    next += 1;
                }
                Stmt::Unlock { .. } => next += 1,
                Stmt::If { then_body, else_body, .. } => {
                    let t = assign(then_body, next);
                    let f = assign(else_body, next);
                    next = t.max(f);
                }
                _ => {}
            }
        }
        next
    }
    assign(&mut clause.statements, 0);
}

/// Checks and compiles every contract in order. A contract may only lock
/// value with contracts that precede it.
pub fn compile_contracts(mut contracts: Vec<Contract>) -> Result<Vec<Contract>, CompileError> {
    for c in &mut contracts {
        c.recursive = check_recursive(c);
    }
    let mut env = typeck::global_env(&contracts)?;
    let signatures = typeck::contract_signatures(&contracts);
    let mut callees: HashMap<String, Callee> = HashMap::new();

    for contract in &mut contracts {
        let _span = tracing::info_span!("compile", contract = %contract.name).entered();
        compile_contract(contract, &mut env, &signatures, &callees)?;
        tracing::info!(bytes = contract.body.len(), recursive = contract.recursive, "compiled contract");
        callees.insert(
            contract.name.clone(),
            Callee { body: contract.body.clone(), recursive: contract.recursive },
        );
    }
    Ok(contracts)
}

fn compile_contract(
    contract: &mut Contract,
    env: &mut TypeEnv,
    signatures: &HashMap<String, Vec<TypeDesc>>,
    callees: &HashMap<String, Callee>,
) -> Result<(), CompileError> {
    prohibit_signature_params(contract)?;
    prohibit_value_params(contract)?;
    if contract.clauses.is_empty() {
        return Err(CompileError::structural(format!("contract \"{}\" has no clauses", contract.name)));
    }
    require_params_used(contract)?;

    typeck::enter_contract(env, contract)?;
    let result = compile_clauses(contract, env, signatures, callees);
    env.pop_scope();
    let clauses = result?;

    let info = contract_info(contract);
    let (ops, steps) = codegen::link(&info, clauses);
    let code = codegen::finish(ops, steps)?;
    contract.body = code.body;
    contract.opcodes = code.opcodes;
    contract.steps = code.steps;
    Ok(())
}

fn contract_info(contract: &Contract) -> ContractInfo {
    ContractInfo {
        name: contract.name.clone(),
        params: contract.params.clone(),
        value: contract.value.clone(),
        recursive: contract.recursive,
        clause_count: contract.clauses.len(),
    }
}

fn compile_clauses(
    contract: &mut Contract,
    env: &mut TypeEnv,
    signatures: &HashMap<String, Vec<TypeDesc>>,
    callees: &HashMap<String, Callee>,
) -> Result<Vec<ClauseCode>, CompileError> {
    let info = contract_info(contract);
    let Contract { params, clauses, value, .. } = contract;

    let mut code = Vec::with_capacity(clauses.len());
    for (index, clause) in clauses.iter_mut().enumerate() {
        env.push_scope();
        let result = compile_clause(&info, index, clause, params, value, env, signatures, callees);
        env.pop_scope();
        code.push(result?);
    }
    Ok(code)
}

#[allow(clippy::too_many_arguments)]
fn compile_clause(
    info: &ContractInfo,
    index: usize,
    clause: &mut Clause,
    contract_params: &mut [Param],
    value: &ValueInfo,
    env: &mut TypeEnv,
    signatures: &HashMap<String, Vec<TypeDesc>>,
    callees: &HashMap<String, Callee>,
) -> Result<ClauseCode, CompileError> {
    for p in &clause.params {
        env.add(&p.name, p.ty, Role::ClauseParam, p.span)?;
    }
    require_clause_params_used(clause)?;

    let refined = {
        let mut checker = ClauseChecker::new(env, &clause.name, value, signatures);
        checker.check_statements(&clause.statements)?;
        checker.refined
    };
    for (name, ty) in refined {
        let param = clause
            .params
            .iter_mut()
            .chain(contract_params.iter_mut())
            .find(|p| p.name == name);
        if let Some(p) = param {
            p.inferred_type = Some(ty);
        }
    }

    check_branches(clause)?;
    require_value_disposed_once(value, clause)?;
    assign_indexes(clause);
    values::annotate(clause, contract_params, value, env);
    codegen::compile_clause(info, index, clause, callees)
}
