use std::collections::{BTreeMap, HashMap, HashSet};

use crate::parser::ast::{BranchValues, CallArgs, Clause, Condition, Expr, HashCall, Param, Stmt, ValueInfo};
use crate::span::Spanned;
use crate::typeck::check::expr_type;
use crate::typeck::env::{Role, TypeEnv};

/// Fills the derived metadata of a type-checked clause.
///
/// Texts are rendered with clause variables replaced by their right-hand
/// sides. Parameters are never substituted.
pub fn annotate(clause: &mut Clause, contract_params: &[Param], value: &ValueInfo, env: &TypeEnv) {
    let params: Vec<Param> = contract_params.iter().chain(&clause.params).cloned().collect();
    let mut collector = Collector {
        params: &params,
        value,
        env,
        block_height: Vec::new(),
        hash_calls: Vec::new(),
        conditions: BTreeMap::new(),
        cond_values: BTreeMap::new(),
        contracts: Vec::new(),
    };
    let values = collector.walk(&clause.statements, Substitution::default());

    let Collector { block_height, hash_calls, conditions, cond_values, contracts, .. } = collector;
    clause.values = values;
    clause.block_height = block_height;
    clause.hash_calls = hash_calls;
    clause.conditions = conditions;
    clause.cond_values = cond_values;
    clause.contracts = contracts;
}

/// Clause variable name -> fully substituted right-hand side.
#[derive(Debug, Clone, Default)]
struct Substitution {
    vars: HashMap<String, Spanned<Expr>>,
    /// Names bound by `define` in this clause; only these are substituted.
    defined: HashSet<String>,
}

impl Substitution {
    fn apply(&self, expr: &Spanned<Expr>) -> Spanned<Expr> {
        let node = match &expr.node {
            Expr::Var(name) => match self.vars.get(name) {
                Some(rhs) => return rhs.clone(),
                None => Expr::Var(name.clone()),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: *op,
                lhs: Box::new(self.apply(lhs)),
                rhs: Box::new(self.apply(rhs)),
            },
            Expr::Unary { op, operand } => Expr::Unary { op: *op, operand: Box::new(self.apply(operand)) },
            Expr::Call { callee, args } => Expr::Call {
                callee: callee.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
            },
            Expr::List(elems) => Expr::List(elems.iter().map(|e| self.apply(e)).collect()),
            Expr::Bytes(_) | Expr::Int(_) | Expr::Bool(_) => expr.node.clone(),
        };
        Spanned::new(node, expr.span)
    }

    fn bind(&mut self, name: &str, rhs: &Spanned<Expr>) {
        if self.defined.contains(name) {
            let expanded = self.apply(rhs);
            self.vars.insert(name.to_string(), expanded);
        }
    }
}

struct Collector<'a> {
    params: &'a [Param],
    value: &'a ValueInfo,
    env: &'a TypeEnv,
    block_height: Vec<String>,
    hash_calls: Vec<HashCall>,
    conditions: BTreeMap<String, Condition>,
    cond_values: BTreeMap<String, BranchValues>,
    contracts: Vec<String>,
}

impl Collector<'_> {
    /// Returns the values disposed by `stmts`, nested bodies included, in source order.
    fn walk(&mut self, stmts: &[Spanned<Stmt>], mut subst: Substitution) -> Vec<ValueInfo> {
        let mut values = Vec::new();
        for stmt in stmts {
            stmt.node.for_each_expr(|e| self.scan_calls(e, &subst));
            match &stmt.node {
                Stmt::Define { var, expr } => {
                    subst.defined.insert(var.name.clone());
                    subst.bind(&var.name, expr);
                }
                Stmt::Assign { target, expr } => subst.bind(&target.node, expr),
                Stmt::Lock { amount, asset, program, .. } => {
                    values.push(self.lock_value(amount, asset, program, &subst));
                }
                Stmt::Unlock { .. } => values.push(self.value.clone()),
                Stmt::Verify(_) => {}
                Stmt::If { cond, then_body, else_body } => {
                    let true_body = self.walk(then_body, subst.clone());
                    let false_body = self.walk(else_body, subst.clone());
                    if !true_body.is_empty() || !false_body.is_empty() {
                        let cond = subst.apply(cond);
                        let source = cond.node.to_string();
                        self.conditions.insert(
                            source.clone(),
                            Condition { source: source.clone(), params: self.free_params(&cond) },
                        );
                        values.extend(true_body.iter().cloned());
                        values.extend(false_body.iter().cloned());
                        self.cond_values.insert(source, BranchValues { true_body, false_body });
                    }
                }
            }
        }
        values
    }

    fn lock_value(
        &self,
        amount: &Spanned<Expr>,
        asset: &Spanned<Expr>,
        program: &Spanned<Expr>,
        subst: &Substitution,
    ) -> ValueInfo {
        let amount = subst.apply(amount);
        let program = subst.apply(program);
        let amount_text = amount.node.to_string();

        let contract_calls = match &program.node {
            Expr::Call { callee, args } if self.is_contract(&callee.node) => args
                .iter()
                .enumerate()
                .map(|(position, arg)| CallArgs {
                    source: arg.node.to_string(),
                    position,
                    params: self.free_params(arg),
                })
                .collect(),
            _ => Vec::new(),
        };
        let amount_params = match amount.node {
            Expr::Var(_) => Vec::new(),
            _ => self.free_params(&amount),
        };

        ValueInfo {
            name: amount_text.clone(),
            program: program.node.to_string(),
            asset: subst.apply(asset).node.to_string(),
            amount: amount_text,
            contract_calls,
            amount_params,
        }
    }

    fn is_contract(&self, callee: &Expr) -> bool {
        callee
            .as_var()
            .and_then(|name| self.env.lookup(name))
            .is_some_and(|entry| entry.role == Role::Contract)
    }

    /// Parameters referenced by `expr`, in declaration order.
    fn free_params(&self, expr: &Spanned<Expr>) -> Vec<Param> {
        self.params.iter().filter(|p| expr.node.references(&p.name)).cloned().collect()
    }

    /// Records block-height guards, hash calls, and invoked contracts found in `expr`.
    fn scan_calls(&mut self, expr: &Spanned<Expr>, subst: &Substitution) {
        match &expr.node {
            Expr::Call { callee, args } => {
                match callee.node.as_var() {
                    Some("above" | "below") if args.len() == 1 => {
                        self.block_height.push(subst.apply(&args[0]).node.to_string());
                    }
                    Some(hash_type @ ("sha3" | "sha256")) if args.len() == 1 => {
                        let arg = subst.apply(&args[0]);
                        self.hash_calls.push(HashCall {
                            hash_type: hash_type.to_string(),
                            arg: arg.node.to_string(),
                            arg_type: expr_type(&arg.node, self.env).to_string(),
                        });
                    }
                    Some(name) if self.is_contract(&callee.node) => {
                        if !self.contracts.iter().any(|c| c == name) {
                            self.contracts.push(name.to_string());
                        }
                    }
                    _ => {}
                }
                for arg in args {
                    self.scan_calls(arg, subst);
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.scan_calls(lhs, subst);
                self.scan_calls(rhs, subst);
            }
            Expr::Unary { operand, .. } => self.scan_calls(operand, subst),
            Expr::List(elems) => {
                for e in elems {
                    self.scan_calls(e, subst);
                }
            }
            Expr::Var(_) | Expr::Bytes(_) | Expr::Int(_) | Expr::Bool(_) => {}
        }
    }
}
