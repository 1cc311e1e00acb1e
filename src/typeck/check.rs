use std::collections::HashMap;

use super::builtins;
use super::env::{Role, TypeEnv};
use super::types::TypeDesc;
use crate::diagnostics::CompileError;
use crate::parser::ast::{BinOp, Expr, Stmt, UnaryOp, ValueInfo};
use crate::span::Spanned;

/// Structural type of an expression, without validating operands.
/// Unresolved names are `Nil`.
pub fn expr_type(expr: &Expr, env: &TypeEnv) -> TypeDesc {
    match expr {
        Expr::Binary { op, .. } => binop_result(*op),
        Expr::Unary { op, .. } => match op {
            UnaryOp::Neg => TypeDesc::Integer,
            UnaryOp::Invert => TypeDesc::String,
            UnaryOp::Not => TypeDesc::Boolean,
        },
        Expr::Call { callee, args } => {
            let Expr::Var(name) = &callee.node else { return TypeDesc::Nil };
            if let Some(b) = builtins::lookup(name) {
                if matches!(b.name, "sha3" | "sha256") && args.len() == 1 {
                    return TypeDesc::hash_of(b.name, expr_type(&args[0].node, env));
                }
                return b.result;
            }
            match env.lookup(name).map(|e| e.ty) {
                Some(TypeDesc::Predicate) => TypeDesc::Boolean,
                Some(TypeDesc::Contract) => TypeDesc::Program,
                _ => TypeDesc::Nil,
            }
        }
        Expr::Var(name) => env.lookup(name).map_or(TypeDesc::Nil, |e| e.ty),
        Expr::Bytes(_) => TypeDesc::String,
        Expr::Int(_) => TypeDesc::Integer,
        Expr::Bool(_) => TypeDesc::Boolean,
        Expr::List(_) => TypeDesc::List,
    }
}

fn binop_result(op: BinOp) -> TypeDesc {
    match op {
        BinOp::Or | BinOp::And | BinOp::Gt | BinOp::Lt | BinOp::GtEq | BinOp::LtEq | BinOp::Eq
        | BinOp::Neq => TypeDesc::Boolean,
        BinOp::BitXor | BinOp::BitOr | BinOp::BitAnd => TypeDesc::String,
        BinOp::Add | BinOp::Sub | BinOp::Shl | BinOp::Shr | BinOp::Mod | BinOp::Mul | BinOp::Div => {
            TypeDesc::Integer
        }
    }
}

/// Operand type required by a non-equality binary operator.
fn binop_operand(op: BinOp) -> Option<TypeDesc> {
    match op {
        BinOp::Or | BinOp::And => Some(TypeDesc::Boolean),
        BinOp::BitXor | BinOp::BitOr | BinOp::BitAnd => Some(TypeDesc::String),
        BinOp::Eq | BinOp::Neq => None,
        _ => Some(TypeDesc::Integer),
    }
}

/// Validates the statements of one clause against the environment,
/// registering clause variables and narrowing `Hash` parameters as it goes.
pub struct ClauseChecker<'a> {
    pub env: &'a mut TypeEnv,
    pub clause: &'a str,
    pub value: &'a ValueInfo,
    /// Declared parameter types of every contract in the compilation, by name.
    pub contracts: &'a HashMap<String, Vec<TypeDesc>>,
    /// Names narrowed from `Hash` to a subtype, in the order they were narrowed.
    pub refined: Vec<(String, TypeDesc)>,
}

impl<'a> ClauseChecker<'a> {
    pub fn new(
        env: &'a mut TypeEnv,
        clause: &'a str,
        value: &'a ValueInfo,
        contracts: &'a HashMap<String, Vec<TypeDesc>>,
    ) -> Self {
        Self { env, clause, value, contracts, refined: Vec::new() }
    }

    pub fn check_statements(&mut self, stmts: &[Spanned<Stmt>]) -> Result<(), CompileError> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        let clause = self.clause;
        match &stmt.node {
            Stmt::Verify(expr) => {
                let t = self.check_expr(expr)?;
                if t != TypeDesc::Boolean {
                    return Err(CompileError::type_err(
                        format!(
                            "expression \"{}\" in verify statement in clause \"{clause}\" has type \"{t}\", must be Boolean",
                            expr.node
                        ),
                        expr.span,
                    ));
                }
            }
            Stmt::Lock { amount, asset, program, .. } => {
                self.require_value_parts(amount, asset, "lock")?;
                let t = self.check_expr(program)?;
                if t != TypeDesc::Program {
                    return Err(CompileError::type_err(
                        format!(
                            "program \"{}\" in lock statement in clause \"{clause}\" has type \"{t}\", must be Program",
                            program.node
                        ),
                        program.span,
                    ));
                }
            }
            Stmt::Unlock { amount, asset } => {
                self.require_value_parts(amount, asset, "unlock")?;
                if amount.node.to_string() != self.value.amount || asset.node.to_string() != self.value.asset {
                    return Err(CompileError::type_err(
                        format!("expression in unlock statement of clause \"{clause}\" must be the contract value"),
                        stmt.span,
                    ));
                }
            }
            Stmt::Define { var, expr } => {
                let t = self.check_expr(expr)?;
                if !var.ty.accepts(t) {
                    return Err(CompileError::type_err(
                        format!(
                            "expression \"{}\" in define statement of clause \"{clause}\" has type \"{t}\", must be {}",
                            expr.node, var.ty
                        ),
                        expr.span,
                    ));
                }
                self.env.add(&var.name, var.ty, Role::ClauseVariable, var.span)?;
            }
            Stmt::Assign { target, expr } => {
                let Some(entry) = self.env.lookup(&target.node).copied() else {
                    return Err(CompileError::type_err(
                        format!("assign target \"{}\" in clause \"{clause}\" is undefined", target.node),
                        target.span,
                    ));
                };
                if !matches!(entry.role, Role::ClauseVariable | Role::ClauseParam) {
                    return Err(CompileError::type_err(
                        format!(
                            "assign target \"{}\" in clause \"{clause}\" is a {}, must be a clause variable or clause parameter",
                            target.node, entry.role
                        ),
                        target.span,
                    ));
                }
                let t = self.check_expr(expr)?;
                if !entry.ty.accepts(t) {
                    return Err(CompileError::type_err(
                        format!(
                            "expression \"{}\" in assign statement of clause \"{clause}\" has type \"{t}\", must be {}",
                            expr.node, entry.ty
                        ),
                        expr.span,
                    ));
                }
            }
            Stmt::If { cond, then_body, else_body } => {
                let t = self.check_expr(cond)?;
                if t != TypeDesc::Boolean {
                    return Err(CompileError::type_err(
                        format!(
                            "condition \"{}\" of if statement in clause \"{clause}\" has type \"{t}\", must be Boolean",
                            cond.node
                        ),
                        cond.span,
                    ));
                }
                for body in [then_body, else_body] {
                    self.env.push_scope();
                    let result = self.check_statements(body);
                    self.env.pop_scope();
                    result?;
                }
            }
        }
        Ok(())
    }

    fn require_value_parts(
        &mut self,
        amount: &Spanned<Expr>,
        asset: &Spanned<Expr>,
        kind: &str,
    ) -> Result<(), CompileError> {
        let clause = self.clause;
        let t = self.check_expr(amount)?;
        if !t.is_integer() {
            return Err(CompileError::type_err(
                format!(
                    "{kind}ed amount \"{}\" in {kind} statement of clause \"{clause}\" has type \"{t}\", must be Amount",
                    amount.node
                ),
                amount.span,
            ));
        }
        let t = self.check_expr(asset)?;
        if t != TypeDesc::Asset {
            return Err(CompileError::type_err(
                format!(
                    "{kind}ed asset \"{}\" in {kind} statement of clause \"{clause}\" has type \"{t}\", must be Asset",
                    asset.node
                ),
                asset.span,
            ));
        }
        Ok(())
    }

    /// Checks `expr` bottom-up and returns its type.
    pub fn check_expr(&mut self, expr: &Spanned<Expr>) -> Result<TypeDesc, CompileError> {
        match &expr.node {
            Expr::Binary { op, lhs, rhs } => {
                let lt = self.check_expr(lhs)?;
                let rt = self.check_expr(rhs)?;
                match binop_operand(*op) {
                    Some(required) => {
                        for (side, t) in [(lhs, lt), (rhs, rt)] {
                            if !required.accepts(t) {
                                return Err(CompileError::type_err(
                                    format!(
                                        "operand \"{}\" of \"{op}\" has type \"{t}\", must be {required}",
                                        side.node
                                    ),
                                    side.span,
                                ));
                            }
                        }
                    }
                    None => self.check_equality(*op, lhs, lt, rhs, rt, expr)?,
                }
                Ok(binop_result(*op))
            }
            Expr::Unary { op, operand } => {
                let t = self.check_expr(operand)?;
                let required = match op {
                    UnaryOp::Neg => TypeDesc::Integer,
                    UnaryOp::Invert => TypeDesc::String,
                    UnaryOp::Not => TypeDesc::Boolean,
                };
                if !required.accepts(t) {
                    return Err(CompileError::type_err(
                        format!("operand \"{}\" of \"{op}\" has type \"{t}\", must be {required}", operand.node),
                        operand.span,
                    ));
                }
                Ok(required)
            }
            Expr::Call { callee, args } => self.check_call(expr, callee, args),
            Expr::Var(name) => match self.env.lookup(name) {
                Some(entry) => Ok(entry.ty),
                None => Err(CompileError::type_err(format!("variable \"{name}\" is undefined"), expr.span)),
            },
            Expr::List(_) => Err(CompileError::type_err(
                format!("list \"{}\" is only allowed as an argument to checkTxMultiSig", expr.node),
                expr.span,
            )),
            Expr::Bytes(_) | Expr::Int(_) | Expr::Bool(_) => Ok(expr_type(&expr.node, self.env)),
        }
    }

    fn check_equality(
        &mut self,
        op: BinOp,
        lhs: &Spanned<Expr>,
        lt: TypeDesc,
        rhs: &Spanned<Expr>,
        rt: TypeDesc,
        whole: &Spanned<Expr>,
    ) -> Result<(), CompileError> {
        if lt == TypeDesc::Boolean || rt == TypeDesc::Boolean {
            return Err(CompileError::type_err(
                format!("\"{op}\" cannot compare Boolean operands in \"{}\"", whole.node),
                whole.span,
            ));
        }
        if lt == TypeDesc::Hash && rt.is_hash_subtype() {
            self.refine(lhs, rt);
            return Ok(());
        }
        if rt == TypeDesc::Hash && lt.is_hash_subtype() {
            self.refine(rhs, lt);
            return Ok(());
        }
        if lt.accepts(rt) || rt.accepts(lt) {
            return Ok(());
        }
        Err(CompileError::type_err(
            format!("operands of \"{op}\" in \"{}\" have mismatched types \"{lt}\" and \"{rt}\"", whole.node),
            whole.span,
        ))
    }

    fn refine(&mut self, side: &Spanned<Expr>, ty: TypeDesc) {
        if let Expr::Var(name) = &side.node {
            if self.env.refine(name, ty) {
                self.refined.push((name.clone(), ty));
            }
        }
    }

    fn check_call(
        &mut self,
        whole: &Spanned<Expr>,
        callee: &Spanned<Expr>,
        args: &[Spanned<Expr>],
    ) -> Result<TypeDesc, CompileError> {
        let Expr::Var(name) = &callee.node else {
            return Err(CompileError::type_err(
                format!("callee \"{}\" must be a name", callee.node),
                callee.span,
            ));
        };

        if let Some(b) = builtins::lookup(name) {
            if b.name == "checkTxMultiSig" {
                self.check_multisig(whole, args)?;
                return Ok(b.result);
            }
            self.check_arity(name, b.args.len(), args.len(), whole)?;
            for (arg, &want) in args.iter().zip(b.args) {
                let t = self.check_expr(arg)?;
                if want != TypeDesc::Nil && !want.accepts(t) {
                    return Err(arg_error(name, arg, t, want));
                }
            }
            return Ok(expr_type(&whole.node, self.env));
        }

        let Some(entry) = self.env.lookup(name).copied() else {
            return Err(CompileError::type_err(format!("function \"{name}\" is undefined"), callee.span));
        };
        match entry.ty {
            TypeDesc::Contract => {
                let params = self.contracts.get(name.as_str()).cloned().unwrap_or_default();
                self.check_arity(name, params.len(), args.len(), whole)?;
                for (arg, want) in args.iter().zip(params) {
                    let t = self.check_expr(arg)?;
                    if !want.accepts(t) {
                        return Err(arg_error(name, arg, t, want));
                    }
                }
                Ok(TypeDesc::Program)
            }
            TypeDesc::Predicate => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                Ok(TypeDesc::Boolean)
            }
            other => Err(CompileError::type_err(
                format!("{} \"{name}\" has type \"{other}\" and cannot be called", entry.role),
                callee.span,
            )),
        }
    }

    fn check_arity(&self, name: &str, want: usize, got: usize, whole: &Spanned<Expr>) -> Result<(), CompileError> {
        if want != got {
            return Err(CompileError::type_err(
                format!("\"{name}\" takes {want} arguments, got {got} in \"{}\"", whole.node),
                whole.span,
            ));
        }
        Ok(())
    }

    fn check_multisig(&mut self, whole: &Spanned<Expr>, args: &[Spanned<Expr>]) -> Result<(), CompileError> {
        self.check_arity("checkTxMultiSig", 2, args.len(), whole)?;
        for (arg, want) in args.iter().zip([TypeDesc::PublicKey, TypeDesc::Signature]) {
            let Expr::List(elems) = &arg.node else {
                return Err(CompileError::type_err(
                    format!("argument \"{}\" to checkTxMultiSig must be a list of {want}", arg.node),
                    arg.span,
                ));
            };
            for elem in elems {
                let t = self.check_expr(elem)?;
                if t != want {
                    return Err(arg_error("checkTxMultiSig", elem, t, want));
                }
            }
        }
        Ok(())
    }
}

fn arg_error(func: &str, arg: &Spanned<Expr>, actual: TypeDesc, want: TypeDesc) -> CompileError {
    CompileError::type_err(
        format!("argument \"{}\" to \"{func}\" has type \"{actual}\", must be {want}", arg.node),
        arg.span,
    )
}
