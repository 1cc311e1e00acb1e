pub mod assemble;
pub mod builder;
pub mod opcodes;
pub mod peephole;
pub mod stack;

use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::parser::ast::{BinOp, Clause, Expr, Param, Stmt, UnaryOp, ValueInfo};
use crate::span::Spanned;
use crate::typeck::builtins;
use crate::typeck::types::TypeDesc;
use builder::{Builder, Label, Op, Step};
use opcodes::Opcode;
use stack::Stack;

/// Bytes `DEPTH OVER`, appended after the body of a self-embedding program.
const DEPTH_OVER: [u8; 2] = [0x74, 0x78];

/// An already-compiled contract that later contracts may lock value with.
#[derive(Debug, Clone)]
pub struct Callee {
    pub body: Vec<u8>,
    pub recursive: bool,
}

/// What the clause compiler needs to know about the enclosing contract.
#[derive(Debug, Clone)]
pub struct ContractInfo {
    pub name: String,
    pub params: Vec<Param>,
    pub value: ValueInfo,
    pub recursive: bool,
    pub clause_count: usize,
}

/// Unoptimized code for one clause, including its entry label and exit jump.
#[derive(Debug, Clone)]
pub struct ClauseCode {
    pub ops: Vec<Op>,
    pub steps: Vec<Step>,
}

/// Final output of generation for one contract.
#[derive(Debug, Clone)]
pub struct ContractCode {
    pub body: Vec<u8>,
    pub opcodes: String,
    pub steps: Vec<Step>,
}

fn binop_opcodes(op: BinOp) -> &'static [Opcode] {
    match op {
        BinOp::Or => &[Opcode::BoolOr],
        BinOp::And => &[Opcode::BoolAnd],
        BinOp::Gt => &[Opcode::GreaterThan],
        BinOp::Lt => &[Opcode::LessThan],
        BinOp::GtEq => &[Opcode::GreaterThanOrEqual],
        BinOp::LtEq => &[Opcode::LessThanOrEqual],
        BinOp::Eq => &[Opcode::Equal],
        BinOp::Neq => &[Opcode::Equal, Opcode::Not],
        BinOp::BitXor => &[Opcode::Xor],
        BinOp::BitOr => &[Opcode::Or],
        BinOp::Add => &[Opcode::Add],
        BinOp::Sub => &[Opcode::Sub],
        BinOp::BitAnd => &[Opcode::And],
        BinOp::Shl => &[Opcode::LShift],
        BinOp::Shr => &[Opcode::RShift],
        BinOp::Mod => &[Opcode::Mod],
        BinOp::Mul => &[Opcode::Mul],
        BinOp::Div => &[Opcode::Div],
    }
}

fn unary_opcode(op: UnaryOp) -> Opcode {
    match op {
        UnaryOp::Neg => Opcode::Negate,
        UnaryOp::Invert => Opcode::Invert,
        UnaryOp::Not => Opcode::Not,
    }
}

/// The clause's view of the stack on entry, after dispatch.
fn entry_stack(info: &ContractInfo, index: usize, clause: &Clause) -> Stack {
    let mut stack = Stack::new();
    for p in &clause.params {
        stack.push(p.name.as_str());
    }
    for p in info.params.iter().rev() {
        stack.push(p.name.as_str());
    }
    if info.recursive {
        stack.push(info.name.as_str());
    }
    if index >= 2 {
        stack.push("<clause selector>");
    }
    stack
}

struct ClauseCompiler<'a> {
    info: &'a ContractInfo,
    clause: &'a Clause,
    index: usize,
    callees: &'a HashMap<String, Callee>,
    predicates: HashSet<&'a str>,
    b: Builder,
    counts: HashMap<String, usize>,
    /// Nesting depth of if bodies; references inside bodies always copy.
    body_depth: usize,
    next_if: usize,
}

/// Generates the unoptimized code of clause `index`.
pub fn compile_clause(
    info: &ContractInfo,
    index: usize,
    clause: &Clause,
    callees: &HashMap<String, Callee>,
) -> Result<ClauseCode, CompileError> {
    let mut counts = HashMap::new();
    for stmt in &clause.statements {
        stmt.node.count_var_refs(&mut counts);
    }
    let predicates = info
        .params
        .iter()
        .chain(&clause.params)
        .filter(|p| p.ty == TypeDesc::Predicate)
        .map(|p| p.name.as_str())
        .collect();

    let mut c = ClauseCompiler {
        info,
        clause,
        index,
        callees,
        predicates,
        b: Builder::new(entry_stack(info, index, clause)),
        counts,
        body_depth: 0,
        next_if: 0,
    };
    c.compile()?;
    let (ops, steps, _) = c.b.into_parts();
    tracing::debug!(clause = %clause.name, ops = ops.len(), "generated clause");
    Ok(ClauseCode { ops, steps })
}

impl ClauseCompiler<'_> {
    fn compile(&mut self) -> Result<(), CompileError> {
        if self.index > 0 {
            self.b.label(Label::Clause(self.index));
        }
        if self.index >= 2 {
            self.b.code(Opcode::Drop, "");
        }

        let clause = self.clause;
        let stmts = &clause.statements;
        let result_at = stmts
            .iter()
            .rposition(|s| !matches!(s.node, Stmt::Unlock { .. }))
            .filter(|&i| matches!(stmts[i].node, Stmt::Verify(_) | Stmt::Lock { .. }));

        for (i, stmt) in stmts.iter().enumerate() {
            self.compile_stmt(stmt, result_at == Some(i))?;
        }
        if result_at.is_none() {
            self.b.int(1, "<true>");
        }

        if self.index + 1 < self.info.clause_count {
            self.b.jump(Label::End);
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Spanned<Stmt>, is_result: bool) -> Result<(), CompileError> {
        match &stmt.node {
            Stmt::Verify(expr) => {
                self.compile_expr(expr)?;
                if !is_result {
                    self.b.code(Opcode::Verify, "");
                }
            }
            Stmt::Lock { amount, asset, program, index } => {
                self.b.int(*index, "<output index>");
                self.compile_expr(amount)?;
                self.compile_expr(asset)?;
                self.b.int(1, "<vm version>");
                self.compile_expr(program)?;
                let text = format!("checkOutput({}, {}, {})", amount.node, asset.node, program.node);
                self.b.code(Opcode::CheckOutput, &text);
                if !is_result {
                    self.b.code(Opcode::Verify, "");
                }
            }
            Stmt::Unlock { .. } => {}
            Stmt::Define { var, expr } => {
                self.compile_expr(expr)?;
                self.b.stack.rename_top(var.name.as_str());
            }
            Stmt::Assign { target, expr } => {
                if self.body_depth == 0 {
                    self.assign_top_level(&target.node, expr)?;
                } else {
                    self.assign_in_place(&target.node, expr)?;
                }
            }
            Stmt::If { cond, then_body, else_body } => {
                let id = self.next_if;
                self.next_if += 1;
                let true_label = Label::IfTrue { clause: self.index, id };
                let end_label = Label::IfEnd { clause: self.index, id };

                self.compile_expr(cond)?;
                self.b.jump_if(true_label);
                let entry = self.b.stack.clone();

                self.compile_body(else_body)?;
                let after_else = std::mem::replace(&mut self.b.stack, entry);
                self.b.jump(end_label);

                self.b.label(true_label);
                self.compile_body(then_body)?;
                if self.b.stack != after_else {
                    return Err(CompileError::structural(format!(
                        "branches of if statement in clause \"{}\" leave different stacks: {} and {}",
                        self.clause.name, self.b.stack, after_else
                    )));
                }
                self.b.label(end_label);
            }
        }
        Ok(())
    }

    /// Compiles an if body; slots it defines are dropped when it ends.
    fn compile_body(&mut self, stmts: &[Spanned<Stmt>]) -> Result<(), CompileError> {
        self.body_depth += 1;
        let base = self.b.stack.len();
        for stmt in stmts {
            self.compile_stmt(stmt, false)?;
        }
        let defined = self.b.stack.len().saturating_sub(base);
        for _ in 0..defined {
            self.b.code(Opcode::Drop, "");
        }
        self.body_depth -= 1;
        Ok(())
    }

    /// Consumes the old binding at its last use inside `expr`; the result takes its name.
    fn assign_top_level(&mut self, target: &str, expr: &Spanned<Expr>) -> Result<(), CompileError> {
        let mut refs = HashMap::new();
        expr.node.count_var_refs(&mut refs);
        let in_expr = refs.get(target).copied().unwrap_or(0);
        let total = self.counts.get(target).copied().unwrap_or(0);

        self.counts.insert(target.to_string(), in_expr);
        self.compile_expr(expr)?;
        self.counts.insert(target.to_string(), total.saturating_sub(in_expr));
        self.b.stack.rename_top(target);
        Ok(())
    }

    /// Replaces the old binding's slot with the result, leaving the stack shape unchanged.
    fn assign_in_place(&mut self, target: &str, expr: &Spanned<Expr>) -> Result<(), CompileError> {
        self.compile_expr(expr)?;
        let depth = self.b.stack.depth_of(target).ok_or_else(|| self.unresolved(target))?;
        self.b.roll(depth);
        self.b.code(Opcode::Drop, "");
        self.b.stack.rename_top(target);
        for _ in 1..depth {
            self.b.roll(depth - 1);
        }
        Ok(())
    }

    fn unresolved(&self, name: &str) -> CompileError {
        CompileError::structural(format!(
            "unresolved variable \"{name}\" in clause \"{}\"",
            self.clause.name
        ))
    }

    fn compile_var(&mut self, name: &str) -> Result<(), CompileError> {
        if name == self.info.value.amount {
            self.b.code(Opcode::Amount, name);
            return Ok(());
        }
        if name == self.info.value.asset {
            self.b.code(Opcode::Asset, name);
            return Ok(());
        }

        let depth = self.b.stack.depth_of(name).ok_or_else(|| self.unresolved(name))?;
        if self.body_depth > 0 {
            self.b.pick(depth, &format!("{name}'"));
            return Ok(());
        }
        match self.counts.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                self.b.pick(depth, &format!("{name}'"));
            }
            _ => self.b.roll(depth),
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Spanned<Expr>) -> Result<(), CompileError> {
        let text = expr.node.to_string();
        match &expr.node {
            Expr::Binary { op, lhs, rhs } => {
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                for &code in binop_opcodes(*op) {
                    self.b.code(code, &text);
                }
            }
            Expr::Unary { op, operand } => {
                self.compile_expr(operand)?;
                self.b.code(unary_opcode(*op), &text);
            }
            Expr::Call { callee, args } => self.compile_call(callee, args, &text)?,
            Expr::Var(name) => self.compile_var(name)?,
            Expr::Bytes(bytes) => self.b.data(bytes.clone(), &text),
            Expr::Int(n) => self.b.int(*n, &text),
            Expr::Bool(v) => self.b.int(i64::from(*v), &text),
            Expr::List(elems) => {
                for e in elems.iter().rev() {
                    self.compile_expr(e)?;
                }
            }
        }
        Ok(())
    }

    fn compile_call(&mut self, callee: &Spanned<Expr>, args: &[Spanned<Expr>], text: &str) -> Result<(), CompileError> {
        let Expr::Var(name) = &callee.node else {
            return Err(CompileError::structural(format!("cannot call \"{}\"", callee.node)));
        };

        if let Some(b) = builtins::lookup(name) {
            if b.name == "checkTxMultiSig" {
                return self.compile_multisig(args, text);
            }
            for arg in args.iter().rev() {
                self.compile_expr(arg)?;
            }
            for &code in b.ops {
                self.b.code(code, text);
            }
            return Ok(());
        }

        if self.predicates.contains(name.as_str()) {
            for arg in args.iter().rev() {
                self.compile_expr(arg)?;
            }
            self.b.int(args.len() as i64, "<arg count>");
            self.compile_var(name)?;
            self.b.int(0, "<gas>");
            self.b.code_raw(Opcode::CheckPredicate, args.len() + 3, &[text]);
            return Ok(());
        }

        self.compile_contract_call(name, args, text)
    }

    /// sigs, k, TOALTSTACK, TXSIGHASH, pubkeys, n, FROMALTSTACK, SWAP, CHECKMULTISIG
    fn compile_multisig(&mut self, args: &[Spanned<Expr>], text: &str) -> Result<(), CompileError> {
        let (Some(Expr::List(pubkeys)), Some(Expr::List(sigs))) =
            (args.first().map(|a| &a.node), args.get(1).map(|a| &a.node))
        else {
            return Err(CompileError::structural("checkTxMultiSig requires two list arguments"));
        };

        for s in sigs.iter().rev() {
            self.compile_expr(s)?;
        }
        self.b.int(sigs.len() as i64, "<sig count>");
        self.b.code(Opcode::ToAltStack, "");
        self.b.code(Opcode::TxSigHash, "<txsighash>");
        for k in pubkeys.iter().rev() {
            self.compile_expr(k)?;
        }
        self.b.int(pubkeys.len() as i64, "<key count>");
        self.b.code(Opcode::FromAltStack, "<sig count>");
        self.b.code(Opcode::Swap, "");
        self.b.code_raw(Opcode::CheckMultiSig, sigs.len() + pubkeys.len() + 3, &[text]);
        Ok(())
    }

    /// Builds the callee's program bytes on the stack: argument pushes, then its body
    /// wrapped the way instantiation would wrap it.
    fn compile_contract_call(&mut self, name: &str, args: &[Spanned<Expr>], text: &str) -> Result<(), CompileError> {
        let callees = self.callees;
        let callee = if name == self.info.name {
            None
        } else {
            Some(callees.get(name).ok_or_else(|| {
                CompileError::structural(format!(
                    "unknown contract \"{name}\" called in clause \"{}\"; contracts must be defined before use",
                    self.clause.name
                ))
            })?)
        };

        self.b.data(Vec::new(), text);
        for arg in args.iter().rev() {
            self.compile_expr(arg)?;
            self.b.code(Opcode::CatPushData, text);
        }

        match callee {
            None => {
                self.compile_var(name)?;
                self.b.code(Opcode::CatPushData, text);
                self.b.data(DEPTH_OVER.to_vec(), "<depth over>");
                self.b.code(Opcode::Cat, text);
            }
            Some(c) if c.recursive => {
                self.b.data(c.body.clone(), name);
                self.b.code(Opcode::CatPushData, text);
                self.b.data(DEPTH_OVER.to_vec(), "<depth over>");
                self.b.code(Opcode::Cat, text);
            }
            Some(c) => {
                self.b.data(vec![Opcode::Depth.byte()], "<depth>");
                self.b.code(Opcode::Cat, text);
                self.b.data(c.body.clone(), name);
                self.b.code(Opcode::CatPushData, text);
            }
        }

        self.b.int(0, "<gas>");
        self.b.code(Opcode::CatPushData, text);
        self.b.data(vec![Opcode::CheckPredicate.byte()], "<checkpredicate>");
        self.b.code(Opcode::Cat, text);
        Ok(())
    }
}

/// Prefixes the clause dispatch chain, appends the end label and returns the
/// unoptimized op list with its steps.
pub fn link(info: &ContractInfo, clauses: Vec<ClauseCode>) -> (Vec<Op>, Vec<Step>) {
    let n = info.clause_count;
    let mut dispatch = Builder::new(Stack::new());
    if n > 1 {
        dispatch.stack.push("<clause selector>");
        for p in info.params.iter().rev() {
            dispatch.stack.push(p.name.as_str());
        }
        if info.recursive {
            dispatch.stack.push(info.name.as_str());
        }
        dispatch.roll(info.params.len() + usize::from(info.recursive));
        for i in (2..n).rev() {
            dispatch.code(Opcode::Dup, "<clause selector>");
            dispatch.int(i as i64, "");
            dispatch.code(Opcode::NumEqual, "");
            dispatch.jump_if(Label::Clause(i));
        }
        dispatch.jump_if(Label::Clause(1));
    }

    let (mut ops, mut steps, _) = dispatch.into_parts();
    for clause in clauses {
        ops.extend(clause.ops);
        steps.extend(clause.steps);
    }
    if n > 1 {
        ops.push(Op::Label(Label::End));
        steps.push(Step { opcodes: Op::Label(Label::End).to_string(), stack: String::new() });
    }
    (ops, steps)
}

/// Optimizes and assembles a linked op list.
pub fn finish(ops: Vec<Op>, steps: Vec<Step>) -> Result<ContractCode, CompileError> {
    let before = ops.len();
    let ops = peephole::optimize(ops);
    tracing::debug!(before, after = ops.len(), "peephole pass");
    let body = assemble::assemble(&ops)?;
    Ok(ContractCode { body, opcodes: builder::render(&ops), steps })
}
