use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codegen::builder::Step;
use crate::span::{Span, Spanned};
use crate::typeck::types::TypeDesc;

/// A compiled (or, straight out of the parser, not yet compiled) contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    pub clauses: Vec<Clause>,

    /// The value locked by the contract.
    pub value: ValueInfo,

    /// Optimized body bytecode. Not a complete program: see [`crate::instantiate`].
    #[serde(rename = "body_bytecode", with = "crate::hex::serde_hex")]
    pub body: Vec<u8>,

    #[serde(rename = "body_opcodes", default, skip_serializing_if = "String::is_empty")]
    pub opcodes: String,

    /// Whether some clause locks the value with a call back into this contract.
    pub recursive: bool,

    /// Pre-optimization instruction steps with stack snapshots.
    #[serde(skip)]
    pub steps: Vec<Step>,

    #[serde(skip)]
    pub span: Span,
}

/// A contract or clause parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeDesc,

    /// A more specific type than `ty`, inferred from the clause logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_type: Option<TypeDesc>,

    #[serde(skip)]
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeDesc, span: Span) -> Self {
        Self { name: name.into(), ty, inferred_type: None, span }
    }

    /// The inferred type if there is one, otherwise the declared type.
    pub fn effective_type(&self) -> TypeDesc {
        self.inferred_type.unwrap_or(self.ty)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clause {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    #[serde(skip)]
    pub statements: Vec<Spanned<Stmt>>,

    /// Arguments passed to `above`/`below`.
    #[serde(rename = "blockheight", default, skip_serializing_if = "Vec::is_empty")]
    pub block_height: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hash_calls: Vec<HashCall>,

    /// Values unlocked or relocked by this clause, in statement order.
    #[serde(default)]
    pub values: Vec<ValueInfo>,

    /// If-conditions whose bodies dispose of value, keyed by condition text.
    #[serde(default)]
    pub conditions: BTreeMap<String, Condition>,

    #[serde(default)]
    pub cond_values: BTreeMap<String, BranchValues>,

    /// Other contracts invoked by lock programs in this clause.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<String>,

    #[serde(skip)]
    pub span: Span,
}

/// How a value moves in a clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueInfo {
    pub name: String,

    /// Lock program text; empty when the value is unlocked.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub program: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub amount: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_calls: Vec<CallArgs>,

    /// Free parameters of the amount expression; empty when the amount is a plain variable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amount_params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashCall {
    /// "sha3" or "sha256".
    pub hash_type: String,
    pub arg: String,
    pub arg_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    pub source: String,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

/// Values flowing through each side of an if/else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchValues {
    pub true_body: Vec<ValueInfo>,
    pub false_body: Vec<ValueInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Define {
        var: Param,
        expr: Spanned<Expr>,
    },
    Assign {
        target: Spanned<String>,
        expr: Spanned<Expr>,
    },
    If {
        cond: Spanned<Expr>,
        then_body: Vec<Spanned<Stmt>>,
        else_body: Vec<Spanned<Stmt>>,
    },
    Verify(Spanned<Expr>),
    Lock {
        amount: Spanned<Expr>,
        asset: Spanned<Expr>,
        program: Spanned<Expr>,
        /// Output index checked by CHECKOUTPUT, assigned before codegen.
        index: i64,
    },
    Unlock {
        amount: Spanned<Expr>,
        asset: Spanned<Expr>,
    },
}

impl Stmt {
    /// Calls `f` on every expression directly owned by this statement
    /// (not the statements nested in if bodies).
    pub fn for_each_expr<'a>(&'a self, mut f: impl FnMut(&'a Spanned<Expr>)) {
        match self {
            Stmt::Define { expr, .. } | Stmt::Assign { expr, .. } | Stmt::Verify(expr) => f(expr),
            Stmt::If { cond, .. } => f(cond),
            Stmt::Lock { amount, asset, program, .. } => {
                f(amount);
                f(asset);
                f(program);
            }
            Stmt::Unlock { amount, asset } => {
                f(amount);
                f(asset);
            }
        }
    }

    pub fn count_var_refs(&self, counts: &mut HashMap<String, usize>) {
        self.for_each_expr(|e| e.node.count_var_refs(counts));
        if let Stmt::If { then_body, else_body, .. } = self {
            for s in then_body.iter().chain(else_body) {
                s.node.count_var_refs(counts);
            }
        }
    }

    /// True if `name` is referenced anywhere in this statement, including nested bodies.
    pub fn references(&self, name: &str) -> bool {
        let mut found = false;
        self.for_each_expr(|e| found = found || e.node.references(name));
        if found {
            return true;
        }
        match self {
            Stmt::If { then_body, else_body, .. } => {
                then_body.iter().chain(else_body).any(|s| s.node.references(name))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    Var(String),
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    List(Vec<Spanned<Expr>>),
}

impl Expr {
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    pub fn count_var_refs(&self, counts: &mut HashMap<String, usize>) {
        match self {
            Expr::Binary { lhs, rhs, .. } => {
                lhs.node.count_var_refs(counts);
                rhs.node.count_var_refs(counts);
            }
            Expr::Unary { operand, .. } => operand.node.count_var_refs(counts),
            Expr::Call { callee, args } => {
                callee.node.count_var_refs(counts);
                for a in args {
                    a.node.count_var_refs(counts);
                }
            }
            Expr::Var(name) => *counts.entry(name.clone()).or_insert(0) += 1,
            Expr::List(elems) => {
                for e in elems {
                    e.node.count_var_refs(counts);
                }
            }
            Expr::Bytes(_) | Expr::Int(_) | Expr::Bool(_) => {}
        }
    }

    pub fn references(&self, name: &str) -> bool {
        match self {
            Expr::Binary { lhs, rhs, .. } => lhs.node.references(name) || rhs.node.references(name),
            Expr::Unary { operand, .. } => operand.node.references(name),
            Expr::Call { callee, args } => {
                callee.node.references(name) || args.iter().any(|a| a.node.references(name))
            }
            Expr::Var(v) => v == name,
            Expr::List(elems) => elems.iter().any(|e| e.node.references(name)),
            Expr::Bytes(_) | Expr::Int(_) | Expr::Bool(_) => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs.node, op, rhs.node),
            Expr::Unary { op, operand } => write!(f, "{}{}", op, operand.node),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee.node)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a.node)?;
                }
                write!(f, ")")
            }
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Bytes(bytes) => write!(f, "0x{}", crate::hex::encode(bytes)),
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::List(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e.node)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    Neq,
    BitXor,
    BitOr,
    Add,
    Sub,
    BitAnd,
    Shl,
    Shr,
    Mod,
    Mul,
    Div,
}

impl BinOp {
    /// Higher binds tighter; all binary operators are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Gt | BinOp::Lt | BinOp::GtEq | BinOp::LtEq | BinOp::Eq | BinOp::Neq => 3,
            BinOp::BitXor | BinOp::BitOr | BinOp::Add | BinOp::Sub => 4,
            BinOp::BitAnd | BinOp::Shl | BinOp::Shr | BinOp::Mod | BinOp::Mul | BinOp::Div => 5,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::GtEq => ">=",
            BinOp::LtEq => "<=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::BitAnd => "&",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Mod => "%",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Invert,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "!",
        })
    }
}
