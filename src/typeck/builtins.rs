use std::collections::HashMap;
use std::sync::LazyLock;

use super::types::TypeDesc;
use crate::codegen::opcodes::Opcode;

#[derive(Debug, Clone)]
pub struct Builtin {
    pub name: &'static str,
    /// Opcodes emitted after the arguments are pushed in reverse order.
    /// Empty for builtins with a dedicated lowering.
    pub ops: &'static [Opcode],
    /// Argument types; `Nil` accepts any type.
    pub args: &'static [TypeDesc],
    pub result: TypeDesc,
}

use Opcode::*;
use TypeDesc::{Boolean, Hash, Integer, List, Nil, PublicKey, Signature};

static TABLE: &[Builtin] = &[
    Builtin { name: "sha3", ops: &[Sha3], args: &[Nil], result: Hash },
    Builtin { name: "sha256", ops: &[Sha256], args: &[Nil], result: Hash },
    Builtin { name: "size", ops: &[Size, Swap, Drop], args: &[Nil], result: Integer },
    Builtin { name: "abs", ops: &[Abs], args: &[Integer], result: Integer },
    Builtin { name: "min", ops: &[Min], args: &[Integer, Integer], result: Integer },
    Builtin { name: "max", ops: &[Max], args: &[Integer, Integer], result: Integer },
    Builtin {
        name: "checkTxSig",
        ops: &[TxSigHash, Swap, CheckSig],
        args: &[PublicKey, Signature],
        result: Boolean,
    },
    Builtin { name: "concat", ops: &[Cat], args: &[Nil, Nil], result: TypeDesc::String },
    Builtin { name: "concatpush", ops: &[CatPushData], args: &[Nil, Nil], result: TypeDesc::String },
    Builtin { name: "below", ops: &[BlockHeight, GreaterThan], args: &[Integer], result: Boolean },
    Builtin { name: "above", ops: &[BlockHeight, LessThan], args: &[Integer], result: Boolean },
    Builtin { name: "checkTxMultiSig", ops: &[], args: &[List, List], result: Boolean },
];

static BUILTINS: LazyLock<HashMap<&'static str, &'static Builtin>> =
    LazyLock::new(|| TABLE.iter().map(|b| (b.name, b)).collect());

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name).copied()
}

/// All builtins in declaration order.
pub fn all() -> impl Iterator<Item = &'static Builtin> {
    TABLE.iter()
}
