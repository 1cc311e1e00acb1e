//! Binds concrete arguments to a compiled contract body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codegen::assemble::{encode_data, encode_int};
use crate::codegen::opcodes::Opcode;
use crate::diagnostics::CompileError;
use crate::parser::ast::Param;
use crate::typeck::types::TypeDesc;

/// A concrete contract argument. In JSON exactly one of `boolean`,
/// `integer` or `string` (hex) is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractArg {
    Boolean(bool),
    Integer(i64),
    String(#[serde(with = "crate::hex::serde_hex")] Vec<u8>),
}

impl ContractArg {
    fn tag(&self) -> &'static str {
        match self {
            ContractArg::Boolean(_) => "boolean",
            ContractArg::Integer(_) => "integer",
            ContractArg::String(_) => "string",
        }
    }

    fn push(&self) -> Vec<u8> {
        match self {
            ContractArg::Boolean(b) => encode_int(i64::from(*b)),
            ContractArg::Integer(n) => encode_int(*n),
            ContractArg::String(bytes) => encode_data(bytes),
        }
    }
}

/// Command-line form: `true`/`false`, a decimal integer, or `0x`-prefixed hex.
impl FromStr for ContractArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(ContractArg::Boolean(true)),
            "false" => Ok(ContractArg::Boolean(false)),
            _ if s.starts_with("0x") => crate::hex::decode(s).map(ContractArg::String),
            _ => s
                .parse::<i64>()
                .map(ContractArg::Integer)
                .map_err(|_| format!("cannot parse argument \"{s}\": expected true, false, an integer or 0x hex")),
        }
    }
}

impl fmt::Display for ContractArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractArg::Boolean(b) => write!(f, "{b}"),
            ContractArg::Integer(n) => write!(f, "{n}"),
            ContractArg::String(bytes) => write!(f, "0x{}", crate::hex::encode(bytes)),
        }
    }
}

/// The argument tag a parameter of type `ty` takes.
fn expected_tag(ty: TypeDesc) -> Option<&'static str> {
    match ty {
        TypeDesc::Integer | TypeDesc::Amount => Some("integer"),
        TypeDesc::Boolean => Some("boolean"),
        TypeDesc::Asset
        | TypeDesc::Hash
        | TypeDesc::Sha3String
        | TypeDesc::Sha3PublicKey
        | TypeDesc::Sha256String
        | TypeDesc::Sha256PublicKey
        | TypeDesc::Program
        | TypeDesc::PublicKey
        | TypeDesc::Signature
        | TypeDesc::String
        | TypeDesc::Predicate => Some("string"),
        TypeDesc::Value | TypeDesc::Contract | TypeDesc::List | TypeDesc::Nil => None,
    }
}

/// Builds a deployable program: the arguments pushed in reverse parameter
/// order, then the body, then `0 CHECKPREDICATE`.
pub fn instantiate(
    body: &[u8],
    params: &[Param],
    recursive: bool,
    args: &[ContractArg],
) -> Result<Vec<u8>, CompileError> {
    if args.len() != params.len() {
        return Err(CompileError::instantiation(format!(
            "got {} arguments, want {}",
            args.len(),
            params.len()
        )));
    }
    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        let want = expected_tag(param.ty);
        if want != Some(arg.tag()) {
            return Err(CompileError::instantiation(format!(
                "argument {i} ({}) has type {}, but parameter \"{}\" has type {}",
                arg,
                arg.tag(),
                param.name,
                param.ty
            )));
        }
    }

    let mut program = Vec::new();
    for arg in args.iter().rev() {
        program.extend(arg.push());
    }
    if recursive {
        program.extend(encode_data(body));
        program.extend([Opcode::Depth.byte(), Opcode::Over.byte()]);
    } else {
        program.push(Opcode::Depth.byte());
        program.extend(encode_data(body));
    }
    program.extend(encode_int(0));
    program.push(Opcode::CheckPredicate.byte());
    Ok(program)
}
