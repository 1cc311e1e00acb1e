use std::collections::HashMap;

use super::builder::{Label, Op};
use super::opcodes::Opcode;
use crate::diagnostics::CompileError;

/// Canonical push of an integer: small values use OP_0..OP_16, others
/// their minimal little-endian bytes (all 8 for negatives).
pub fn encode_int(n: i64) -> Vec<u8> {
    match n {
        0 => vec![Opcode::False.byte()],
        1..=16 => vec![0x50 + n as u8],
        _ => {
            let mut bytes = n.to_le_bytes().to_vec();
            if n > 0 {
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
            }
            encode_data(&bytes)
        }
    }
}

/// Canonical push of a byte string.
pub fn encode_data(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    let mut out = Vec::with_capacity(len + 5);
    if len == 0 {
        out.push(Opcode::False.byte());
        return out;
    } else if len <= 75 {
        out.push(len as u8);
    } else if len <= u8::MAX as usize {
        out.push(Opcode::PushData1.byte());
        out.push(len as u8);
    } else if len <= u16::MAX as usize {
        out.push(Opcode::PushData2.byte());
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(Opcode::PushData4.byte());
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

fn encoded_len(op: &Op) -> usize {
    match op {
        Op::Code(_) => 1,
        Op::Int(n) => encode_int(*n).len(),
        Op::Data(d) => encode_data(d).len(),
        Op::Label(_) => 0,
        Op::Jump(_) | Op::JumpIf(_) => 5,
    }
}

/// Two passes: label offsets first, then bytes with jump targets filled in.
pub fn assemble(ops: &[Op]) -> Result<Vec<u8>, CompileError> {
    let mut offsets: HashMap<Label, u32> = HashMap::new();
    let mut pc = 0usize;
    for op in ops {
        if let Op::Label(l) = op {
            let at = u32::try_from(pc)
                .map_err(|_| CompileError::structural("program too large for jump offsets"))?;
            offsets.insert(*l, at);
        }
        pc += encoded_len(op);
    }

    let mut out = Vec::with_capacity(pc);
    for op in ops {
        match op {
            Op::Code(c) => out.push(c.byte()),
            Op::Int(n) => out.extend(encode_int(*n)),
            Op::Data(d) => out.extend(encode_data(d)),
            Op::Label(_) => {}
            Op::Jump(l) | Op::JumpIf(l) => {
                let target = offsets
                    .get(l)
                    .ok_or_else(|| CompileError::structural(format!("jump to undefined label {l}")))?;
                let code = if matches!(op, Op::Jump(_)) { Opcode::Jump } else { Opcode::JumpIf };
                out.push(code.byte());
                out.extend_from_slice(&target.to_le_bytes());
            }
        }
    }
    Ok(out)
}
