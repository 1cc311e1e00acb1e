use std::fmt;

use serde::Serialize;

use super::opcodes::Opcode;
use super::stack::Stack;

/// Jump target, resolved to an absolute offset at assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Clause(usize),
    End,
    IfTrue { clause: usize, id: usize },
    IfEnd { clause: usize, id: usize },
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Clause(i) => write!(f, "clause{i}"),
            Label::End => write!(f, "_end"),
            Label::IfTrue { clause, id } => write!(f, "true_{clause}_{id}"),
            Label::IfEnd { clause, id } => write!(f, "end_{clause}_{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Code(Opcode),
    Int(i64),
    Data(Vec<u8>),
    Label(Label),
    Jump(Label),
    JumpIf(Label),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Code(op) => write!(f, "{op}"),
            Op::Int(n) => write!(f, "{n}"),
            Op::Data(bytes) => write!(f, "0x{}", crate::hex::encode(bytes)),
            Op::Label(l) => write!(f, "${l}"),
            Op::Jump(l) => write!(f, "JUMP:${l}"),
            Op::JumpIf(l) => write!(f, "JUMPIF:${l}"),
        }
    }
}

/// Renders an op sequence as space-separated text.
pub fn render(ops: &[Op]) -> String {
    ops.iter().map(Op::to_string).collect::<Vec<_>>().join(" ")
}

/// One generation step: the instructions emitted and the stack they leave behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub opcodes: String,
    pub stack: String,
}

/// Accumulates ops while keeping the symbolic stack in sync with them.
#[derive(Debug, Default)]
pub struct Builder {
    ops: Vec<Op>,
    steps: Vec<Step>,
    pub stack: Stack,
}

impl Builder {
    pub fn new(stack: Stack) -> Self {
        Self { ops: Vec::new(), steps: Vec::new(), stack }
    }

    fn record(&mut self, ops: Vec<Op>) {
        self.steps.push(Step { opcodes: render(&ops), stack: self.stack.to_string() });
        self.ops.extend(ops);
    }

    /// Emits an opcode with a fixed stack effect; pushed slots are named `result`.
    pub fn code(&mut self, op: Opcode, result: &str) {
        if let Some((pops, pushes)) = op.stack_effect() {
            self.stack.pop_n(pops);
            for _ in 0..pushes {
                self.stack.push(result);
            }
        }
        self.record(vec![Op::Code(op)]);
    }

    /// Emits an opcode whose stack effect the caller applies afterwards.
    pub fn code_raw(&mut self, op: Opcode, pops: usize, pushes: &[&str]) {
        self.stack.pop_n(pops);
        for name in pushes {
            self.stack.push(*name);
        }
        self.record(vec![Op::Code(op)]);
    }

    pub fn int(&mut self, n: i64, name: &str) {
        self.stack.push(name);
        self.record(vec![Op::Int(n)]);
    }

    pub fn data(&mut self, bytes: Vec<u8>, name: &str) {
        self.stack.push(name);
        self.record(vec![Op::Data(bytes)]);
    }

    pub fn roll(&mut self, depth: usize) {
        self.stack.roll(depth);
        self.record(vec![Op::Int(depth as i64), Op::Code(Opcode::Roll)]);
    }

    pub fn pick(&mut self, depth: usize, copy_name: &str) {
        self.stack.pick(depth, copy_name);
        self.record(vec![Op::Int(depth as i64), Op::Code(Opcode::Pick)]);
    }

    pub fn label(&mut self, label: Label) {
        self.record(vec![Op::Label(label)]);
    }

    pub fn jump(&mut self, label: Label) {
        self.record(vec![Op::Jump(label)]);
    }

    /// Conditional jump; consumes the condition.
    pub fn jump_if(&mut self, label: Label) {
        self.stack.pop_n(1);
        self.record(vec![Op::JumpIf(label)]);
    }

    pub fn into_parts(self) -> (Vec<Op>, Vec<Step>, Stack) {
        (self.ops, self.steps, self.stack)
    }
}
