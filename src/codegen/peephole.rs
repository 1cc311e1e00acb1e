use super::builder::Op;
use super::opcodes::Opcode;

#[derive(Clone, Copy)]
enum Pat {
    Int(i64),
    Code(Opcode),
}

impl Pat {
    fn matches(self, op: &Op) -> bool {
        match (self, op) {
            (Pat::Int(n), Op::Int(m)) => n == *m,
            (Pat::Code(a), Op::Code(b)) => a == *b,
            _ => false,
        }
    }
}

use Opcode::*;

/// Rewrite rules, tried in order on every pass.
const RULES: &[(&[Pat], &[Opcode])] = &[
    (&[Pat::Int(0), Pat::Code(Roll)], &[]),
    (&[Pat::Int(0), Pat::Code(Pick)], &[Dup]),
    (&[Pat::Int(1), Pat::Code(Roll)], &[Swap]),
    (&[Pat::Int(1), Pat::Code(Pick)], &[Over]),
    (&[Pat::Int(2), Pat::Code(Roll)], &[Rot]),
    (&[Pat::Int(1), Pat::Code(Verify)], &[]),
    (&[Pat::Code(Swap), Pat::Code(Swap)], &[]),
    (&[Pat::Code(Over), Pat::Code(Over)], &[TwoDup]),
    (&[Pat::Code(Swap), Pat::Code(Over)], &[Tuck]),
    (&[Pat::Code(Drop), Pat::Code(Drop)], &[TwoDrop]),
    (&[Pat::Code(Swap), Pat::Code(Drop)], &[Nip]),
    (&[Pat::Int(5), Pat::Code(Roll), Pat::Int(5), Pat::Code(Roll)], &[TwoRot]),
    (&[Pat::Int(3), Pat::Code(Pick), Pat::Int(3), Pat::Code(Pick)], &[TwoOver]),
    (&[Pat::Int(3), Pat::Code(Roll), Pat::Int(3), Pat::Code(Roll)], &[TwoSwap]),
    (
        &[Pat::Int(2), Pat::Code(Pick), Pat::Int(2), Pat::Code(Pick), Pat::Int(2), Pat::Code(Pick)],
        &[ThreeDup],
    ),
    (&[Pat::Int(1), Pat::Code(Add)], &[Add1]),
    (&[Pat::Int(1), Pat::Code(Sub)], &[Sub1]),
    (&[Pat::Int(2), Pat::Code(Mul)], &[Mul2]),
    (&[Pat::Int(2), Pat::Code(Div)], &[Div2]),
    (&[Pat::Int(0), Pat::Code(NumEqual)], &[Not]),
    (&[Pat::Code(Swap), Pat::Code(Equal)], &[Equal]),
    (&[Pat::Code(Swap), Pat::Code(Add)], &[Add]),
    (&[Pat::Code(Swap), Pat::Code(Mul)], &[Mul]),
    (&[Pat::Code(Swap), Pat::Code(BoolAnd)], &[BoolAnd]),
    (&[Pat::Code(Swap), Pat::Code(BoolOr)], &[BoolOr]),
    (&[Pat::Code(Swap), Pat::Code(NumEqual)], &[NumEqual]),
    (&[Pat::Code(Equal), Pat::Code(Verify)], &[EqualVerify]),
    (&[Pat::Code(NumEqual), Pat::Code(Verify)], &[NumEqualVerify]),
];

/// Replaces every non-overlapping match of `pattern`, scanning left to right.
fn rewrite(ops: &[Op], pattern: &[Pat], replacement: &[Opcode]) -> Option<Vec<Op>> {
    let mut out = Vec::with_capacity(ops.len());
    let mut changed = false;
    let mut i = 0;
    while i < ops.len() {
        let window = ops.get(i..i + pattern.len());
        let hit = window.is_some_and(|w| pattern.iter().zip(w).all(|(p, op)| p.matches(op)));
        if hit {
            out.extend(replacement.iter().map(|&c| Op::Code(c)));
            i += pattern.len();
            changed = true;
        } else {
            out.push(ops[i].clone());
            i += 1;
        }
    }
    changed.then_some(out)
}

/// Applies the rule table until no rule matches.
pub fn optimize(mut ops: Vec<Op>) -> Vec<Op> {
    loop {
        let mut changed = false;
        for (pattern, replacement) in RULES {
            if let Some(next) = rewrite(&ops, pattern, replacement) {
                ops = next;
                changed = true;
            }
        }
        if !changed {
            return ops;
        }
    }
}
