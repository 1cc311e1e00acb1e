//! The subset of the Bytom VM instruction set the compiler emits.

use std::fmt;

macro_rules! opcodes {
    ($($variant:ident = $byte:literal, $name:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            pub fn byte(self) -> u8 {
                match self {
                    $(Opcode::$variant => $byte,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }
        }
    };
}

opcodes! {
    False = 0x00, "FALSE";
    PushData1 = 0x4c, "PUSHDATA1";
    PushData2 = 0x4d, "PUSHDATA2";
    PushData4 = 0x4e, "PUSHDATA4";
    True = 0x51, "TRUE";
    Jump = 0x63, "JUMP";
    JumpIf = 0x64, "JUMPIF";
    Verify = 0x69, "VERIFY";
    ToAltStack = 0x6b, "TOALTSTACK";
    FromAltStack = 0x6c, "FROMALTSTACK";
    TwoDrop = 0x6d, "2DROP";
    TwoDup = 0x6e, "2DUP";
    ThreeDup = 0x6f, "3DUP";
    TwoOver = 0x70, "2OVER";
    TwoRot = 0x71, "2ROT";
    TwoSwap = 0x72, "2SWAP";
    Depth = 0x74, "DEPTH";
    Drop = 0x75, "DROP";
    Dup = 0x76, "DUP";
    Nip = 0x77, "NIP";
    Over = 0x78, "OVER";
    Pick = 0x79, "PICK";
    Roll = 0x7a, "ROLL";
    Rot = 0x7b, "ROT";
    Swap = 0x7c, "SWAP";
    Tuck = 0x7d, "TUCK";
    Cat = 0x7e, "CAT";
    Size = 0x82, "SIZE";
    Invert = 0x83, "INVERT";
    And = 0x84, "AND";
    Or = 0x85, "OR";
    Xor = 0x86, "XOR";
    Equal = 0x87, "EQUAL";
    EqualVerify = 0x88, "EQUALVERIFY";
    CatPushData = 0x89, "CATPUSHDATA";
    Add1 = 0x8b, "1ADD";
    Sub1 = 0x8c, "1SUB";
    Mul2 = 0x8d, "2MUL";
    Div2 = 0x8e, "2DIV";
    Negate = 0x8f, "NEGATE";
    Abs = 0x90, "ABS";
    Not = 0x91, "NOT";
    Add = 0x93, "ADD";
    Sub = 0x94, "SUB";
    Mul = 0x95, "MUL";
    Div = 0x96, "DIV";
    Mod = 0x97, "MOD";
    LShift = 0x98, "LSHIFT";
    RShift = 0x99, "RSHIFT";
    BoolAnd = 0x9a, "BOOLAND";
    BoolOr = 0x9b, "BOOLOR";
    NumEqual = 0x9c, "NUMEQUAL";
    NumEqualVerify = 0x9d, "NUMEQUALVERIFY";
    LessThan = 0x9f, "LESSTHAN";
    GreaterThan = 0xa0, "GREATERTHAN";
    LessThanOrEqual = 0xa1, "LESSTHANOREQUAL";
    GreaterThanOrEqual = 0xa2, "GREATERTHANOREQUAL";
    Min = 0xa3, "MIN";
    Max = 0xa4, "MAX";
    Sha256 = 0xa8, "SHA256";
    Sha3 = 0xaa, "SHA3";
    CheckSig = 0xac, "CHECKSIG";
    CheckMultiSig = 0xad, "CHECKMULTISIG";
    TxSigHash = 0xae, "TXSIGHASH";
    CheckPredicate = 0xc0, "CHECKPREDICATE";
    CheckOutput = 0xc1, "CHECKOUTPUT";
    Asset = 0xc2, "ASSET";
    Amount = 0xc3, "AMOUNT";
    BlockHeight = 0xcd, "BLOCKHEIGHT";
}

impl Opcode {
    /// Items popped and pushed, for opcodes with a fixed stack effect.
    /// `None` for opcodes whose effect depends on operands (PICK, ROLL, CHECKMULTISIG,
    /// CHECKPREDICATE) or on control flow.
    pub fn stack_effect(self) -> Option<(usize, usize)> {
        use Opcode::*;
        let effect = match self {
            False | True | Depth | Amount | Asset | BlockHeight | TxSigHash | FromAltStack => {
                (0, 1)
            }
            Verify | Drop | ToAltStack => (1, 0),
            TwoDrop => (2, 0),
            Dup => (1, 2),
            TwoDup => (2, 4),
            ThreeDup => (3, 6),
            Over => (2, 3),
            TwoOver => (4, 6),
            Swap => (2, 2),
            Nip => (2, 1),
            Tuck => (2, 3),
            Rot => (3, 3),
            TwoRot => (6, 6),
            TwoSwap => (4, 4),
            Size => (1, 2),
            Invert | Sha256 | Sha3 | Add1 | Sub1 | Mul2 | Div2 | Negate | Abs | Not => (1, 1),
            Cat | And | Or | Xor | Equal | CatPushData | Add | Sub | Mul | Div | Mod | LShift
            | RShift | BoolAnd | BoolOr | NumEqual | LessThan | GreaterThan | LessThanOrEqual
            | GreaterThanOrEqual | Min | Max => (2, 1),
            EqualVerify | NumEqualVerify => (2, 0),
            CheckSig => (3, 1),
            CheckOutput => (5, 1),
            PushData1 | PushData2 | PushData4 | Jump | JumpIf | Pick | Roll | CheckMultiSig
            | CheckPredicate => return None,
        };
        Some(effect)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
