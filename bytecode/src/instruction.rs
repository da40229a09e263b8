use core::fmt;

use crate::op::Op;
use crate::word::{OPERAND_MASK, WORD_MASK, decode_signed20};

/// A decoded instruction with its operand already interpreted.
///
/// Operand-less opcodes drop whatever bits their word carried below the
/// opcode, so `decode(encode(i)) == i` holds but `encode(decode(w))` may
/// normalise `w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Jump { offset: i32 },
    Cond { offset: i32 },
    SetA { value: u32 },
    AddI { value: i32 },
    Push,
    Pop,
    AddS,
    Swap,
    Rand { modulus: u32 },
    Shift { amount: i32 },
    Local,
    RPush,
    RSet { radius: u32 },
    RGet { radius: u32 },
    Fork,
}

impl Instruction {
    /// Splits a 24-bit word into opcode and operand.
    ///
    /// Fails with the offending opcode value when it is not part of the ISA.
    pub fn decode(bits: u32) -> Result<Self, u8> {
        let op = Op::try_from(((bits & WORD_MASK) >> 20) as u8)?;
        let operand = bits & OPERAND_MASK;
        Ok(Self::from_parts(op, operand))
    }

    pub fn from_parts(op: Op, operand: u32) -> Self {
        let operand = operand & OPERAND_MASK;
        let signed = decode_signed20(operand);
        match op {
            Op::Nop => Self::Nop,
            Op::Jump => Self::Jump { offset: signed },
            Op::Cond => Self::Cond { offset: signed },
            Op::SetA => Self::SetA { value: operand },
            Op::AddI => Self::AddI { value: signed },
            Op::Push => Self::Push,
            Op::Pop => Self::Pop,
            Op::AddS => Self::AddS,
            Op::Swap => Self::Swap,
            Op::Rand => Self::Rand { modulus: operand },
            Op::Shift => Self::Shift { amount: signed },
            Op::Local => Self::Local,
            Op::RPush => Self::RPush,
            Op::RSet => Self::RSet { radius: operand },
            Op::RGet => Self::RGet { radius: operand },
            Op::Fork => Self::Fork,
        }
    }

    pub const fn op(&self) -> Op {
        match self {
            Self::Nop => Op::Nop,
            Self::Jump { .. } => Op::Jump,
            Self::Cond { .. } => Op::Cond,
            Self::SetA { .. } => Op::SetA,
            Self::AddI { .. } => Op::AddI,
            Self::Push => Op::Push,
            Self::Pop => Op::Pop,
            Self::AddS => Op::AddS,
            Self::Swap => Op::Swap,
            Self::Rand { .. } => Op::Rand,
            Self::Shift { .. } => Op::Shift,
            Self::Local => Op::Local,
            Self::RPush => Op::RPush,
            Self::RSet { .. } => Op::RSet,
            Self::RGet { .. } => Op::RGet,
            Self::Fork => Op::Fork,
        }
    }

    /// Raw operand bits, before masking to 20 bits.
    pub const fn operand(&self) -> u32 {
        match *self {
            Self::Jump { offset } | Self::Cond { offset } => offset as u32,
            Self::AddI { value } => value as u32,
            Self::Shift { amount } => amount as u32,
            Self::SetA { value } => value,
            Self::Rand { modulus } => modulus,
            Self::RSet { radius } | Self::RGet { radius } => radius,
            _ => 0,
        }
    }

    /// `(opcode & 0xF) << 20 | (operand & 0xFFFFF)`
    pub const fn encode(&self) -> u32 {
        encode_parts(self.op(), self.operand())
    }
}

/// Packs an opcode and a raw operand, truncating the operand to 20 bits.
#[inline]
pub const fn encode_parts(op: Op, operand: u32) -> u32 {
    ((op as u32) & 0xF) << 20 | (operand & OPERAND_MASK)
}

/// Shows the operand as it is encoded, so out-of-range values print
/// truncated.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.op();
        if !op.has_operand() {
            return write!(f, "{op}");
        }
        let operand = self.operand() & OPERAND_MASK;
        match op {
            Op::RSet | Op::RGet => write!(f, "{op} @{operand}"),
            _ if op.has_signed_operand() => write!(f, "{op} {}", decode_signed20(operand)),
            _ => write!(f, "{op} {operand}"),
        }
    }
}
