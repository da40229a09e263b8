use core::fmt;

/// Opcodes of the pixel machine.
///
/// Every instruction is one 24-bit word: the opcode lives in the high 4 bits,
/// the remaining 20 bits are the operand. Whether the operand is read as
/// unsigned or as a signed two's-complement value depends on the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Does nothing.
    Nop = 0x0,

    /// Relative jump.
    /// Operand: `offset:i20`, relative to this instruction.
    Jump,

    /// Relative jump taken only when `A` is non-zero.
    /// Operand: `offset:i20`
    Cond,

    /// Load the operand into `A`.
    /// Operand: `value:u20`
    SetA,

    /// Add a signed immediate to `A`.
    /// Operand: `value:i20`
    AddI,

    /// Push `A` onto the local stack.
    Push,

    /// Pop the local stack into `A`.
    Pop,

    /// Pop the local stack and add the value to `A`.
    AddS,

    /// Exchange `A` and `B`.
    Swap,

    /// Add a random value to `A`, reduced modulo the operand unless it is 0.
    /// Operand: `modulus:u20`
    Rand,

    /// Shift `A` left (positive) or right (negative).
    /// Operand: `amount:i20`
    Shift,

    /// Load the executor's own anchor into `A` as a 12/12 coordinate pair.
    Local,

    /// Push `A` onto the stack of the program anchored at `B`.
    RPush,

    /// Store `A` at a radius of the program anchored at `B`.
    /// Operand: `radius:u20`
    RSet,

    /// Load a radius of the program anchored at `B` into `A`.
    /// Operand: `radius:u20`
    RGet,

    /// Start a new executor at the anchor held in `B`.
    Fork,
}

impl Op {
    pub const COUNT: usize = Op::Fork as usize + 1;

    const NAMES: [&'static str; Self::COUNT] = [
        "NOP", "JUMP", "COND", "SETA", "ADDI", "PUSH", "POP", "ADDS", "SWAP",
        "RAND", "SHIFT", "LOCAL", "RPUSH", "RSET", "RGET", "FORK",
    ];

    /// Mnemonic used by the disassembler.
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Whether the operand is sign-extended from 20 bits.
    pub const fn has_signed_operand(self) -> bool {
        matches!(self, Op::Jump | Op::Cond | Op::AddI | Op::Shift)
    }

    /// Whether the operand is read at all.
    pub const fn has_operand(self) -> bool {
        matches!(
            self,
            Op::Jump
                | Op::Cond
                | Op::SetA
                | Op::AddI
                | Op::Rand
                | Op::Shift
                | Op::RSet
                | Op::RGet
        )
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        if byte < Self::COUNT as u8 {
            // SAFETY: Op is repr(u8) with contiguous variants starting at 0.
            Ok(unsafe { core::mem::transmute::<u8, Op>(byte) })
        } else {
            Err(byte)
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_nibble_is_an_opcode() {
        for byte in 0..16u8 {
            let op = Op::try_from(byte).expect("4-bit opcode");
            assert_eq!(op as u8, byte);
        }
        assert_eq!(Op::try_from(16), Err(16));
        assert_eq!(Op::try_from(0xFF), Err(0xFF));
    }

    #[test]
    fn names_follow_discriminants() {
        assert_eq!(Op::Nop.to_string(), "NOP");
        assert_eq!(Op::Shift.to_string(), "SHIFT");
        assert_eq!(Op::Fork.to_string(), "FORK");
    }
}
