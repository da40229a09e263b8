use bytecode::{Instruction, Op, Program, Slot, encode_parts};

use crate::{Anchor, InstallError, Machine, NotAddressable};

/// Writes consecutive words into a program's code region.
pub struct ImageWriter<'m> {
    machine: &'m Machine,
    anchor: Anchor,
    cursor: u32,
}

impl<'m> ImageWriter<'m> {
    pub fn new(machine: &'m Machine, anchor: Anchor) -> Self {
        Self {
            machine,
            anchor,
            cursor: Slot::ProgramBase.radius(),
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Radius the next word lands on.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Encode and write one instruction. The cursor advances even when the
    /// write fails.
    pub fn write_instruction(&mut self, op: Op, operand: i32) -> Result<(), NotAddressable> {
        self.write_word(encode_parts(op, operand as u32))
    }

    pub fn write(&mut self, instruction: Instruction) -> Result<(), NotAddressable> {
        self.write_word(instruction.encode())
    }

    pub fn write_word(&mut self, word: u32) -> Result<(), NotAddressable> {
        let radius = self.cursor;
        self.cursor = self.cursor.wrapping_add(1);
        self.machine.write_radius(self.anchor, radius, word)
    }

    /// Reset the program counter and start the stack right after the code.
    pub fn finish(self) -> Result<u32, NotAddressable> {
        self.machine.write_slot(self.anchor, Slot::ProgramCounter, 0)?;
        self.machine
            .write_slot(self.anchor, Slot::StackPointer, self.cursor)?;
        Ok(self.cursor)
    }
}

/// Install `program` at `anchor`. Returns the initial stack pointer.
///
/// Stops at the first word that does not fit; whatever was written before
/// stays in memory.
pub fn install_program(
    machine: &Machine,
    anchor: Anchor,
    program: &Program,
) -> Result<u32, InstallError> {
    let mut writer = ImageWriter::new(machine, anchor);
    for &word in program.words() {
        writer.write_word(word)?;
    }
    let sp = writer.finish()?;
    log::debug!("installed {} words at {anchor}", program.len());
    Ok(sp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Collaborators, MachineCreateInfo};
    use bytecode::ProgramBuilder;
    use std::sync::Arc;

    fn machine() -> Arc<Machine> {
        Machine::with_collaborators(
            MachineCreateInfo {
                width: 64,
                height: 64,
                offset_region: 16,
                ..Default::default()
            },
            Collaborators::silent(),
        )
        .unwrap()
    }

    #[test]
    fn writes_encoded_words_from_program_base() {
        let m = machine();
        let anchor = Anchor::new(32, 32);
        let mut w = ImageWriter::new(&m, anchor);
        w.write_instruction(Op::AddI, -1).unwrap();
        w.write_instruction(Op::SetA, 0x7_FFFF).unwrap();
        assert_eq!(w.cursor(), 6);
        assert_eq!(w.finish(), Ok(6));

        assert_eq!(m.read_radius(anchor, 4), Ok(0x4F_FFFF));
        assert_eq!(m.read_radius(anchor, 5), Ok(0x37_FFFF));
        assert_eq!(m.read_slot(anchor, Slot::ProgramCounter), Ok(0));
        assert_eq!(m.read_slot(anchor, Slot::StackPointer), Ok(6));
    }

    #[test]
    fn install_sets_stack_after_code() {
        let m = machine();
        let anchor = Anchor::new(10, 20);
        let mut b = ProgramBuilder::new();
        b.set_a(5);
        b.add_i(3);
        b.jump(0);
        let program = b.finish();

        assert_eq!(install_program(&m, anchor, &program), Ok(program.stack_base()));
        for (i, &word) in program.words().iter().enumerate() {
            assert_eq!(m.read_radius(anchor, 4 + i as u32), Ok(word));
        }
    }

    #[test]
    fn decoded_instructions_write_their_encoding() {
        let m = machine();
        let anchor = Anchor::new(32, 32);
        let mut w = ImageWriter::new(&m, anchor);
        w.write(Instruction::RGet { radius: 9 }).unwrap();
        w.write(Instruction::Fork).unwrap();
        assert_eq!(w.finish(), Ok(6));
        assert_eq!(m.read_radius(anchor, 4), Ok(0xE0_0009));
        assert_eq!(m.read_radius(anchor, 5), Ok(0xF0_0000));
    }

    #[test]
    fn failed_write_still_advances() {
        let m = machine();
        let anchor = Anchor::new(32, 32);
        let mut w = ImageWriter::new(&m, anchor);
        w.cursor = m.space.max_radius() + 1;
        assert!(w.write_instruction(Op::Nop, 0).is_err());
        assert_eq!(w.cursor(), m.space.max_radius() + 2);
    }

    #[test]
    fn install_near_edge_does_not_fit() {
        let m = machine();
        let program = bytecode::programs::replicator(64);
        let err = install_program(&m, Anchor::new(0, 0), &program).unwrap_err();
        assert!(matches!(err, InstallError::DoesNotFit(_)));
    }
}
