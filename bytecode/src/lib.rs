mod builder;
mod decoder;
mod instruction;
mod op;
pub mod programs;
mod slot;
pub mod word;

pub use builder::{Label, Program, ProgramBuilder};
pub use decoder::{ProgramDecoder, disassemble};
pub use instruction::{Instruction, encode_parts};
pub use op::Op;
pub use slot::Slot;
pub use word::Word;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(program: &Program) -> Vec<Instruction> {
        ProgramDecoder::new(program.words())
            .map(|d| d.expect("valid opcode"))
            .collect()
    }

    #[test]
    fn builder_emits_one_word_per_instruction() {
        let mut b = ProgramBuilder::new();
        b.set_a(5);
        b.add_i(3);
        b.jump(0);
        let p = b.finish();

        assert_eq!(p.len(), 3);
        assert_eq!(p.stack_base(), Slot::ProgramBase.radius() + 3);
        assert_eq!(decode_all(&p), vec![
            Instruction::SetA { value: 5 },
            Instruction::AddI { value: 3 },
            Instruction::Jump { offset: 0 },
        ]);
    }

    #[test]
    fn positions_are_radii() {
        let mut b = ProgramBuilder::new();
        assert_eq!(b.position(), Slot::ProgramBase.radius());
        b.nop();
        b.nop();
        assert_eq!(b.position(), Slot::ProgramBase.radius() + 2);
    }

    #[test]
    fn backward_jump_is_relative_to_the_jump() {
        let mut b = ProgramBuilder::new();
        b.set_a(3);
        let top = b.position();
        b.add_i(-1);
        b.cond_back(top);
        assert_eq!(decode_all(&b.finish())[2], Instruction::Cond { offset: -1 });
    }

    #[test]
    fn forward_label_skips_to_bind_point() {
        let mut b = ProgramBuilder::new();
        let skip = b.jump_forward();
        b.nop();
        b.nop();
        b.bind(skip);
        b.swap();
        let p = b.finish();
        assert_eq!(decode_all(&p)[0], Instruction::Jump { offset: 3 });
    }

    #[test]
    fn cond_forward_keeps_its_opcode() {
        let mut b = ProgramBuilder::new();
        let l = b.cond_forward();
        b.nop();
        b.bind(l);
        assert_eq!(decode_all(&b.finish())[0], Instruction::Cond { offset: 2 });
    }

    #[test]
    fn raw_emit_masks_negative_operands() {
        let mut b = ProgramBuilder::new();
        b.emit(Op::AddI, -1);
        assert_eq!(b.finish().words(), &[0x4FFFFF]);
    }

    #[test]
    fn replicator_layout() {
        let p = programs::replicator(1024);
        let code = decode_all(&p);

        // entry jump hops over the two scratch words
        assert_eq!(code[0], Instruction::Jump { offset: 3 });
        assert_eq!(code[1], Instruction::Nop);
        assert_eq!(code[2], Instruction::Nop);
        assert_eq!(code[3], Instruction::Local);
        assert_eq!(code.last(), Some(&Instruction::Jump { offset: -(p.len() as i32 - 8) }));
        assert!(code.contains(&Instruction::Fork));
        assert!(code.contains(&Instruction::Rand { modulus: 1024 }));
    }

    #[test]
    fn disassembly_lists_radii() {
        let mut b = ProgramBuilder::new();
        b.set_a(7);
        b.fork();
        let listing = disassemble(b.finish().words(), Slot::ProgramBase.radius());
        assert_eq!(listing, "     4  SETA 7\n     5  FORK\n");
    }

    #[test]
    fn decoder_reports_offset() {
        let words = [Instruction::Push.encode(), Instruction::Pop.encode()];
        let mut d = ProgramDecoder::new(&words);
        assert_eq!(d.decode_next(), Some(Ok(Instruction::Push)));
        assert_eq!(d.offset(), 1);
        assert_eq!(d.decode_next(), Some(Ok(Instruction::Pop)));
        assert!(d.is_at_end());
        assert_eq!(d.decode_next(), None);
    }
}
