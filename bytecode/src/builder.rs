use crate::instruction::{Instruction, encode_parts};
use crate::op::Op;
use crate::slot::Slot;

/// A forward jump whose offset has not yet been resolved.
///
/// Created by [`ProgramBuilder::jump_forward`] and
/// [`ProgramBuilder::cond_forward`]. Resolve it with
/// [`ProgramBuilder::bind`].
#[derive(Debug)]
pub struct Label {
    /// Index of the jump word in the buffer.
    index: usize,
    /// Radius of the jump instruction (base for the relative offset).
    base: u32,
    op: Op,
}

/// An assembled program: consecutive words starting at
/// [`Slot::ProgramBase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    words: Vec<u32>,
}

impl Program {
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Radius right after the code, where the stack starts.
    pub fn stack_base(&self) -> u32 {
        Slot::ProgramBase.radius() + self.words.len() as u32
    }
}

/// Builds a program image one word per instruction.
///
/// Positions handed out by [`position`](Self::position) are radii, not
/// buffer indices, so they can be used directly as `RSET`/`RGET` operands
/// to address words of the program itself.
pub struct ProgramBuilder {
    words: Vec<u32>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity),
        }
    }

    /// Radius the next emitted instruction will occupy.
    pub fn position(&self) -> u32 {
        Slot::ProgramBase.radius() + self.words.len() as u32
    }

    pub fn finish(self) -> Program {
        Program { words: self.words }
    }

    /// Emit a raw opcode/operand pair. The operand is truncated to 20 bits,
    /// so negative values land as their two's-complement encoding.
    pub fn emit(&mut self, op: Op, operand: i32) {
        self.words.push(encode_parts(op, operand as u32));
    }

    pub fn instruction(&mut self, instruction: Instruction) {
        self.words.push(instruction.encode());
    }

    // ── mnemonics ──────────────────────────────────────────────────

    pub fn nop(&mut self) {
        self.emit(Op::Nop, 0);
    }

    pub fn set_a(&mut self, value: u32) {
        self.instruction(Instruction::SetA { value });
    }

    pub fn add_i(&mut self, value: i32) {
        self.instruction(Instruction::AddI { value });
    }

    pub fn push(&mut self) {
        self.emit(Op::Push, 0);
    }

    pub fn pop(&mut self) {
        self.emit(Op::Pop, 0);
    }

    pub fn add_s(&mut self) {
        self.emit(Op::AddS, 0);
    }

    pub fn swap(&mut self) {
        self.emit(Op::Swap, 0);
    }

    pub fn rand(&mut self, modulus: u32) {
        self.instruction(Instruction::Rand { modulus });
    }

    pub fn shift(&mut self, amount: i32) {
        self.instruction(Instruction::Shift { amount });
    }

    pub fn local(&mut self) {
        self.emit(Op::Local, 0);
    }

    pub fn rpush(&mut self) {
        self.emit(Op::RPush, 0);
    }

    pub fn rset(&mut self, radius: u32) {
        self.instruction(Instruction::RSet { radius });
    }

    pub fn rget(&mut self, radius: u32) {
        self.instruction(Instruction::RGet { radius });
    }

    pub fn fork(&mut self) {
        self.emit(Op::Fork, 0);
    }

    // ── control flow ───────────────────────────────────────────────

    /// `JUMP` with an explicit relative offset.
    pub fn jump(&mut self, offset: i32) {
        self.instruction(Instruction::Jump { offset });
    }

    /// `COND` with an explicit relative offset.
    pub fn cond(&mut self, offset: i32) {
        self.instruction(Instruction::Cond { offset });
    }

    /// Emit an unconditional jump to `target`, a radius obtained from
    /// [`position`](Self::position).
    pub fn jump_back(&mut self, target: u32) {
        let offset = self.offset_to(target);
        self.jump(offset);
    }

    /// Emit a conditional jump to `target`.
    pub fn cond_back(&mut self, target: u32) {
        let offset = self.offset_to(target);
        self.cond(offset);
    }

    /// Emit an unconditional forward jump. Returns a [`Label`] that must be
    /// resolved later with [`bind`](Self::bind).
    pub fn jump_forward(&mut self) -> Label {
        self.emit_jump_placeholder(Op::Jump)
    }

    /// Emit a conditional forward jump. Returns a [`Label`].
    pub fn cond_forward(&mut self) -> Label {
        self.emit_jump_placeholder(Op::Cond)
    }

    /// Bind a forward jump label to the current position.
    pub fn bind(&mut self, label: Label) {
        let offset = self.position() as i32 - label.base as i32;
        self.words[label.index] = encode_parts(label.op, offset as u32);
    }

    fn offset_to(&self, target: u32) -> i32 {
        target as i32 - self.position() as i32
    }

    fn emit_jump_placeholder(&mut self, op: Op) -> Label {
        let label = Label {
            index: self.words.len(),
            base: self.position(),
            op,
        };
        self.emit(op, 0); // placeholder
        label
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
