use std::sync::Arc;

use bytecode::{Instruction, Slot};

use crate::{Anchor, Fault, Location, Machine};

/// Register slots of one executor, resolved for the current cycle.
struct Frame {
    pc: Location,
    sp: Location,
    a: Location,
    b: Location,
}

/// One executor: the decode-execute loop for a single anchor.
///
/// All state lives in pixel memory. The interpreter itself only remembers
/// where it is anchored and how many cycles it has completed.
pub struct Interpreter {
    machine: Arc<Machine>,
    anchor: Anchor,
    cycles: u64,
}

impl Interpreter {
    pub fn new(machine: Arc<Machine>, anchor: Anchor) -> Self {
        Self {
            machine,
            anchor,
            cycles: 0,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Cycles completed without a fault.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run until the program faults, meeting the rendezvous between cycles.
    pub fn run(&mut self) -> Fault {
        loop {
            if let Err(fault) = self.step() {
                return fault;
            }
            self.machine.poll_clock();
        }
    }

    fn frame(&self) -> Result<Frame, Fault> {
        let slot = |slot: Slot| {
            self.machine
                .resolve(self.anchor, slot.radius())
                .map_err(|_| Fault::InvalidAnchor)
        };
        Ok(Frame {
            pc: slot(Slot::ProgramCounter)?,
            sp: slot(Slot::StackPointer)?,
            a: slot(Slot::RegisterA)?,
            b: slot(Slot::RegisterB)?,
        })
    }

    /// Execute exactly one cycle.
    pub fn step(&mut self) -> Result<(), Fault> {
        let machine = &*self.machine;
        let memory = &machine.memory;
        let frame = self.frame()?;

        let mut pc = memory.read(frame.pc);
        let sp = memory.read(frame.sp);
        let a = memory.read(frame.a);
        let b = memory.read(frame.b);

        let fetch = machine
            .resolve(self.anchor, Slot::ProgramBase.radius().wrapping_add(pc))
            .map_err(|_| Fault::InvalidProgramCounter(pc))?;
        let instruction =
            Instruction::decode(memory.read(fetch)).map_err(Fault::UnknownInstruction)?;
        log::trace!("{} {pc:>6}  {instruction}", self.anchor);

        match instruction {
            Instruction::Nop => {}
            Instruction::Jump { offset } => {
                pc = pc.wrapping_add(offset as u32).wrapping_sub(1);
            }
            Instruction::Cond { offset } => {
                if a != 0 {
                    pc = pc.wrapping_add(offset as u32).wrapping_sub(1);
                }
            }
            Instruction::SetA { value } => memory.write(frame.a, value),
            Instruction::AddI { value } => memory.write(frame.a, a.wrapping_add(value as u32)),
            Instruction::Push => {
                let top = machine
                    .resolve(self.anchor, sp)
                    .map_err(|_| Fault::StackOverflow(sp))?;
                memory.write(top, a);
                memory.write(frame.sp, sp.wrapping_add(1));
            }
            Instruction::Pop | Instruction::AddS => {
                let below = sp.wrapping_sub(1);
                let top = machine
                    .resolve(self.anchor, below)
                    .map_err(|_| Fault::StackUnderflow(sp))?;
                let value = memory.read(top);
                let result = match instruction {
                    Instruction::Pop => value,
                    _ => a.wrapping_add(value),
                };
                memory.write(frame.a, result);
                memory.write(frame.sp, below);
            }
            Instruction::Swap => {
                memory.write(frame.a, b);
                memory.write(frame.b, a);
            }
            Instruction::Rand { modulus } => {
                let r = rand::random::<u32>();
                let r = if modulus != 0 { r % modulus } else { r };
                memory.write(frame.a, a.wrapping_add(r));
            }
            Instruction::Shift { amount } => {
                let shifted = if amount >= 0 {
                    a.checked_shl(amount as u32)
                } else {
                    a.checked_shr(amount.unsigned_abs())
                };
                memory.write(frame.a, shifted.unwrap_or(0));
            }
            Instruction::Local => memory.write(frame.a, self.anchor.packed()),
            Instruction::RPush => {
                let remote = Anchor::from_packed(b);
                if let Ok(remote_sp) = machine.resolve(remote, Slot::StackPointer.radius()) {
                    let rsp = memory.read(remote_sp);
                    if let Ok(top) = machine.resolve(remote, rsp) {
                        memory.write(top, a);
                    }
                    memory.write(remote_sp, rsp.wrapping_add(1));
                }
            }
            Instruction::RSet { radius } => {
                if let Ok(loc) = machine.resolve(Anchor::from_packed(b), radius) {
                    memory.write(loc, a);
                }
            }
            Instruction::RGet { radius } => {
                if let Ok(loc) = machine.resolve(Anchor::from_packed(b), radius) {
                    memory.write(frame.a, memory.read(loc));
                }
            }
            Instruction::Fork => {
                self.machine.fork(Anchor::from_packed(b));
            }
        }

        memory.write(frame.pc, pc.wrapping_add(1));
        self.cycles += 1;
        Ok(())
    }
}
