//! Ready-made programs.

use crate::builder::{Program, ProgramBuilder};
use crate::slot::Slot;

const SP: u32 = Slot::StackPointer.radius();
const PC: u32 = Slot::ProgramCounter.radius();

/// Words of colour each painting pass pushes.
pub const PAINT_WORDS: u32 = 1024;

/// The bootstrap self-replicator.
///
/// Each round it paints three passes of random blue, green and red words onto
/// its own stack, then copies its code to a random anchor in
/// `[0, span)²`, resets the copy's program counter, forks it and finally
/// restores its own stack pointer before starting over.
///
/// Two scratch words right after the entry jump hold the end of the code and
/// the saved stack pointer while the copy is in flight.
pub fn replicator(span: u32) -> Program {
    let mut b = ProgramBuilder::with_capacity(96);

    let entry = b.jump_forward();
    let code_end = b.position();
    b.nop();
    let saved_sp = b.position();
    b.nop();
    b.bind(entry);

    // B = self, remember where the code ends
    b.local();
    b.swap();
    b.rget(SP);
    b.rset(code_end);

    let start = b.position();
    for channel_shift in [0, 8, 16] {
        b.set_a(PAINT_WORDS);
        let paint = b.position();
        b.swap();
        b.rand(255);
        if channel_shift != 0 {
            b.shift(channel_shift);
        }
        b.push();
        b.swap();
        b.add_i(-1);
        b.cond_back(paint);
    }

    // park the painted stack and rewind to the end of the code
    b.local();
    b.swap();
    b.rget(SP);
    b.rset(saved_sp);
    b.rget(code_end);
    b.rset(SP);

    // B = random target, its stack pointer = end of code - 1
    b.swap();
    b.set_a(0);
    b.rand(span);
    b.shift(12);
    b.rand(span);
    b.swap();
    b.add_i(-1);
    b.rset(SP);

    // pop the local copy top-down, pushing each word at the remote
    // stack pointer and stepping the remote pointer back by two
    b.add_i(-1);
    let copy = b.position();
    b.add_i(1);
    b.pop();
    b.rpush();
    b.rget(SP);
    b.add_i(-2);
    b.rset(SP);
    b.add_i(-1);
    b.cond_back(copy);

    // fix up the copy and start it
    b.rget(code_end);
    b.rset(SP);
    b.set_a(0);
    b.rset(PC);
    b.fork();

    // restore our own stack
    b.local();
    b.swap();
    b.rget(saved_sp);
    b.rset(SP);

    b.jump_back(start);
    b.finish()
}
