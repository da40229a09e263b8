/// Reserved radii every program keeps next to its anchor.
///
/// Everything from [`Slot::ProgramBase`] on is program text followed by the
/// stack, both measured in radius units from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Slot {
    ProgramCounter = 0,
    StackPointer = 1,
    RegisterA = 2,
    RegisterB = 3,
    ProgramBase = 4,
}

impl Slot {
    #[inline(always)]
    pub const fn radius(self) -> u32 {
        self as u32
    }
}
