use thiserror::Error;

use crate::Anchor;

/// A radius that has no offset, or whose offset leaves the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("radius {radius} is not addressable from {anchor}")]
pub struct NotAddressable {
    pub anchor: Anchor,
    pub radius: u32,
}

/// Fatal outcomes of an execution cycle. Each one ends its executor and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("reserved slots are not addressable")]
    InvalidAnchor,
    #[error("program counter {0} is not addressable")]
    InvalidProgramCounter(u32),
    #[error("stack overflow at radius {0}")]
    StackOverflow(u32),
    #[error("stack underflow below radius {0}")]
    StackUnderflow(u32),
    #[error("unknown instruction 0x{0:x}")]
    UnknownInstruction(u8),
}

/// Why a fork did not produce an executor. Never surfaced to programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("anchor lies outside the grid")]
    OutsideGrid,
    #[error("an executor is already running at this anchor")]
    AlreadyRunning,
    #[error("concurrency limit reached")]
    ConcurrencyLimitExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("program does not fit: {0}")]
    DoesNotFit(#[from] NotAddressable),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("grid {width}x{height} exceeds the 4096x4096 a 12-bit anchor can name")]
    GridTooLarge { width: u32, height: u32 },
    #[error("offset region half-size must be at least 2, got {0}")]
    RegionTooSmall(u32),
    #[error("offset region half-size must be at most {max}, got {got}")]
    RegionTooLarge { got: u32, max: u32 },
    #[error("at least one executor must be allowed")]
    NoExecutors,
}
