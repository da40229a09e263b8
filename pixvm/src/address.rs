use core::fmt;

use bytecode::word::{pack12, unpack12};

use crate::{Location, NotAddressable, OffsetTable};

/// Grid coordinate a program is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub x: u32,
    pub y: u32,
}

impl Anchor {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Reads a register holding a 12/12 coordinate pair.
    pub const fn from_packed(value: u32) -> Self {
        let (x, y) = unpack12(value);
        Self { x, y }
    }

    pub const fn packed(self) -> u32 {
        pack12(self.x, self.y)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Maps `(anchor, radius)` to a pixel.
#[derive(Debug)]
pub struct AddressSpace {
    offsets: OffsetTable,
    width: u32,
    height: u32,
}

impl AddressSpace {
    pub fn new(offsets: OffsetTable, width: u32, height: u32) -> Self {
        Self {
            offsets,
            width,
            height,
        }
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Number of radii, and so one past the largest usable stack pointer.
    pub fn max_radius(&self) -> u32 {
        self.offsets.len() as u32
    }

    #[inline]
    pub fn resolve(&self, anchor: Anchor, radius: u32) -> Result<Location, NotAddressable> {
        let fail = NotAddressable { anchor, radius };
        let offset = self.offsets.get(radius).ok_or(fail)?;
        let x = anchor.x as i64 + offset.dx as i64;
        let y = anchor.y as i64 + offset.dy as i64;
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Err(fail);
        }
        Ok(Location::new(y as usize * self.width as usize + x as usize))
    }
}
