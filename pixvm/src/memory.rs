use std::sync::atomic::{AtomicU8, Ordering::Relaxed};

use bytecode::Word;
use bytecode::word::{decode_word, encode_word};

/// Bytes per pixel: three word channels and one padding channel.
pub const CHANNELS: usize = 4;

/// A pixel index produced by the address resolver. Always in bounds for the
/// memory it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location(usize);

impl Location {
    #[inline(always)]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The pixel grid, and the only storage of the machine.
///
/// Every byte is an `AtomicU8` accessed with relaxed ordering. Byte accesses
/// never race in the Rust sense, but a word written by one executor while
/// another reads it may be observed half-updated. Executors racing on remote
/// memory is part of the simulation.
pub struct PixelMemory {
    width: u32,
    height: u32,
    bytes: Box<[AtomicU8]>,
}

impl PixelMemory {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS;
        let bytes = (0..len).map(|_| AtomicU8::new(0)).collect();
        Self {
            width,
            height,
            bytes,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn location(&self, x: i64, y: i64) -> Option<Location> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(Location(y as usize * self.width as usize + x as usize))
    }

    #[inline]
    pub fn read_word(&self, loc: Location) -> Word {
        let i = loc.0 * CHANNELS;
        [
            self.bytes[i].load(Relaxed),
            self.bytes[i + 1].load(Relaxed),
            self.bytes[i + 2].load(Relaxed),
        ]
    }

    #[inline]
    pub fn write_word(&self, loc: Location, word: Word) {
        let i = loc.0 * CHANNELS;
        self.bytes[i].store(word[0], Relaxed);
        self.bytes[i + 1].store(word[1], Relaxed);
        self.bytes[i + 2].store(word[2], Relaxed);
    }

    #[inline]
    pub fn read(&self, loc: Location) -> u32 {
        decode_word(self.read_word(loc))
    }

    /// Stores the low 24 bits of `value`.
    #[inline]
    pub fn write(&self, loc: Location, value: u32) {
        self.write_word(loc, encode_word(value))
    }

    pub fn word_at(&self, x: u32, y: u32) -> Option<Word> {
        self.location(x as i64, y as i64).map(|loc| self.read_word(loc))
    }

    /// Copy of the whole buffer, `CHANNELS` bytes per pixel, row-major.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Relaxed)).collect()
    }
}

impl std::fmt::Debug for PixelMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelMemory")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_zeroed() {
        let m = PixelMemory::new(8, 4);
        assert_eq!(m.snapshot(), vec![0; 8 * 4 * CHANNELS]);
    }

    #[test]
    fn location_bounds() {
        let m = PixelMemory::new(8, 4);
        assert_eq!(m.location(0, 0).map(Location::index), Some(0));
        assert_eq!(m.location(7, 3).map(Location::index), Some(31));
        assert_eq!(m.location(8, 0), None);
        assert_eq!(m.location(0, 4), None);
        assert_eq!(m.location(-1, 2), None);
    }

    #[test]
    fn word_lands_in_first_three_channels() {
        let m = PixelMemory::new(4, 4);
        let loc = m.location(1, 2).unwrap();
        m.write(loc, 0x00AB_CDEF);
        assert_eq!(m.read(loc), 0xABCDEF);

        let snap = m.snapshot();
        let i = 2 * m.stride() + CHANNELS;
        assert_eq!(&snap[i..i + 4], &[0xEF, 0xCD, 0xAB, 0x00]);
    }

    #[test]
    fn write_truncates_to_24_bits() {
        let m = PixelMemory::new(2, 2);
        let loc = m.location(1, 1).unwrap();
        m.write(loc, 0xFF12_3456);
        assert_eq!(m.read(loc), 0x123456);
        assert_eq!(m.word_at(1, 1), Some([0x56, 0x34, 0x12]));
        assert_eq!(m.word_at(2, 1), None);
    }
}
