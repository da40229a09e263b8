//! The 24-bit memory word and its views.
//!
//! A word is the three colour channels of one pixel, low byte first. The same
//! three bytes are read as a plain `u24`, as a signed 20-bit immediate (the
//! low bits of an instruction), or as a pair of 12-bit grid coordinates.

/// Three bytes of pixel memory.
pub type Word = [u8; 3];

pub const WORD_MASK: u32 = 0x00FF_FFFF;
pub const OPERAND_MASK: u32 = 0x000F_FFFF;
pub const COORD_MASK: u32 = 0x0FFF;

#[inline]
pub const fn decode_word(word: Word) -> u32 {
    word[0] as u32 | (word[1] as u32) << 8 | (word[2] as u32) << 16
}

/// Bits above 24 are dropped.
#[inline]
pub const fn encode_word(value: u32) -> Word {
    [value as u8, (value >> 8) as u8, (value >> 16) as u8]
}

/// Sign-extend bit 19 across the upper 12 bits.
#[inline]
pub const fn decode_signed20(bits: u32) -> i32 {
    ((bits << 12) as i32) >> 12
}

/// Split a word into `(x, y)`: `x` is byte 0 plus the low nibble of byte 1,
/// `y` is the high nibble of byte 1 plus byte 2.
#[inline]
pub const fn decode_pair12(word: Word) -> (u32, u32) {
    let x = word[0] as u32 | ((word[1] & 0x0F) as u32) << 8;
    let y = ((word[1] & 0xF0) as u32) >> 4 | (word[2] as u32) << 4;
    (x, y)
}

#[inline]
pub const fn encode_pair12(x: u32, y: u32) -> Word {
    [
        x as u8,
        ((x >> 8) & 0x0F) as u8 | ((y & 0x0F) << 4) as u8,
        (y >> 4) as u8,
    ]
}

/// `encode_pair12` as a `u24`, the form registers carry it in.
#[inline]
pub const fn pack12(x: u32, y: u32) -> u32 {
    decode_word(encode_pair12(x, y))
}

#[inline]
pub const fn unpack12(value: u32) -> (u32, u32) {
    decode_pair12(encode_word(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_round_trip_edges() {
        for v in [0, 1, 0xFF, 0x100, 0xABCDEF, 0x7FFFFF, 0x800000, WORD_MASK] {
            assert_eq!(decode_word(encode_word(v)), v);
        }
    }

    #[test]
    fn word_round_trip_every_value() {
        for v in 0..=WORD_MASK {
            assert_eq!(decode_word(encode_word(v)), v);
        }
    }

    #[test]
    fn word_is_little_endian() {
        assert_eq!(encode_word(0x123456), [0x56, 0x34, 0x12]);
        assert_eq!(encode_word(0xFF_123456), [0x56, 0x34, 0x12]);
    }

    #[test]
    fn signed20() {
        assert_eq!(decode_signed20(0x7FFFF), 524287);
        assert_eq!(decode_signed20(0x80000), -524288);
        assert_eq!(decode_signed20(0xFFFFF), -1);
        assert_eq!(decode_signed20(0), 0);
        assert_eq!(decode_signed20(3), 3);
    }

    #[test]
    fn pair12_round_trip() {
        for x in (0..4096).step_by(7) {
            for y in (0..4096).step_by(13) {
                assert_eq!(decode_pair12(encode_pair12(x, y)), (x, y));
            }
        }
        assert_eq!(decode_pair12(encode_pair12(4095, 4095)), (4095, 4095));
    }

    #[test]
    fn pair12_covers_every_word() {
        for v in 0..=WORD_MASK {
            let w = encode_word(v);
            let (x, y) = decode_pair12(w);
            assert_eq!(encode_pair12(x, y), w);
            assert_eq!(unpack12(pack12(x, y)), (x, y));
        }
    }

    #[test]
    fn pair12_layout() {
        assert_eq!(pack12(0xABC, 0), 0x000ABC);
        assert_eq!(pack12(0, 0xABC), 0xABC000);
        assert_eq!(unpack12(0x123456), (0x456, 0x123));
    }
}
