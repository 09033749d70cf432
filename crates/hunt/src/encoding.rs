//! Progressive-reveal encoding for the orb's scrambled inscription.
//!
//! Coordinate digits live in fixed-width bitmasks where the lower half holds
//! "exact" reveals and the upper half holds "close" shadow hints. Runes of
//! the trailing message are tracked in a separate monotonic bitset. All
//! operations here are pure data manipulation; gating (night time, orb
//! state) is the caller's job.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Runic digit cipher: index = decimal digit, value = rune glyph.
pub const RUNIC_DIGITS: [char; 10] = ['ᛜ', 'ᛝ', 'ᛮ', 'ᛯ', 'ᛰ', 'ᚦ', 'ᚧ', 'ᚩ', 'ᚪ', 'ᚫ'];

/// Glyphs used for scrambled display positions. Disjoint from the cipher
/// runes so an unrevealed position can never be misread as a digit.
pub const SCRAMBLE_GLYPHS: [char; 18] = [
    'ᛡ', 'ᛤ', 'ᛢ', 'ᛠ', 'ᛣ', 'ᛥ', 'ᛧ', 'ᛨ', 'ᛩ', '᛫', '᛬', '᛭', 'ᛱ', 'ᚬ', 'ᚭ', 'ᚮ', 'ᚯ', 'ᚰ',
];

/// Encode a decimal digit as its rune glyph. Returns `None` for values > 9.
pub fn encode_digit(value: u8) -> Option<char> {
    RUNIC_DIGITS.get(value as usize).copied()
}

/// Decode a rune glyph back to its decimal digit. Inverse of [`encode_digit`].
pub fn decode_rune(rune: char) -> Option<u8> {
    RUNIC_DIGITS.iter().position(|&r| r == rune).map(|i| i as u8)
}

/// Pick a near-miss decoy for a "close" hint: the true digit offset by
/// 1 or 2 in either direction, wrapping mod 10. Presentation-only; callers
/// recompute this on every display and never persist the result.
pub fn decoy_digit(actual: u8, rng: &mut impl Rng) -> u8 {
    let magnitude = rng.gen_range(1..=2i32);
    let offset = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    (actual as i32 + offset).rem_euclid(10) as u8
}

/// Fixed-width reveal mask for one coordinate axis.
///
/// Bit `i` (lower half) set means position `i` is exactly revealed. Bit
/// `i + width` (upper half) is the "close" shadow hint for the same
/// position. Exact always dominates: revealing exact clears the shadow bit,
/// and a shadow bit is never set over an existing exact bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitMask {
    bits: u16,
    width: u8,
}

impl DigitMask {
    /// Empty mask covering `width` digit positions.
    pub fn new(width: u8) -> Self {
        debug_assert!(width > 0 && width <= 8);
        Self { bits: 0, width }
    }

    /// Rebuild a mask from persisted raw bits.
    pub fn from_bits(bits: u16, width: u8) -> Self {
        Self { bits, width }
    }

    /// Raw bits for persistence.
    pub fn bits(self) -> u16 {
        self.bits
    }

    /// Number of digit positions covered.
    pub fn width(self) -> u8 {
        self.width
    }

    fn low_mask(self) -> u16 {
        (1u16 << self.width) - 1
    }

    /// Mark a position as exactly revealed, clearing any shadow hint on it.
    pub fn reveal_exact(&mut self, position: u8) {
        debug_assert!(position < self.width);
        self.bits |= 1 << position;
        self.bits &= !(1 << (position + self.width));
    }

    /// Mark a position with a close shadow hint, unless already exact.
    pub fn reveal_close(&mut self, position: u8) {
        debug_assert!(position < self.width);
        if !self.is_exact(position) {
            self.bits |= 1 << (position + self.width);
        }
    }

    /// Reveal every position exactly, dropping all shadow hints.
    pub fn reveal_all(&mut self) {
        self.bits = self.low_mask();
    }

    /// Whether a position is exactly revealed.
    pub fn is_exact(self, position: u8) -> bool {
        self.bits & (1 << position) != 0
    }

    /// Whether a position carries a close shadow hint.
    pub fn is_close(self, position: u8) -> bool {
        self.bits & (1 << (position + self.width)) != 0
    }

    /// Whether every position is exactly revealed.
    pub fn all_exact(self) -> bool {
        self.bits & self.low_mask() == self.low_mask()
    }

    /// Count of exactly revealed positions.
    pub fn exact_count(self) -> u32 {
        (self.bits & self.low_mask()).count_ones()
    }
}

/// Monotonic bitset over the orb's message runes. Bits are only ever set
/// (in index order) until a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuneMask {
    bits: u32,
}

impl RuneMask {
    /// Empty mask: nothing revealed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted raw bits.
    pub fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Raw bits for persistence.
    pub fn bits(self) -> u32 {
        self.bits
    }

    /// Number of revealed runes.
    pub fn revealed_count(self) -> u32 {
        self.bits.count_ones()
    }

    /// Whether rune `index` has been revealed.
    pub fn is_revealed(self, index: u8) -> bool {
        self.bits & (1 << index) != 0
    }

    /// Reveal the next unrevealed rune in index order. Returns its index,
    /// or `None` if all `total` runes are already revealed.
    pub fn reveal_next(&mut self, total: u32) -> Option<u8> {
        for index in 0..total {
            if self.bits & (1 << index) == 0 {
                self.bits |= 1 << index;
                return Some(index as u8);
            }
        }
        None
    }
}
