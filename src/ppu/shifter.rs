//! Dual bit-plane shift register shared by the background and sprite pipelines.

/// A pair of 16-bit shift registers holding the low and high bit planes of a pattern row.
///
/// Each [`Shifter::shift`] pops the top bit of both planes as one 2-bit value.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct Shifter {
    lo: u16,
    hi: u16,
}

impl Shifter {
    pub const fn new() -> Self {
        Self { lo: 0x0000, hi: 0x0000 }
    }

    /// Replace the low byte of both planes, keeping the bits still being shifted out.
    #[inline]
    pub fn load_low(&mut self, lo: u8, hi: u8) {
        self.lo = (self.lo & 0xFF00) | u16::from(lo);
        self.hi = (self.hi & 0xFF00) | u16::from(hi);
    }

    /// Replace both planes with a single row in the high byte.
    #[inline]
    pub fn load_high(&mut self, lo: u8, hi: u8) {
        self.lo = u16::from(lo) << 8;
        self.hi = u16::from(hi) << 8;
    }

    /// Replace both planes entirely.
    #[inline]
    pub fn load_full(&mut self, lo: u16, hi: u16) {
        self.lo = lo;
        self.hi = hi;
    }

    /// Shift both planes left by one, returning `hi_bit << 1 | lo_bit` of the bits shifted out.
    #[inline]
    #[must_use]
    pub fn shift(&mut self) -> u8 {
        let val = (((self.hi >> 14) & 0x02) | ((self.lo >> 15) & 0x01)) as u8;
        self.lo <<= 1;
        self.hi <<= 1;
        val
    }
}
