//! PPUSCROLL and PPUADDR registers implementation.
//!
//! See: <https://www.nesdev.org/wiki/PPU_scrolling>

use serde::{Deserialize, Serialize};

/// Write toggle shared by `$2005` PPUSCROLL and `$2006` PPUADDR.
///
/// Reading `$2002` PPUSTATUS is the only transition back to [`Latch::AwaitingHigh`] other than
/// completing a write pair.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Latch {
    /// Next write is the first of a pair: X scroll or the address high byte.
    #[default]
    AwaitingHigh,
    /// Next write is the second of a pair: Y scroll or the address low byte.
    AwaitingLow,
}

/// A single internal VRAM address register, also known as a "loopy" register.
///
/// Stored packed so the flat address and the tile/nametable/fine-Y fields can never disagree.
#[derive(Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Loopy {
    v: u16,
}

impl Loopy {
    // yyy NN YYYYY XXXXX
    // ||| || ||||| +++++- 5 bit coarse X
    // ||| || +++++------- 5 bit coarse Y
    // ||| |+------------- Nametable X offset
    // ||| +-------------- Nametable Y offset
    // +++---------------- 3 bit fine Y
    pub const COARSE_X_MASK: u16 = 0x001F;
    pub const COARSE_Y_MASK: u16 = 0x03E0;
    pub const NT_X_MASK: u16 = 0x0400;
    pub const NT_Y_MASK: u16 = 0x0800;
    pub const FINE_Y_MASK: u16 = 0x7000;
    const X_MAX_COL: u16 = 31; // last column of tiles - 255 pixel width / 8 pixel wide tiles
    const Y_MAX_COL: u16 = 29; // last row of tiles - (240 pixel height / 8 pixel tall tiles) - 1
    const Y_INCREMENT: u16 = 0x1000; // Increment fine y in bit 12

    const NT_START: u16 = 0x2000;
    const ATTR_OFFSET: u16 = 0x03C0;
    const REG_MASK: u16 = 0x7FFF; // 15 bits: yyy NN YYYYY XXXXX
    const DATA_MASK: u16 = 0x3FFF; // 14 bit PPU address space

    pub const fn new() -> Self {
        Self { v: 0x0000 }
    }

    /// Raw 15-bit register value.
    #[inline]
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.v
    }

    /// Nametable address of the current tile: `base nametable | tile_y << 5 | tile_x`.
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> u16 {
        Self::NT_START | (self.v & 0x0FFF)
    }

    /// Address used by `$2007` PPUDATA accesses.
    #[inline]
    #[must_use]
    pub const fn data_addr(&self) -> u16 {
        self.v & Self::DATA_MASK
    }

    #[inline]
    #[must_use]
    pub const fn tile_x(&self) -> u16 {
        self.v & Self::COARSE_X_MASK
    }

    #[inline]
    #[must_use]
    pub const fn tile_y(&self) -> u16 {
        (self.v & Self::COARSE_Y_MASK) >> 5
    }

    #[inline]
    #[must_use]
    pub const fn fine_y(&self) -> u16 {
        (self.v & Self::FINE_Y_MASK) >> 12
    }

    /// Base nametable quadrant, 0-3.
    #[inline]
    #[must_use]
    pub const fn nametable(&self) -> u16 {
        (self.v & (Self::NT_X_MASK | Self::NT_Y_MASK)) >> 10
    }

    /// Base nametable address, one of `$2000`, `$2400`, `$2800` or `$2C00`.
    #[inline]
    #[must_use]
    pub const fn nametable_addr(&self) -> u16 {
        Self::NT_START | (self.v & (Self::NT_X_MASK | Self::NT_Y_MASK))
    }

    // NN 1111 YYY XXX
    // || |||| ||| +++-- high 3 bits of coarse X (x/4)
    // || |||| +++------ high 3 bits of coarse Y (y/4)
    // || ++++---------- attribute offset (960 bytes)
    // ++--------------- nametable select
    #[inline]
    #[must_use]
    pub const fn attr_addr(&self) -> u16 {
        self.nametable_addr()
            | Self::ATTR_OFFSET
            | (self.tile_x() >> 2)
            | ((self.tile_y() >> 2) << 3)
    }

    /// Shift selecting the 2-bit palette out of an attribute byte.
    ///
    /// The bottom half of a 4x4 tile block is tested first and wins over the right half, so
    /// the bottom-right quadrant resolves like the bottom-left one.
    #[inline]
    #[must_use]
    pub const fn attr_shift(&self) -> u16 {
        if self.tile_y() & 0x02 == 0x02 {
            4
        } else if self.tile_x() & 0x02 == 0x02 {
            2
        } else {
            0
        }
    }

    /// Replace the whole register, keeping the low 15 bits.
    #[inline]
    pub fn set_addr(&mut self, addr: u16) {
        self.v = addr & Self::REG_MASK;
    }

    /// Set the base nametable quadrant from a 2-bit select value.
    #[inline]
    pub fn set_nametable(&mut self, select: u8) {
        let nt_mask = Self::NT_Y_MASK | Self::NT_X_MASK;
        // val: ......BA
        // v: ....BA.. ........
        self.v = (self.v & !nt_mask) | ((u16::from(select) & 0x03) << 10);
    }

    /// Set coarse X from a pixel scroll value.
    #[inline]
    pub fn set_scroll_x(&mut self, val: u8) {
        // val: HGFEDCBA
        // v: ........ ...HGFED
        self.v = (self.v & !Self::COARSE_X_MASK) | (u16::from(val) >> 3);
    }

    /// Set coarse Y from a pixel scroll value. Fine Y is left untouched.
    #[inline]
    pub fn set_scroll_y(&mut self, val: u8) {
        // val: HGFEDCBA
        // v: ......HG FED.....
        self.v = (self.v & !Self::COARSE_Y_MASK) | ((u16::from(val) >> 3) << 5);
    }

    /// Increment by either 1 (going across) or 32 (going down), wrapping at 15 bits.
    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.v = self.v.wrapping_add(step) & Self::REG_MASK;
    }

    // Increment Coarse X
    // 0-4 bits are incremented, with overflow toggling bit 10 which switches the horizontal
    // nametable
    // http://wiki.nesdev.com/w/index.php/PPU_scrolling#Wrapping_around
    pub fn increment_x(&mut self) {
        if self.tile_x() == Self::X_MAX_COL {
            self.v = (self.v & !Self::COARSE_X_MASK) ^ Self::NT_X_MASK;
        } else {
            self.v += 1;
        }
    }

    // Increment Fine Y
    // Bits 12-14 are incremented for Fine Y, with overflow incrementing coarse Y in bits 5-9.
    // Only row 29 wraps and switches the vertical nametable; rows 30 and 31 are reachable by
    // scroll or address writes and just keep counting inside the 5-bit field.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.v += Self::Y_INCREMENT;
        } else {
            self.v &= !Self::FINE_Y_MASK;
            let y = self.tile_y();
            let y = if y == Self::Y_MAX_COL {
                self.v ^= Self::NT_Y_MASK;
                0
            } else {
                (y + 1) & 0x1F
            };
            self.v = (self.v & !Self::COARSE_Y_MASK) | (y << 5);
        }
    }

    // Copy Coarse X and the horizontal nametable bit from `other`
    #[inline]
    pub fn copy_x(&mut self, other: &Self) {
        //    .....N.. ...XXXXX
        // t: .....F.. ...EDCBA
        // v: .....F.. ...EDCBA
        let x_mask = Self::NT_X_MASK | Self::COARSE_X_MASK;
        self.v = (self.v & !x_mask) | (other.v & x_mask);
    }

    // Copy Fine Y, Coarse Y and the vertical nametable bit from `other`
    #[inline]
    pub fn copy_y(&mut self, other: &Self) {
        //    .yyyN.YY YYY.....
        // t: .IHGF.ED CBA.....
        // v: .IHGF.ED CBA.....
        let y_mask = Self::FINE_Y_MASK | Self::NT_Y_MASK | Self::COARSE_Y_MASK;
        self.v = (self.v & !y_mask) | (other.v & y_mask);
    }
}

impl std::fmt::Debug for Loopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loopy")
            .field("v", &format_args!("${:04X}", self.v))
            .field("tile_x", &self.tile_x())
            .field("tile_y", &self.tile_y())
            .field("fine_y", &self.fine_y())
            .field("nametable", &self.nametable())
            .finish()
    }
}

/// `$2005` PPUSCROLL and `$2006` PPUADDR (write-only).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Scroll {
    /// Current VRAM address, read by the rendering pipelines and `$2007`.
    pub v: Loopy,
    /// Temporary VRAM address, the top-left onscreen tile for the next frame.
    pub t: Loopy,
    pub latch: Latch,
}

impl Scroll {
    pub const fn new() -> Self {
        Self {
            v: Loopy::new(),
            t: Loopy::new(),
            latch: Latch::AwaitingHigh,
        }
    }

    /// Current `$2007` PPUDATA address.
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> u16 {
        self.v.data_addr()
    }

    // Writes to PPUSCROLL affect t
    // 1st write writes X
    // 2nd write writes Y
    pub fn write(&mut self, val: u8) {
        self.latch = match self.latch {
            Latch::AwaitingHigh => {
                self.t.set_scroll_x(val);
                Latch::AwaitingLow
            }
            Latch::AwaitingLow => {
                self.t.set_scroll_y(val);
                Latch::AwaitingHigh
            }
        };
    }

    // Write to PPUADDR affect v and t
    // 1st write writes hi 6 bits
    // 2nd write writes lo 8 bits
    pub fn write_addr(&mut self, val: u8) {
        self.latch = match self.latch {
            Latch::AwaitingHigh => {
                // val: ..FEDCBA
                //    FEDCBA98 76543210
                // t: 00FEDCBA ........
                let hi = (u16::from(val) & 0x3F) << 8;
                self.t.set_addr((self.t.raw() & 0x00FF) | hi);
                Latch::AwaitingLow
            }
            Latch::AwaitingLow => {
                // val: HGFEDCBA
                // t: ........ HGFEDCBA
                // v: t
                self.t.set_addr((self.t.raw() & 0x7F00) | u16::from(val));
                self.v = self.t;
                Latch::AwaitingHigh
            }
        };
    }

    #[inline]
    pub fn write_nametable_select(&mut self, val: u8) {
        self.t.set_nametable(val);
    }

    #[inline]
    pub fn reset_latch(&mut self) {
        self.latch = Latch::AwaitingHigh;
    }

    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.v.increment(step);
    }

    /// Horizontal scroll reload at the end of a rendered scanline.
    #[inline]
    pub fn copy_x(&mut self) {
        self.v.copy_x(&self.t);
    }

    /// Vertical scroll reload during the pre-render scanline.
    #[inline]
    pub fn copy_y(&mut self) {
        self.v.copy_y(&self.t);
    }
}
