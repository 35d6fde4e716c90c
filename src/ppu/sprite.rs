//! PPU OAM Sprite implementation.
//!
//! See: <https://www.nesdev.org/wiki/PPU_OAM>

use crate::ppu::shifter::Shifter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// PPU OAM Sprite entry.
///
/// Laid out in OAM as 4 consecutive bytes: Y, tile index, attributes, X.
///
/// See: <https://www.nesdev.org/wiki/PPU_OAM>
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Sprite {
    pub y: u8,
    pub tile: u8,
    pub attr: u8,
    pub x: u8,
}

impl Sprite {
    pub const BYTES: usize = 4;

    const PALETTE_MASK: u8 = 0x03;
    const BG_PRIORITY: u8 = 0x20;
    const FLIP_HORIZONTAL: u8 = 0x40;

    pub const fn new() -> Self {
        Self {
            y: 0xFF,
            tile: 0xFF,
            attr: 0xFF,
            x: 0xFF,
        }
    }

    /// Get a byte by its OAM offset (0-3).
    #[must_use]
    pub const fn byte(&self, offset: usize) -> u8 {
        match offset & 0x03 {
            0 => self.y,
            1 => self.tile,
            2 => self.attr,
            _ => self.x,
        }
    }

    /// Set a byte by its OAM offset (0-3).
    pub fn set_byte(&mut self, offset: usize, val: u8) {
        match offset & 0x03 {
            0 => self.y = val,
            1 => self.tile = val,
            2 => self.attr = val,
            _ => self.x = val,
        }
    }

    #[inline]
    #[must_use]
    pub const fn palette(&self) -> u8 {
        self.attr & Self::PALETTE_MASK
    }

    /// Whether the sprite is drawn behind the background.
    #[inline]
    #[must_use]
    pub const fn bg_priority(&self) -> bool {
        self.attr & Self::BG_PRIORITY == Self::BG_PRIORITY
    }

    #[inline]
    #[must_use]
    pub const fn flip_horizontal(&self) -> bool {
        self.attr & Self::FLIP_HORIZONTAL == Self::FLIP_HORIZONTAL
    }

    /// Whether `scanline` falls within the `height` rows starting at this sprite's Y.
    #[inline]
    #[must_use]
    pub fn in_range(&self, scanline: i32, height: u16) -> bool {
        let y = i32::from(self.y);
        (y..y + i32::from(height)).contains(&scanline)
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("y", &self.y)
            .field("tile", &format_args!("${:02X}", &self.tile))
            .field("attr", &format_args!("${:02X}", &self.attr))
            .field("x", &self.x)
            .finish()
    }
}

/// Render state for one of the 8 sprites selected on a scanline.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct SpriteSlot {
    /// Cycles left until the sprite starts drawing.
    pub x_counter: u8,
    /// Pixels left to draw; zero for unused slots.
    pub pixels_remaining: u8,
    pub attr: u8,
    pub shifter: Shifter,
}

impl SpriteSlot {
    pub const fn new() -> Self {
        Self {
            x_counter: 0x00,
            pixels_remaining: 0x00,
            attr: 0x00,
            shifter: Shifter::new(),
        }
    }

    /// Arm the slot for a sprite selected during evaluation.
    pub fn arm(&mut self, sprite: &Sprite) {
        self.x_counter = sprite.x;
        self.attr = sprite.attr;
        self.pixels_remaining = 8;
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.pixels_remaining > 0
    }

    #[inline]
    #[must_use]
    pub const fn palette(&self) -> u8 {
        self.attr & Sprite::PALETTE_MASK
    }

    #[inline]
    #[must_use]
    pub const fn bg_priority(&self) -> bool {
        self.attr & Sprite::BG_PRIORITY == Sprite::BG_PRIORITY
    }
}
