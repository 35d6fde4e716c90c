//! PPUSTATUS register implementation.
//!
//! See: <https://wiki.nesdev.org/w/index.php/PPU_registers#PPUSTATUS>

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    // $2002 PPUSTATUS
    //
    // http://wiki.nesdev.com/w/index.php/PPU_registers#PPUSTATUS
    // VS.. ....
    // ||++-++++- Last value written to any PPU register.
    // |+-------- Sprite 0 Hit.  Set when a nonzero pixel of sprite 0 overlaps
    // |          a nonzero background pixel; cleared at dot 1 of the pre-render
    // |          line.  Used for raster timing.
    // +--------- Vertical blank has started (0: not in vblank; 1: in vblank)
    //            Set at dot 1 of line 241 (the line *after* the post-render
    //            line); cleared after reading $2002 and at dot 1 of the
    //            pre-render line.
    #[derive(Default, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
    #[must_use]
    pub struct Status: u8 {
        const SPR_ZERO_HIT = 0x40;
        const VBLANK_STARTED = 0x80;
    }
}

impl Status {
    pub const fn new() -> Self {
        Self::empty()
    }

    #[inline]
    #[must_use]
    pub const fn read(&self) -> u8 {
        self.bits()
    }

    #[inline]
    #[must_use]
    pub const fn spr_zero_hit(&self) -> bool {
        self.contains(Self::SPR_ZERO_HIT)
    }

    #[inline]
    pub fn set_spr_zero_hit(&mut self, val: bool) {
        self.set(Self::SPR_ZERO_HIT, val);
    }

    #[inline]
    #[must_use]
    pub const fn in_vblank(&self) -> bool {
        self.contains(Self::VBLANK_STARTED)
    }

    #[inline]
    pub fn set_in_vblank(&mut self, val: bool) {
        self.set(Self::VBLANK_STARTED, val);
    }

    #[inline]
    pub fn reset_in_vblank(&mut self) {
        self.remove(Self::VBLANK_STARTED);
    }
}
