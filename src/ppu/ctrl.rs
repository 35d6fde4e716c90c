//! PPUCTRL register implementation.
//!
//! See: <https://wiki.nesdev.com/w/index.php/PPU_registers#PPUCTRL>

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// PPUCTRL register.
///
/// See: <https://wiki.nesdev.com/w/index.php/PPU_registers#PPUCTRL>
#[derive(Default, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct Ctrl {
    pub spr_select: u16,
    pub bg_select: u16,
    pub spr_height: u16,
    pub nmi_enabled: bool,
    pub vram_increment: u16,
    bits: Bits,
}

bitflags! {
    // $2000 PPUCTRL
    //
    // http://wiki.nesdev.com/w/index.php/PPU_registers#PPUCTRL
    // VPHB SINN
    // |||| ||++- Nametable Select: 0b00 = $2000 (upper-left); 0b01 = $2400 (upper-right);
    // |||| ||                      0b10 = $2800 (lower-left); 0b11 = $2C00 (lower-right)
    // |||| |+--- VRAM Increment Mode: 0 = add 1, going across; 1 = add 32, going down
    // |||| +---- Sprite Pattern Select for 8x8: 0 = $0000, 1 = $1000, ignored in 8x16 mode
    // |||+------ Background Pattern Select: 0 = $0000, 1 = $1000
    // ||+------- Sprite Height: 0 = 8x8, 1 = 8x16
    // |+-------- PPU Master/Slave: unused
    // +--------- NMI Enable: NMI at next vblank: 0 = off, 1: on
    #[derive(Default, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
    #[must_use]
    pub struct Bits: u8 {
        const NAMETABLE1 = 0x01;
        const NAMETABLE2 = 0x02;
        const VRAM_INCREMENT = 0x04;
        const SPR_SELECT = 0x08;
        const BG_SELECT = 0x10;
        const SPR_HEIGHT = 0x20;
        const MASTER_SLAVE = 0x40;
        const NMI_ENABLE = 0x80;
    }
}

impl Ctrl {
    pub fn new() -> Self {
        let mut ctrl = Self::default();
        ctrl.write(0);
        ctrl
    }

    pub fn write(&mut self, val: u8) {
        self.bits = Bits::from_bits_truncate(val);
        // 0x1000 or 0x0000
        self.spr_select = self.bits.contains(Bits::SPR_SELECT) as u16 * 0x1000;
        // 0x1000 or 0x0000
        self.bg_select = self.bits.contains(Bits::BG_SELECT) as u16 * 0x1000;
        // 16 or 8
        self.spr_height = self.bits.contains(Bits::SPR_HEIGHT) as u16 * 8 + 8;
        self.nmi_enabled = self.bits.contains(Bits::NMI_ENABLE);
        // 32 or 1
        self.vram_increment = self.bits.contains(Bits::VRAM_INCREMENT) as u16 * 31 + 1;
    }

    /// Raw 2-bit nametable select.
    #[inline]
    #[must_use]
    pub const fn nametable_select(&self) -> u8 {
        self.bits.bits() & 0b11
    }

    /// Pattern table half used by background fetches: 0 = left ($0000), 1 = right ($1000).
    #[inline]
    #[must_use]
    pub const fn bg_half(&self) -> u16 {
        self.bg_select >> 12
    }

    /// Pattern table half used by 8x8 sprite fetches.
    #[inline]
    #[must_use]
    pub const fn spr_half(&self) -> u16 {
        self.spr_select >> 12
    }

    #[inline]
    #[must_use]
    pub const fn tall_sprites(&self) -> bool {
        self.spr_height == 16
    }
}
