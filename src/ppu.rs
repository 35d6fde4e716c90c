//! NES PPU (Picture Processing Unit) implementation.

use crate::{
    common::{Clock, Reset},
    error::{Error, Result},
    ppu::{bus::Bus, frame::Frame},
};
use ctrl::Ctrl;
use mask::Mask;
use serde::{Deserialize, Serialize};
use shifter::Shifter;
use sprite::{Sprite, SpriteSlot};
use status::Status;
use tracing::{error, trace, warn};

pub mod background;
pub mod bus;
pub mod ctrl;
pub mod frame;
pub mod mask;
pub mod oam;
pub mod scroll;
pub mod shifter;
pub mod sprite;
pub mod status;

use bus::TileRow;
use scroll::Scroll;

/// Nametable Mirroring Mode
///
/// <https://wiki.nesdev.org/w/index.php/Mirroring#Nametable_Mirroring>
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[must_use]
pub enum Mirroring {
    #[default]
    Horizontal = 0,
    Vertical = 1,
}

impl From<u8> for Mirroring {
    /// `0` selects horizontal mirroring, any other value vertical.
    fn from(val: u8) -> Self {
        if val == 0 {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

impl From<Mirroring> for u8 {
    fn from(mirroring: Mirroring) -> Self {
        mirroring as u8
    }
}

/// PPU configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[must_use]
pub struct Config {
    /// Nametable mirroring supplied by the cartridge.
    pub mirroring: Mirroring,
    /// Cycles added to the cycle counter when the host acknowledges an NMI.
    pub nmi_latency_cycles: u32,
    /// Cycle counter value after [`Reset::reset`].
    pub warmup_cycles: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirroring: Mirroring::default(),
            nmi_latency_cycles: 21,
            warmup_cycles: 24,
        }
    }
}

/// Trait for PPU Registers.
pub trait Registers {
    /// $2000 PPUCTRL
    fn write_ctrl(&mut self, val: u8);
    /// Write $2001 PPUMASK
    fn write_mask(&mut self, val: u8);
    /// Read $2002 PPUSTATUS
    fn read_status(&mut self) -> u8;
    /// Peek $2002 PPUSTATUS
    fn peek_status(&self) -> u8;
    /// Write $2003 OAMADDR
    fn write_oamaddr(&mut self, val: u8);
    /// Write $2004 OAMDATA
    fn write_oamdata(&mut self, val: u8);
    /// Write $2005 PPUSCROLL
    fn write_scroll(&mut self, val: u8);
    /// Write $2006 PPUADDR
    fn write_addr(&mut self, val: u8);
    /// Read $2007 PPUDATA
    fn read_data(&mut self) -> Result<u8>;
    /// Peek $2007 PPUDATA
    fn peek_data(&self) -> Result<u8>;
    /// Write $2007 PPUDATA
    fn write_data(&mut self, val: u8) -> Result<()>;
}

/// NES PPU.
///
/// See: <https://wiki.nesdev.org/w/index.php/PPU>
#[derive(Clone)]
#[must_use]
pub struct Ppu {
    /// (0, 340) cycles per scanline.
    pub cycle: u32,
    /// (-1, 260) scanlines per frame, -1 being the pre-render scanline.
    pub scanline: i32,
    pub config: Config,

    /// $2005 PPUSCROLL and $2006 PPUADDR (write-only).
    pub scroll: Scroll,
    /// $2001 PPUMASK (write-only).
    pub mask: Mask,
    /// $2000 PPUCTRL (write-only).
    pub ctrl: Ctrl,
    /// $2002 PPUSTATUS (read-only).
    pub status: Status,
    /// PPU Memory/Data Bus.
    pub bus: Bus,

    pub tile_shifter: Shifter,
    pub attr_shifter: Shifter,
    pub next_tile_id: u8,
    pub next_tile: TileRow,
    pub next_attr: u8,
    /// Background pixel value (0-3) of the current cycle.
    pub bg_pixel: u8,

    /// $2003 OAM addr (write-only).
    pub oamaddr: u8,
    pub oam: [Sprite; Self::OAM_SPRITES],
    pub secondary_oam: [Sprite; Self::MAX_SPRITES],
    pub spr_count: usize,
    pub sprites: [SpriteSlot; Self::MAX_SPRITES],

    /// $2007 PPUDATA read buffer.
    pub vram_buffer: u8,
    /// Last value written to any register.
    pub open_bus: u8,
    pub nmi_pending: bool,
    pub frame: Frame,
}

impl Ppu {
    pub const WIDTH: u32 = 256;
    pub const HEIGHT: u32 = 240;
    pub const SIZE: usize = (Self::WIDTH * Self::HEIGHT) as usize;

    pub const OAM_SPRITES: usize = 64;
    pub const MAX_SPRITES: usize = 8;

    pub const CYCLE_END: u32 = 340;
    pub const VBLANK: u32 = 1; // When VBlank starts and ends
    pub const VISIBLE_END: u32 = 256; // 1-256 output pixels
    pub const SHIFT_END: u32 = 336;
    pub const COPY_X: u32 = 257;
    pub const COPY_Y_START: u32 = 280;
    pub const COPY_Y_END: u32 = 304;
    pub const BG_PREFETCH: u32 = 322;
    pub const SPR_CLEAR: u32 = 1;
    pub const SPR_EVAL: u32 = 256;
    pub const SPR_LOAD: u32 = 257;

    pub const PRERENDER_SCANLINE: i32 = -1;
    pub const VISIBLE_SCANLINE_END: i32 = 239;
    pub const POSTRENDER_SCANLINE: i32 = 240;
    pub const VBLANK_SCANLINE: i32 = 241;
    pub const LAST_SCANLINE: i32 = 260;
    pub const SCANLINES_PER_FRAME: u64 =
        (Self::LAST_SCANLINE - Self::PRERENDER_SCANLINE + 1) as u64;

    pub const PALETTE_START: u16 = 0x3F00;
    pub const SPR_PALETTE_START: u16 = 0x3F10;

    /// 64-entry table from a 6-bit NES color index to `0x00RRGGBB`.
    pub const SYSTEM_PALETTE: [u32; 64] = [
        0x0054_5454, 0x0000_1E74, 0x0008_1090, 0x0030_0088, // $00-$03
        0x0044_0064, 0x005C_0030, 0x0054_0400, 0x003C_1800, // $04-$07
        0x0020_2A00, 0x0008_3A00, 0x0000_4000, 0x0000_3C00, // $08-$0B
        0x0000_323C, 0x0000_0000, 0x0000_0000, 0x0000_0000, // $0C-$0F
        0x0098_9698, 0x0008_4CC4, 0x0030_32EC, 0x005C_1EE4, // $10-$13
        0x0088_14B0, 0x00A0_1464, 0x0098_2220, 0x0078_3C00, // $14-$17
        0x0054_5A00, 0x0028_7200, 0x0008_7C00, 0x0000_7628, // $18-$1B
        0x0000_6678, 0x0000_0000, 0x0000_0000, 0x0000_0000, // $1C-$1F
        0x00EC_EEEC, 0x004C_9AEC, 0x0078_7CEC, 0x00B0_62EC, // $20-$23
        0x00E4_54EC, 0x00EC_58B4, 0x00EC_6A64, 0x00D4_8820, // $24-$27
        0x00A0_AA00, 0x0074_C400, 0x004C_D020, 0x0038_CC6C, // $28-$2B
        0x0038_B4CC, 0x003C_3C3C, 0x0000_0000, 0x0000_0000, // $2C-$2F
        0x00EC_EEEC, 0x00A8_CCEC, 0x00BC_BCEC, 0x00D4_B2EC, // $30-$33
        0x00EC_AEEC, 0x00EC_AED4, 0x00EC_B4B0, 0x00E4_C490, // $34-$37
        0x00CC_D278, 0x00B4_DE78, 0x00A8_E290, 0x0098_E2B4, // $38-$3B
        0x00A0_D6E4, 0x00A0_A2A0, 0x0000_0000, 0x0000_0000, // $3C-$3F
    ];

    /// Create a PPU owning `chr` pattern data (at least 8KB) with the given nametable mirroring.
    pub fn new(chr: Vec<u8>, mirroring: Mirroring) -> Result<Self> {
        Self::with_config(
            chr,
            Config {
                mirroring,
                ..Default::default()
            },
        )
    }

    pub fn with_config(chr: Vec<u8>, config: Config) -> Result<Self> {
        Ok(Self {
            cycle: 0,
            scanline: 0,
            config,

            scroll: Scroll::new(),
            mask: Mask::new(),
            ctrl: Ctrl::new(),
            status: Status::new(),
            bus: Bus::new(chr, config.mirroring)?,

            tile_shifter: Shifter::new(),
            attr_shifter: Shifter::new(),
            next_tile_id: 0x00,
            next_tile: TileRow::default(),
            next_attr: 0x00,
            bg_pixel: 0x00,

            oamaddr: 0x00,
            oam: [Sprite::new(); Self::OAM_SPRITES],
            secondary_oam: [Sprite::new(); Self::MAX_SPRITES],
            spr_count: 0,
            sprites: [SpriteSlot::new(); Self::MAX_SPRITES],

            vram_buffer: 0x00,
            open_bus: 0x00,
            nmi_pending: false,
            frame: Frame::new(),
        })
    }

    /// Whether `addr` is one of the eight PPU registers.
    #[inline]
    #[must_use]
    pub const fn is_address_valid(addr: u16) -> bool {
        matches!(addr, 0x2000..=0x2007)
    }

    /// Write a register by its CPU bus address.
    pub fn write(&mut self, addr: u16, val: u8) -> Result<()> {
        match addr {
            0x2000 => self.write_ctrl(val),
            0x2001 => self.write_mask(val),
            0x2002 => {
                self.open_bus = val;
                warn!("ignoring write to read-only $2002 with ${val:02X}");
            }
            0x2003 => self.write_oamaddr(val),
            0x2004 => self.write_oamdata(val),
            0x2005 => self.write_scroll(val),
            0x2006 => self.write_addr(val),
            0x2007 => self.write_data(val)?,
            _ => {
                error!("invalid PPU register write at ${addr:04X} with ${val:02X}");
                return Err(Error::InvalidRegister { addr });
            }
        }
        Ok(())
    }

    /// Read a register by its CPU bus address. Only `$2002` and `$2007` are readable.
    pub fn read(&mut self, addr: u16) -> Result<u8> {
        match addr {
            0x2002 => Ok(self.read_status()),
            0x2007 => self.read_data(),
            _ => {
                error!("invalid PPU register read at ${addr:04X}");
                Err(Error::InvalidRegister { addr })
            }
        }
    }

    #[inline]
    #[must_use]
    pub const fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Acknowledge a pending NMI, advancing the cycle counter by the NMI latency.
    ///
    /// Cycles past the end of the scanline carry into the following scanlines.
    pub fn clear_nmi(&mut self) {
        trace!("NMI Ack - PPU:{:3},{:3}", self.cycle, self.scanline);
        self.nmi_pending = false;

        let cycles_per_line = u64::from(Self::CYCLE_END) + 1;
        let cycle = u64::from(self.cycle) + u64::from(self.config.nmi_latency_cycles);
        self.cycle = (cycle % cycles_per_line) as u32;
        // Position and parity repeat every two frames
        let carry = (cycle / cycles_per_line) % (2 * Self::SCANLINES_PER_FRAME);
        for _ in 0..carry {
            self.next_scanline();
        }
    }

    #[inline]
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    #[inline]
    #[must_use]
    pub const fn scanline(&self) -> i32 {
        self.scanline
    }

    #[inline]
    #[must_use]
    pub fn frame_buffer(&self) -> &[u32] {
        self.frame.buffer()
    }

    #[inline]
    #[must_use]
    pub const fn frame_number(&self) -> u32 {
        self.frame.number()
    }

    #[inline]
    #[must_use]
    pub const fn is_odd_frame(&self) -> bool {
        self.frame.is_odd()
    }

    #[inline]
    #[must_use]
    pub const fn bg_rendering_enabled(&self) -> bool {
        self.mask.show_bg
    }

    /// Clock until the frame counter advances, returning the number of cycles run.
    pub fn clock_frame(&mut self) -> Result<u64> {
        let frame = self.frame_number();
        let mut cycles = 0;
        while self.frame_number() == frame {
            cycles += self.clock()?;
        }
        Ok(cycles)
    }

    /// Resolve a palette RAM entry to a system palette color.
    #[inline]
    fn system_color(bus: &Bus, base: u16, palette: u8, pixel: u8) -> u32 {
        let addr = base + (u16::from(palette) << 2) + u16::from(pixel);
        Self::SYSTEM_PALETTE[usize::from(bus.read_palette(addr) & 0x3F)]
    }

    fn start_vblank(&mut self) {
        trace!("Start VBL - PPU:{:3},{:3}", self.cycle, self.scanline);
        self.status.set_in_vblank(true);
        if self.ctrl.nmi_enabled {
            self.nmi_pending = true;
            trace!("VBL NMI - PPU:{:3},{:3}", self.cycle, self.scanline);
        }
    }

    fn stop_vblank(&mut self) {
        trace!(
            "Stop VBL, Sprite0 Hit - PPU:{:3},{:3}",
            self.cycle,
            self.scanline
        );
        self.status.reset_in_vblank();
        self.status.set_spr_zero_hit(false);
    }

    fn next_scanline(&mut self) {
        self.scanline += 1;
        if self.scanline > Self::LAST_SCANLINE {
            self.scanline = Self::PRERENDER_SCANLINE;
            self.frame.toggle_parity();
        }
    }

    fn tick(&mut self) -> Result<()> {
        match self.scanline {
            Self::PRERENDER_SCANLINE => {
                if self.cycle == Self::VBLANK {
                    self.stop_vblank();
                }
                if self.mask.show_bg {
                    self.prerender_background()?;
                }
            }
            0..=Self::VISIBLE_SCANLINE_END => {
                if self.mask.show_bg {
                    if self.scanline == 0 && self.cycle == 0 && self.frame.is_odd() {
                        trace!("Skipped odd frame cycle: {}", self.frame_number());
                        self.cycle = 1;
                    }
                    self.render_background()?;
                }
                if self.mask.show_spr {
                    self.render_sprites()?;
                }
            }
            Self::POSTRENDER_SCANLINE if self.cycle == 0 => self.frame.increment(),
            Self::VBLANK_SCANLINE if self.cycle == Self::VBLANK => self.start_vblank(),
            _ => (),
        }
        Ok(())
    }
}

impl Registers for Ppu {
    // $2000 | W   | PPUCTRL
    //       | 0-1 | Name Table to show: 0 = $2000, 1 = $2400, 2 = $2800, 3 = $2C00
    //       |   2 | Vertical Write, 1 = PPU memory address increments by 32
    //       |   3 | Sprite Pattern Table address, 1 = $1000, 0 = $0000
    //       |   4 | Screen Pattern Table address, 1 = $1000, 0 = $0000
    //       |   5 | Sprite Size, 1 = 8x16, 0 = 8x8
    //       |   7 | VBlank Switch, 1 = generate interrupts on VBlank
    fn write_ctrl(&mut self, val: u8) {
        self.open_bus = val;
        self.ctrl.write(val);
        self.scroll.write_nametable_select(self.ctrl.nametable_select());
        trace!(
            "$2000 NMI Enabled: {} - PPU:{:3},{:3}",
            self.ctrl.nmi_enabled,
            self.cycle,
            self.scanline,
        );
    }

    // $2001 | W   | PPUMASK
    //       |   3 | BG Switch, 1 = show background, 0 = hide background
    //       |   4 | Sprites Switch, 1 = show sprites, 0 = hide sprites
    fn write_mask(&mut self, val: u8) {
        self.open_bus = val;
        self.mask.write(val);
    }

    // $2002 | R   | PPUSTATUS
    //       | 0-4 | Last value written to a PPU register
    //       |   6 | Sprite0 Hit Flag, 1 = PPU rendering has hit sprite #0
    //       |     | This flag resets to 0 on the pre-render scanline only
    //       |   7 | VBlank Flag, 1 = PPU is generating a Vertical Blanking Impulse
    //       |     | This flag resets to 0 when VBlank ends, or CPU reads $2002
    fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.status.reset_in_vblank();
        self.scroll.reset_latch();
        trace!(
            "$2002 read: {status:02X} - PPU:{:3},{:3}",
            self.cycle,
            self.scanline
        );
        status
    }

    // Non-mutating version of `read_status`.
    fn peek_status(&self) -> u8 {
        (self.open_bus & 0x1F) | (self.status.read() & 0xE0)
    }

    // $2003 | W   | OAMADDR
    fn write_oamaddr(&mut self, val: u8) {
        self.open_bus = val;
        self.oamaddr = val;
    }

    // $2004 | W   | OAMDATA
    //       |     | Writes at OAMADDR, which then increments by 1.
    fn write_oamdata(&mut self, val: u8) {
        self.open_bus = val;
        self.write_oam_data(usize::from(self.oamaddr), val);
        self.oamaddr = self.oamaddr.wrapping_add(1);
    }

    // $2005 | W   | PPUSCROLL
    fn write_scroll(&mut self, val: u8) {
        self.open_bus = val;
        self.scroll.write(val);
    }

    // $2006 | W   | PPUADDR
    fn write_addr(&mut self, val: u8) {
        self.open_bus = val;
        self.scroll.write_addr(val);
    }

    // $2007 | RW  | PPUDATA
    fn read_data(&mut self) -> Result<u8> {
        let addr = self.scroll.addr();
        self.scroll.increment(self.ctrl.vram_increment);

        // Buffering quirk resulting in a dummy read for the CPU
        // for reading pre-palette data in $0000 - $3EFF
        let val = if addr < Self::PALETTE_START {
            let buffer = self.vram_buffer;
            self.vram_buffer = self.bus.read(addr)?;
            buffer
        } else {
            // Set internal buffer with mirrors of nametable when reading palettes
            // Since we're reading from > $3EFF subtract $1000 to fill
            // buffer with nametable mirror data
            self.vram_buffer = self.bus.read(addr - 0x1000)?;
            self.bus.read(addr)?
        };

        trace!(
            "PPU $2007 read: {val:02X} - PPU:{:3},{:3}",
            self.cycle,
            self.scanline
        );
        Ok(val)
    }

    // Non-mutating version of `read_data`.
    fn peek_data(&self) -> Result<u8> {
        let addr = self.scroll.addr();
        if addr < Self::PALETTE_START {
            Ok(self.vram_buffer)
        } else {
            self.bus.peek(addr)
        }
    }

    // $2007 | RW  | PPUDATA
    //       |     | Unlike $2000-$2006, leaves the $2002 low bits alone.
    fn write_data(&mut self, val: u8) -> Result<()> {
        let addr = self.scroll.addr();
        trace!(
            "PPU $2007 write: ${addr:04X} -> {val:02X} - PPU:{:3},{:3}",
            self.cycle,
            self.scanline
        );
        self.scroll.increment(self.ctrl.vram_increment);
        self.bus.write(addr, val)
    }
}

impl Clock for Ppu {
    fn clock(&mut self) -> Result<u64> {
        self.tick()?;

        self.cycle += 1;
        if self.cycle > Self::CYCLE_END {
            self.cycle = 0;
            self.next_scanline();
        }
        Ok(1)
    }
}

impl Reset for Ppu {
    /// Seed the cycle counter with the warm-up offset, leaving all other state untouched.
    fn reset(&mut self) {
        self.cycle = self.config.warmup_cycles;
    }
}

impl std::fmt::Debug for Ppu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ppu")
            .field("cycle", &self.cycle)
            .field("scanline", &self.scanline)
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("status", &self.status)
            .field("scroll", &self.scroll)
            .field("oamaddr", &self.oamaddr)
            .field("spr_count", &self.spr_count)
            .field("sprites", &self.sprites)
            .field("tile_shifter", &self.tile_shifter)
            .field("attr_shifter", &self.attr_shifter)
            .field("next_tile_id", &self.next_tile_id)
            .field("next_tile", &self.next_tile)
            .field("next_attr", &self.next_attr)
            .field("bg_pixel", &self.bg_pixel)
            .field("vram_buffer", &self.vram_buffer)
            .field("open_bus", &self.open_bus)
            .field("nmi_pending", &self.nmi_pending)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ppu_with(mirroring: Mirroring) -> Ppu {
        Ppu::new(vec![0x00; 0x2000], mirroring).expect("valid ppu")
    }

    fn ppu() -> Ppu {
        ppu_with(Mirroring::Horizontal)
    }

    #[test]
    fn power_on_state() {
        let ppu = ppu();
        assert_eq!(ppu.scanline(), 0);
        assert_eq!(ppu.cycle(), 0);
        assert_eq!(ppu.frame_number(), 1);
        assert!(ppu.is_odd_frame());
        assert!(!ppu.nmi_pending());
        assert!(!ppu.bg_rendering_enabled());
        assert!(ppu.oam.iter().all(|sprite| *sprite == Sprite::new()));
        assert_eq!(ppu.frame_buffer().len(), Ppu::SIZE);
    }

    #[test]
    fn short_chr_fails_construction() {
        assert_eq!(
            Ppu::new(vec![0x00; 0x1FFF], Mirroring::Vertical).err(),
            Some(Error::InvalidChrSize {
                expected: 0x2000,
                len: 0x1FFF
            })
        );
    }

    #[test]
    fn mirroring_from_byte() {
        assert_eq!(Mirroring::from(0), Mirroring::Horizontal);
        assert_eq!(Mirroring::from(1), Mirroring::Vertical);
        assert_eq!(Mirroring::from(0xFF), Mirroring::Vertical);
        assert_eq!(u8::from(Mirroring::Vertical), 1);
    }

    #[test]
    fn address_window() {
        assert!(!Ppu::is_address_valid(0x1FFF));
        for addr in 0x2000..0x2008 {
            assert!(Ppu::is_address_valid(addr));
        }
        assert!(!Ppu::is_address_valid(0x2008));
    }

    #[test]
    fn invalid_registers() {
        let mut ppu = ppu();
        assert_eq!(
            ppu.read(0x2000),
            Err(Error::InvalidRegister { addr: 0x2000 })
        );
        assert_eq!(
            ppu.read(0x2004),
            Err(Error::InvalidRegister { addr: 0x2004 })
        );
        assert_eq!(
            ppu.write(0x2008, 0x00),
            Err(Error::InvalidRegister { addr: 0x2008 })
        );
        // Writes to the read-only status register are ignored
        ppu.status.set_in_vblank(true);
        assert_eq!(ppu.write(0x2002, 0x00), Ok(()));
        assert!(ppu.status.in_vblank());
    }

    #[test]
    fn vram_writes() -> Result<()> {
        let mut ppu = ppu();
        ppu.write(0x2006, 0x23)?;
        ppu.write(0x2006, 0x05)?;
        ppu.write(0x2007, 0x66)?; // write to $2305

        assert_eq!(ppu.bus.read_ciram(0x2305), 0x66);
        assert_eq!(ppu.scroll.addr(), 0x2306);
        Ok(())
    }

    #[test]
    fn vram_reads() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0x00);
        ppu.bus.write(0x2305, 0x66)?;

        ppu.write_addr(0x23);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.scroll.addr(), 0x2306);
        assert_eq!(ppu.read_data()?, 0x66);
        assert_eq!(ppu.scroll.addr(), 0x2307);
        Ok(())
    }

    #[test]
    fn vram_read_pagecross() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0x00);
        ppu.bus.write(0x21FF, 0x66)?;
        ppu.bus.write(0x2200, 0x77)?;

        ppu.write_addr(0x21);
        ppu.write_addr(0xFF);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x66);
        assert_eq!(ppu.read_data()?, 0x77);
        Ok(())
    }

    #[test]
    fn vram_read_vertical_increment() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0b100);
        ppu.bus.write(0x2108, 0x66)?;
        ppu.bus.write(0x2108 + 32, 0x77)?;
        ppu.bus.write(0x2108 + 64, 0x88)?;

        ppu.write(0x2006, 0x21)?;
        ppu.write(0x2006, 0x08)?;
        assert_eq!(ppu.scroll.addr(), 0x2108);
        ppu.read(0x2007)?; // buffer read
        assert_eq!(ppu.scroll.addr(), 0x2108 + 32);
        assert_eq!(ppu.read(0x2007)?, 0x66);
        assert_eq!(ppu.read(0x2007)?, 0x77);
        assert_eq!(ppu.read(0x2007)?, 0x88);
        Ok(())
    }

    // Horizontal: https://wiki.nesdev.org/w/index.php/Mirroring
    //   [0x2000 A ] [0x2400 a ]
    //   [0x2800 B ] [0x2C00 b ]
    #[test]
    fn vram_horizontal_mirror() -> Result<()> {
        let mut ppu = ppu_with(Mirroring::Horizontal);
        ppu.write_addr(0x24);
        ppu.write_addr(0x05);
        ppu.write_data(0x66)?; // write to a at $2405

        ppu.write_addr(0x28);
        ppu.write_addr(0x05);
        ppu.write_data(0x77)?; // write to B at $2805

        ppu.write_addr(0x20);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x66); // read A from $2005

        ppu.write_addr(0x2C);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x77); // read b from $2C05
        Ok(())
    }

    // Vertical: https://wiki.nesdev.org/w/index.php/Mirroring
    //   [0x2000 A ] [0x2400 B ]
    //   [0x2800 a ] [0x2C00 b ]
    #[test]
    fn vram_vertical_mirror() -> Result<()> {
        let mut ppu = ppu_with(Mirroring::Vertical);
        ppu.write_addr(0x20);
        ppu.write_addr(0x05);
        ppu.write_data(0x66)?; // write to A at $2005

        ppu.write_addr(0x2C);
        ppu.write_addr(0x05);
        ppu.write_data(0x77)?; // write to b at $2C05

        ppu.write_addr(0x28);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x66); // read a from $2805

        ppu.write_addr(0x24);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x77); // read B from $2405
        Ok(())
    }

    #[test]
    fn vram_mirroring() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0);
        ppu.bus.write(0x2305, 0x66)?;

        ppu.write_addr(0x63); // 0x6305 mirrors to 0x2305
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.scroll.addr(), 0x2306);
        assert_eq!(ppu.read_data()?, 0x66);
        assert_eq!(ppu.scroll.addr(), 0x2307);
        Ok(())
    }

    #[test]
    fn palette_reads_are_unbuffered() -> Result<()> {
        let mut ppu = ppu();
        ppu.bus.write(0x3F01, 0x2A)?;
        // Horizontal mirroring resolves $2F01 to the second nametable
        ppu.bus.write(0x2F01, 0x55)?;

        ppu.write_addr(0x3F);
        ppu.write_addr(0x01);
        assert_eq!(ppu.peek_data()?, 0x2A);
        assert_eq!(ppu.read_data()?, 0x2A);
        assert_eq!(ppu.vram_buffer, 0x55);

        ppu.write_addr(0x20);
        ppu.write_addr(0x00);
        assert_eq!(ppu.peek_data()?, 0x55);
        assert_eq!(ppu.read_data()?, 0x55);
        Ok(())
    }

    #[test]
    fn pattern_writes_through_data_port() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_addr(0x10);
        ppu.write_addr(0x20);
        ppu.write_data(0xA5)?;
        assert_eq!(ppu.bus.read(0x1020)?, 0xA5);
        Ok(())
    }

    #[test]
    fn read_status_resets_latch() -> Result<()> {
        let mut ppu = ppu();
        ppu.bus.write(0x2305, 0x66)?;

        ppu.write_addr(0x21);
        ppu.write_addr(0x23);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_ne!(ppu.read_data()?, 0x66);

        ppu.read_status();

        ppu.write_addr(0x23);
        ppu.write_addr(0x05);
        ppu.read_data()?; // buffer read
        assert_eq!(ppu.read_data()?, 0x66);
        Ok(())
    }

    #[test]
    fn read_status_resets_vblank() -> Result<()> {
        let mut ppu = ppu();
        ppu.status.set_in_vblank(true);
        ppu.status.set_spr_zero_hit(true);
        ppu.write(0x2005, 0xFF)?;

        let status = ppu.read(0x2002)?;
        assert_eq!(status, 0xC0 | 0x1F);
        assert_eq!(ppu.status.read() >> 7, 0);
        assert!(ppu.status.spr_zero_hit());
        assert_eq!(ppu.peek_status(), 0x40 | 0x1F);
        Ok(())
    }

    #[test]
    fn scroll_y_write_sets_coarse_y_only() -> Result<()> {
        let mut ppu = ppu();
        ppu.write(0x2005, 0x00)?;
        ppu.write(0x2005, 0x05)?;
        assert_eq!(ppu.scroll.t.tile_y(), 0);
        assert_eq!(ppu.scroll.t.fine_y(), 0);

        ppu.write(0x2005, 0x00)?;
        ppu.write(0x2005, 0x2F)?;
        assert_eq!(ppu.scroll.t.tile_y(), 5);
        assert_eq!(ppu.scroll.t.fine_y(), 0);
        Ok(())
    }

    #[test]
    fn data_writes_leave_status_low_bits() -> Result<()> {
        let mut ppu = ppu();
        ppu.write(0x2006, 0x20)?;
        ppu.write(0x2006, 0x00)?;
        assert_eq!(ppu.read(0x2002)? & 0x1F, 0x00);

        ppu.write(0x2007, 0x1F)?;
        assert_eq!(ppu.read(0x2002)? & 0x1F, 0x00);
        assert_eq!(ppu.bus.peek(0x2000)?, 0x1F);

        ppu.write(0x2005, 0x0A)?;
        ppu.write(0x2007, 0x15)?;
        assert_eq!(ppu.peek_status() & 0x1F, 0x0A);
        Ok(())
    }

    #[test]
    fn oam_read_write() -> Result<()> {
        let mut ppu = ppu();
        ppu.write(0x2003, 0x10)?;
        ppu.write(0x2004, 0x66)?;
        ppu.write(0x2004, 0x77)?;

        assert_eq!(ppu.oamaddr, 0x12);
        assert_eq!(ppu.read_oam_data(0x10), Some(0x66));
        assert_eq!(ppu.read_oam_data(0x11), Some(0x77));
        assert_eq!(ppu.oam[4].y, 0x66);
        assert_eq!(ppu.oam[4].tile, 0x77);

        ppu.write_oamaddr(0xFF);
        ppu.write_oamdata(0x88);
        assert_eq!(ppu.oamaddr, 0x00);
        assert_eq!(ppu.oam[63].x, 0x88);
        Ok(())
    }

    #[test]
    fn full_frame_returns_to_prerender() -> Result<()> {
        let mut ppu = ppu();
        ppu.scanline = Ppu::PRERENDER_SCANLINE;
        ppu.cycle = 0;
        ppu.frame.is_odd = false;
        let frame = ppu.frame_number();

        for _ in 0..341 * 262 {
            let (scanline, cycle) = (ppu.scanline(), ppu.cycle());
            ppu.clock()?;
            let expected = if (scanline, cycle) < (Ppu::POSTRENDER_SCANLINE, 0) {
                frame
            } else {
                frame + 1
            };
            assert_eq!(ppu.frame_number(), expected, "PPU:{cycle:3},{scanline:3}");
        }

        assert_eq!(ppu.scanline(), Ppu::PRERENDER_SCANLINE);
        assert_eq!(ppu.cycle(), 0);
        assert_eq!(ppu.frame_number(), frame + 1);
        assert!(ppu.is_odd_frame());
        Ok(())
    }

    #[test]
    fn odd_frame_skips_first_cycle() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_mask(0x08);
        assert!(ppu.is_odd_frame());
        ppu.clock()?;
        assert_eq!(ppu.cycle(), 2);

        let mut ppu = self::ppu();
        ppu.write_mask(0x08);
        ppu.frame.is_odd = false;
        ppu.clock()?;
        assert_eq!(ppu.cycle(), 1);

        // No skip without background rendering
        let mut ppu = self::ppu();
        ppu.clock()?;
        assert_eq!(ppu.cycle(), 1);
        Ok(())
    }

    #[test]
    fn odd_frame_is_one_cycle_shorter() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_mask(0x08);
        ppu.scanline = Ppu::PRERENDER_SCANLINE;
        ppu.frame.is_odd = true;
        // Run the pre-render line so the next frame starts at (0, 0)
        for _ in 0..341 {
            ppu.clock()?;
        }
        assert_eq!((ppu.scanline(), ppu.cycle()), (0, 0));
        // (240, 0) is the last cycle clocked, minus the skipped cycle
        assert_eq!(ppu.clock_frame()?, 341 * 240);
        Ok(())
    }

    #[test]
    fn vblank_raises_nmi() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0x80);
        ppu.scanline = Ppu::VBLANK_SCANLINE;
        ppu.cycle = 0;
        ppu.clock()?;
        assert!(!ppu.status.in_vblank());
        assert!(!ppu.nmi_pending());

        ppu.clock()?;
        assert!(ppu.status.in_vblank());
        assert!(ppu.nmi_pending());

        ppu.clear_nmi();
        assert!(!ppu.nmi_pending());
        assert_eq!(ppu.cycle(), 2 + 21);
        Ok(())
    }

    #[test]
    fn vblank_without_nmi_enabled() -> Result<()> {
        let mut ppu = ppu();
        ppu.scanline = Ppu::VBLANK_SCANLINE;
        ppu.cycle = 1;
        ppu.clock()?;
        assert!(ppu.status.in_vblank());
        assert!(!ppu.nmi_pending());
        Ok(())
    }

    #[test]
    fn prerender_clears_flags() -> Result<()> {
        let mut ppu = ppu();
        ppu.status.set_in_vblank(true);
        ppu.status.set_spr_zero_hit(true);
        ppu.scanline = Ppu::PRERENDER_SCANLINE;
        ppu.cycle = 0;
        ppu.clock()?;
        assert_eq!(ppu.status.read(), 0xC0);
        ppu.clock()?;
        assert_eq!(ppu.status.read(), 0x00);
        Ok(())
    }

    #[test]
    fn clear_nmi_carries_into_next_scanline() {
        let mut ppu = ppu();
        ppu.scanline = 250;
        ppu.cycle = 330;
        ppu.clear_nmi();
        assert_eq!(ppu.scanline(), 251);
        assert_eq!(ppu.cycle(), 330 + 21 - 341);

        ppu.scanline = Ppu::LAST_SCANLINE;
        ppu.cycle = Ppu::CYCLE_END;
        ppu.frame.is_odd = false;
        ppu.clear_nmi();
        assert_eq!(ppu.scanline(), Ppu::PRERENDER_SCANLINE);
        assert_eq!(ppu.cycle(), 20);
        assert!(ppu.is_odd_frame());
    }

    #[test]
    fn clear_nmi_with_huge_latency() -> Result<()> {
        let mut ppu = Ppu::with_config(
            vec![0x00; 0x2000],
            Config {
                nmi_latency_cycles: u32::MAX,
                ..Default::default()
            },
        )?;
        ppu.scanline = 241;
        ppu.cycle = 1;
        let odd = ppu.is_odd_frame();
        ppu.clear_nmi();
        // 2^32 cycles = 12_595_212 scanlines + 4 cycles
        assert_eq!(ppu.cycle(), 4);
        assert_eq!(ppu.scanline(), 65);
        assert_eq!(ppu.is_odd_frame(), odd);
        Ok(())
    }

    #[test]
    fn reset_seeds_cycle_counter() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_ctrl(0x80);
        ppu.scanline = 100;
        ppu.reset();
        assert_eq!(ppu.cycle(), 24);
        assert_eq!(ppu.scanline(), 100);
        assert!(ppu.ctrl.nmi_enabled);

        let mut ppu = Ppu::with_config(
            vec![0x00; 0x2000],
            Config {
                warmup_cycles: 7,
                ..Default::default()
            },
        )?;
        ppu.reset();
        assert_eq!(ppu.cycle(), 7);
        Ok(())
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "mirroring": "Vertical" }"#).expect("valid config");
        assert_eq!(config.mirroring, Mirroring::Vertical);
        assert_eq!(config.nmi_latency_cycles, 21);
        assert_eq!(config.warmup_cycles, 24);
    }

    #[test]
    fn sprite_zero_hit_over_opaque_background() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_mask(0x18);
        ppu.scanline = 0;
        ppu.cycle = 10;

        ppu.tile_shifter.load_full(0x8000, 0x0000);
        ppu.spr_count = 1;
        ppu.sprites[0].pixels_remaining = 8;
        ppu.sprites[0].x_counter = 0;
        ppu.sprites[0].attr = 0x00;
        ppu.sprites[0].shifter.load_high(0x80, 0x00);
        ppu.status.set_spr_zero_hit(false);

        ppu.clock()?;

        assert_eq!(ppu.bg_pixel, 0x01);
        assert!(ppu.status.spr_zero_hit());
        Ok(())
    }

    #[test]
    fn no_sprite_zero_hit_over_transparent_background() -> Result<()> {
        let mut ppu = ppu();
        ppu.write_mask(0x18);
        ppu.scanline = 0;
        ppu.cycle = 10;

        ppu.spr_count = 1;
        ppu.sprites[0].pixels_remaining = 8;
        ppu.sprites[0].shifter.load_high(0xFF, 0xFF);

        ppu.clock()?;

        assert_eq!(ppu.bg_pixel, 0x00);
        assert!(!ppu.status.spr_zero_hit());
        Ok(())
    }
}
