//! Background tile fetch and render pipeline.
//!
//! See: <https://www.nesdev.org/wiki/PPU_rendering#Visible_scanlines_(0-239)>

use crate::{error::Result, ppu::Ppu};

impl Ppu {
    /// Fetch BG nametable byte.
    ///
    /// See: <https://wiki.nesdev.org/w/index.php/PPU_scrolling#Tile_and_attribute_fetching>
    fn fetch_bg_nt_byte(&mut self) -> Result<()> {
        self.next_tile_id = self.bus.read(self.scroll.v.addr())?;
        Ok(())
    }

    /// Fetch BG attribute byte and select the 2-bit palette for the current tile.
    ///
    /// See: <https://wiki.nesdev.org/w/index.php/PPU_scrolling#Tile_and_attribute_fetching>
    fn fetch_bg_attr_byte(&mut self) -> Result<()> {
        let v = self.scroll.v;
        let attr = self.bus.read(v.attr_addr())?;
        self.next_attr = (attr >> v.attr_shift()) & 0x03;
        Ok(())
    }

    /// Fetch both pattern bit planes of the next tile, then move to the next column.
    fn fetch_bg_tile(&mut self) -> Result<()> {
        let v = self.scroll.v;
        self.next_tile = self
            .bus
            .tile_row(self.next_tile_id, v.fine_y(), self.ctrl.bg_half())?;
        self.scroll.v.increment_x();
        Ok(())
    }

    fn load_bg_shifters(&mut self) {
        self.tile_shifter
            .load_low(self.next_tile.lo, self.next_tile.hi);
        // Attribute bits are broadcast across all 8 pixels of the tile
        let lo = if self.next_attr & 0x01 == 0x01 { 0xFF } else { 0x00 };
        let hi = if self.next_attr & 0x02 == 0x02 { 0xFF } else { 0x00 };
        self.attr_shifter.load_low(lo, hi);
    }

    fn fetch_background(&mut self) -> Result<()> {
        match self.cycle & 0x07 {
            2 => self.fetch_bg_nt_byte()?,
            4 => self.fetch_bg_attr_byte()?,
            0 => self.fetch_bg_tile()?,
            1 if self.cycle > 1 => self.load_bg_shifters(),
            _ => (),
        }
        Ok(())
    }

    /// Run one visible-scanline cycle of the background pipeline.
    pub(crate) fn render_background(&mut self) -> Result<()> {
        let cycle = self.cycle;
        if matches!(cycle, 1..=Self::VISIBLE_END | 321..=Self::CYCLE_END) {
            self.fetch_background()?;
        }

        if matches!(cycle, 1..=Self::SHIFT_END) {
            self.bg_pixel = self.tile_shifter.shift();
            let palette = self.attr_shifter.shift();
            if cycle <= Self::VISIBLE_END {
                let color =
                    Self::system_color(&self.bus, Self::PALETTE_START, palette, self.bg_pixel);
                self.frame
                    .set_pixel(cycle - 1, self.scanline as u32, color);
            }
        }

        if cycle == Self::VISIBLE_END {
            self.scroll.v.increment_y();
        } else if cycle == Self::COPY_X {
            self.scroll.copy_x();
        }
        Ok(())
    }

    /// Run one pre-render scanline cycle of the background pipeline.
    pub(crate) fn prerender_background(&mut self) -> Result<()> {
        match self.cycle {
            Self::COPY_Y_START..=Self::COPY_Y_END => self.scroll.copy_y(),
            Self::BG_PREFETCH => self.prefetch_tiles()?,
            _ => (),
        }
        Ok(())
    }

    /// Load the first two tiles of the next scanline into the pattern shifter in one step.
    fn prefetch_tiles(&mut self) -> Result<()> {
        let first = self.bus.read(self.scroll.v.addr())?;
        self.fetch_bg_attr_byte()?;
        self.scroll.v.increment_x();
        let second = self.bus.read(self.scroll.v.addr())?;
        self.scroll.v.increment_x();

        let (fine_y, half) = (self.scroll.v.fine_y(), self.ctrl.bg_half());
        let first = self.bus.tile_row(first, fine_y, half)?;
        let second = self.bus.tile_row(second, fine_y, half)?;
        self.tile_shifter.load_full(
            (u16::from(first.lo) << 8) | u16::from(second.lo),
            (u16::from(first.hi) << 8) | u16::from(second.hi),
        );
        Ok(())
    }
}
