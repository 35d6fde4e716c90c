//! Sprite evaluation, fetch and compositing pipeline.
//!
//! See: <https://www.nesdev.org/wiki/PPU_sprite_evaluation>

use crate::{
    error::Result,
    ppu::{sprite::Sprite, Ppu},
};
use tracing::warn;

impl Ppu {
    /// Write a single OAM byte. Indexes past the 256 bytes of OAM are dropped.
    pub fn write_oam_data(&mut self, index: usize, val: u8) {
        match self.oam.get_mut(index / Sprite::BYTES) {
            Some(sprite) => sprite.set_byte(index % Sprite::BYTES, val),
            None => warn!("dropping OAM write at out of range index {index} with ${val:02X}"),
        }
    }

    /// Read a single OAM byte, or `None` for an index past the 256 bytes of OAM.
    #[must_use]
    pub fn read_oam_data(&self, index: usize) -> Option<u8> {
        self.oam
            .get(index / Sprite::BYTES)
            .map(|sprite| sprite.byte(index % Sprite::BYTES))
    }

    fn clear_secondary_oam(&mut self) {
        self.secondary_oam.fill(Sprite::new());
    }

    /// Select up to 8 sprites in range of the current scanline, in OAM order.
    ///
    /// Sprites past the eighth are dropped without setting an overflow flag.
    fn evaluate_sprites(&mut self) {
        let (scanline, height) = (self.scanline, self.ctrl.spr_height);
        let mut count = 0;
        for sprite in self
            .oam
            .iter()
            .filter(|sprite| sprite.in_range(scanline, height))
            .take(Self::MAX_SPRITES)
        {
            self.secondary_oam[count] = *sprite;
            self.sprites[count].arm(sprite);
            count += 1;
        }
        for slot in &mut self.sprites[count..] {
            slot.pixels_remaining = 0;
        }
        self.spr_count = count;
    }

    /// Fetch pattern rows for the selected sprites into their slot shifters.
    fn load_sprites(&mut self) -> Result<()> {
        let tall_sprites = self.ctrl.tall_sprites();
        for (sprite, slot) in self
            .secondary_oam
            .iter()
            .zip(self.sprites.iter_mut())
            .take(self.spr_count)
        {
            let row = ((self.scanline - i32::from(sprite.y)) & 0x0F) as u16;
            let (tile, row, half) = if tall_sprites {
                // 8x16 sprites select the pattern table with bit 0 and use two stacked tiles
                let tile = (sprite.tile & 0xFE) + u8::from(row >= 8);
                (tile, row % 8, u16::from(sprite.tile & 0x01))
            } else {
                (sprite.tile, row, self.ctrl.spr_half())
            };

            let mut data = self.bus.tile_row(tile, row, half)?;
            if sprite.flip_horizontal() {
                data.lo = data.lo.reverse_bits();
                data.hi = data.hi.reverse_bits();
            }
            slot.shifter.load_high(data.lo, data.hi);
        }
        Ok(())
    }

    /// Count down sprite X positions and draw any sprite pixels landing on this cycle.
    fn composite_sprites(&mut self) {
        let cycle = self.cycle;
        for (i, slot) in self
            .sprites
            .iter_mut()
            .enumerate()
            .take(self.spr_count)
        {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
            }
            if slot.x_counter > 0 || !slot.is_active() {
                continue;
            }

            let pixel = slot.shifter.shift();
            // Cycle 0 has no pixel column to draw into
            if !slot.bg_priority() && pixel != 0 && cycle > 0 {
                let color = Self::system_color(
                    &self.bus,
                    Self::SPR_PALETTE_START,
                    slot.palette(),
                    pixel,
                );
                self.frame
                    .set_pixel(cycle - 1, self.scanline as u32, color);
            }
            slot.pixels_remaining -= 1;

            // Background priority does not mask the hit
            if i == 0 && pixel != 0 && self.bg_pixel != 0 && !self.status.spr_zero_hit() {
                self.status.set_spr_zero_hit(true);
            }
        }
    }

    /// Run one visible-scanline cycle of the sprite pipeline.
    pub(crate) fn render_sprites(&mut self) -> Result<()> {
        match self.cycle {
            0..=255 => {
                if self.cycle == Self::SPR_CLEAR {
                    self.clear_secondary_oam();
                }
                self.composite_sprites();
            }
            Self::SPR_EVAL => self.evaluate_sprites(),
            Self::SPR_LOAD => self.load_sprites()?,
            _ => (),
        }
        Ok(())
    }
}
