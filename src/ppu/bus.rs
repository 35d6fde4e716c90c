//! PPU memory map: pattern tables, nametables and palette RAM.
//!
//! See: <https://www.nesdev.org/wiki/PPU_memory_map>

use crate::{
    error::{Error, Result},
    ppu::Mirroring,
};
use tracing::error;

/// Pattern tile row: low and high bit planes.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct TileRow {
    pub lo: u8,
    pub hi: u8,
}

#[derive(Clone)]
#[must_use]
pub struct Bus {
    pub mirroring: Mirroring,
    pub chr: Vec<u8>,
    pub ciram: [[u8; Self::NT_SIZE]; 2], // Two 1k Nametables
    pub palette: [u8; Self::PALETTE_SIZE],
}

impl Bus {
    pub const CHR_SIZE: usize = 0x2000; // Two 4k pattern tables
    const NT_SIZE: usize = 0x0400;
    const PALETTE_SIZE: usize = 32; // 32 possible colors at a time

    /// Create a new PPU bus owning the given pattern table data.
    pub fn new(chr: Vec<u8>, mirroring: Mirroring) -> Result<Self> {
        if chr.len() < Self::CHR_SIZE {
            return Err(Error::InvalidChrSize {
                expected: Self::CHR_SIZE,
                len: chr.len(),
            });
        }
        Ok(Self {
            mirroring,
            chr,
            ciram: [[0x00; Self::NT_SIZE]; 2],
            palette: [0x00; Self::PALETTE_SIZE],
        })
    }

    // Maps addresses to nametable pages based on mirroring mode
    //
    // Vram:            [ A ] [ B ]
    //
    // Horizontal:      [ A ] [ a ]
    //                  [ B ] [ b ]
    //
    // Vertical:        [ A ] [ B ]
    //                  [ a ] [ b ]
    const fn ciram_mirror(&self, addr: u16) -> (usize, usize) {
        let quadrant = (addr >> 10) & 0x03;
        let table = match self.mirroring {
            Mirroring::Horizontal => quadrant >> 1,
            Mirroring::Vertical => quadrant & 0x01,
        };
        (table as usize, (addr & 0x03FF) as usize)
    }

    const fn palette_mirror(addr: u16) -> usize {
        let addr = (addr & 0x001F) as usize;
        // $3F10/$3F14/$3F18/$3F1C share the backdrop entries of the background palettes
        if addr >= 16 && addr.trailing_zeros() >= 2 {
            addr - 16
        } else {
            addr
        }
    }

    /// Fetch one row of a tile from the pattern table `half` (0 = $0000, 1 = $1000).
    pub fn tile_row(&self, tile: u8, row: u16, half: u16) -> Result<TileRow> {
        let addr = (half << 12) | (u16::from(tile) << 4) | (row & 0x0F);
        Ok(TileRow {
            lo: self.read_chr(addr)?,
            hi: self.read_chr(addr + 8)?,
        })
    }

    fn read_chr(&self, addr: u16) -> Result<u8> {
        self.chr.get(usize::from(addr)).copied().ok_or_else(|| {
            error!("unexpected CHR access at ${addr:04X}");
            Error::InvalidAddress { addr }
        })
    }

    #[inline]
    #[must_use]
    pub fn read_ciram(&self, addr: u16) -> u8 {
        let (table, index) = self.ciram_mirror(addr);
        self.ciram[table][index]
    }

    #[inline]
    #[must_use]
    pub fn read_palette(&self, addr: u16) -> u8 {
        self.palette[Self::palette_mirror(addr)]
    }

    pub fn read(&self, addr: u16) -> Result<u8> {
        self.peek(addr)
    }

    /// Non-mutating read. Bus reads have no side effects, so this matches [`Bus::read`].
    pub fn peek(&self, addr: u16) -> Result<u8> {
        match addr {
            0x0000..=0x1FFF => self.read_chr(addr),
            0x2000..=0x3EFF => Ok(self.read_ciram(addr)),
            0x3F00..=0x3FFF => Ok(self.read_palette(addr)),
            _ => {
                error!("unexpected PPU memory access at ${addr:04X}");
                Err(Error::InvalidAddress { addr })
            }
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) -> Result<()> {
        match addr {
            0x0000..=0x1FFF => match self.chr.get_mut(usize::from(addr)) {
                Some(byte) => *byte = val,
                None => {
                    error!("unexpected CHR write at ${addr:04X} with ${val:02X}");
                    return Err(Error::InvalidAddress { addr });
                }
            },
            0x2000..=0x3EFF => {
                let (table, index) = self.ciram_mirror(addr);
                self.ciram[table][index] = val;
            }
            0x3F00..=0x3FFF => self.palette[Self::palette_mirror(addr)] = val,
            _ => {
                error!("unexpected PPU memory write at ${addr:04X} with ${val:02X}");
                return Err(Error::InvalidAddress { addr });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PpuBus")
            .field("mirroring", &self.mirroring)
            .field("chr_len", &self.chr.len())
            .field("ciram_len", &(self.ciram.len() * Self::NT_SIZE))
            .field("palette", &self.palette)
            .finish()
    }
}
