//! PPU frame implementation.

use crate::ppu::Ppu;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// PPU frame buffer of `0x00RRGGBB` colors.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Buffer(Vec<u32>);

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer({} elements)", self.0.len())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self(vec![0x00; Ppu::SIZE])
    }
}

impl Deref for Buffer {
    type Target = [u32];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// PPU frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use]
pub struct Frame {
    pub count: u32,
    pub is_odd: bool,
    #[serde(skip)]
    pub buffer: Buffer,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Self {
            count: 1,
            is_odd: true,
            buffer: Buffer::default(),
        }
    }

    /// Advance the frame counter at the start of the post-render scanline.
    #[inline]
    pub fn increment(&mut self) {
        self.count = self.count.wrapping_add(1);
    }

    /// Flip even/odd parity when the scanline counter wraps to the pre-render line.
    #[inline]
    pub fn toggle_parity(&mut self) {
        self.is_odd = !self.is_odd;
    }

    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.buffer[(x + (y << 8)) as usize]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) {
        self.buffer[(x + (y << 8)) as usize] = color;
    }

    #[inline]
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub const fn is_odd(&self) -> bool {
        self.is_odd
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }
}
