//! A cycle-stepped NES PPU (Picture Processing Unit) core.
//!
//! The [`Ppu`](ppu::Ppu) is driven by a host CPU emulator through the eight memory-mapped
//! registers at `$2000-$2007` and advanced one PPU cycle at a time with
//! [`Clock::clock`](common::Clock::clock). Each cycle runs the background fetch pipeline, the
//! sprite evaluation and compositing pipeline and the frame timing state machine, writing
//! resolved colors into a 256x240 frame buffer and raising NMI at the start of vertical blank.
//!
//! ```no_run
//! use tetanes_ppu::prelude::*;
//!
//! # fn main() -> tetanes_ppu::error::Result<()> {
//! let chr = vec![0x00; 0x2000];
//! let mut ppu = Ppu::new(chr, Mirroring::Vertical)?;
//! ppu.write(0x2001, 0x18)?; // show background and sprites
//! ppu.clock_frame()?;
//! let pixels: &[u32] = ppu.frame_buffer();
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod error;
pub mod ppu;

pub mod prelude {
    //! The prelude re-exports all the common structs/enums used to drive the PPU.

    pub use crate::{
        common::{Clock, Reset},
        error::{Error, Result},
        ppu::{Config, Mirroring, Ppu, Registers},
    };
}
