//! Error handling.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum Error {
    /// An address outside of every mapped PPU memory region. Indicates an invariant violation
    /// upstream and leaves the emulated state unusable for the session.
    #[error("invalid PPU memory address ${addr:04X}")]
    InvalidAddress { addr: u16 },
    /// A register access outside of `$2000-$2007` or a read from a write-only register.
    #[error("invalid PPU register access ${addr:04X}")]
    InvalidRegister { addr: u16 },
    #[error("invalid CHR size (expected at least {expected} bytes, found: {len})")]
    InvalidChrSize { expected: usize, len: usize },
}
