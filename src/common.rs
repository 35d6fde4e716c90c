//! Traits shared by clocked components.

use crate::error::Result;

/// Trait for types that advance by discrete clock cycles.
pub trait Clock {
    /// Advance one cycle, returning the number of cycles run.
    fn clock(&mut self) -> Result<u64>;
}

/// Trait for types that can be returned to their power-on ready state.
pub trait Reset {
    fn reset(&mut self) {}
}
