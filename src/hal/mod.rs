//! Hardware abstraction layer for the MAC engine
//!
//! This module contains the time and interrupt services the engine schedules
//! against:
//! - Nesting critical sections over a raw interrupt mask
//! - A free-running tick counter with periodic overflow fold-back
//! - Busy-wait and "due soon" deadline checks that survive wraparound

/// Hardware traits the tick source is built on
pub mod traits;

/// Reference-counted interrupt masking
pub mod irq;

/// Tick counter and deadline arithmetic
pub mod ticks;

/// Cortex-M interrupt mask
#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
pub mod cortex_m;

pub use irq::{IrqGuard, IrqNest};
pub use ticks::{delta_ticks, TickSource};
pub use traits::{FoldTicker, InterruptMask, MicrosTimer};

/// HAL error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// `enable_interrupts` called with no open critical section
    UnbalancedEnable,
}

/// Services the MAC engine expects from the platform
pub trait Hal {
    /// Enter a nested critical section
    fn disable_interrupts(&self);

    /// Leave a nested critical section
    ///
    /// Every `disable_interrupts` must be paired with exactly one call.
    fn enable_interrupts(&self) -> Result<(), HalError>;

    /// Current tick count
    fn ticks(&self) -> u32;

    /// Busy-wait until `target` is reached
    ///
    /// A `target` more than 2^31 ticks ahead reads as already passed.
    fn wait_until(&self, target: u32);

    /// Whether `target` has passed or is less than two ticks ahead
    fn check_timer_due(&self, target: u32) -> bool;

    /// Low-power hook; returns promptly
    fn sleep(&self);

    /// Unrecoverable fault; never returns
    fn fail(&self) -> !;
}
