//! Free-running tick counter
//!
//! Ticks are synthesized as `base + (timer_us >> 6)`. The fold-back interrupt
//! moves the timer's elapsed time into `base` and restarts the timer, so the
//! hardware timer never runs long enough to overflow.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use super::{FoldTicker, Hal, HalError, InterruptMask, IrqNest, MicrosTimer};
use crate::config::hal::{
    ms_to_ticks_ceil, us_to_ticks, TickConfig, DUE_WINDOW_TICKS, US_PER_TICK_SHIFT,
};

/// Longest single busy-wait step, kept well inside the 16-bit deadline window
const MAX_WAIT_STEP_TICKS: u32 = 0x8000;

/// Clamp the distance from `now` to `target` into the 16-bit deadline window
///
/// Targets at or before `now` give 0. Targets 2^16 ticks or more ahead give
/// `0xFFFF`. The difference is taken as signed 32-bit, so a target more than
/// 2^31 ticks ahead reads as already passed.
pub fn delta_ticks(target: u32, now: u32) -> u16 {
    let d = target.wrapping_sub(now) as i32;
    if d <= 0 {
        0
    } else if (d >> 16) != 0 {
        0xFFFF
    } else {
        d as u16
    }
}

/// Hardware tick source
pub struct TickSource<M, T> {
    irq: IrqNest<M>,
    timer: RefCell<T>,
    base: Cell<u32>,
    config: TickConfig,
}

// SAFETY: `timer` and `base` are only touched inside `irq` critical sections.
// A `Sync` mask promises, as part of the `InterruptMask` contract, that masking
// stops every other context sharing this value and that preempting contexts run
// to completion, so those accesses are exclusive and the depth counter is always
// restored before the preempted context resumes.
unsafe impl<M: InterruptMask + Sync, T: MicrosTimer + Send> Sync for TickSource<M, T> {}

impl<M, T> TickSource<M, T> {
    /// Create a tick source with the default fold-back period
    pub const fn new(mask: M, timer: T) -> Self {
        Self::with_config(
            mask,
            timer,
            TickConfig {
                fold_period_us: crate::config::hal::FOLD_PERIOD_US,
            },
        )
    }

    /// Create a tick source with an explicit configuration
    pub const fn with_config(mask: M, timer: T, config: TickConfig) -> Self {
        Self {
            irq: IrqNest::new(mask),
            timer: RefCell::new(timer),
            base: Cell::new(0),
            config,
        }
    }

    /// Nesting critical section shared with the engine
    pub fn irq(&self) -> &IrqNest<M> {
        &self.irq
    }

    /// Active configuration
    pub fn config(&self) -> &TickConfig {
        &self.config
    }
}

impl<M: InterruptMask, T: MicrosTimer> TickSource<M, T> {
    /// Start the hardware timer and arm the fold-back ticker
    ///
    /// Must run once, before the first tick read.
    pub fn init<F: FoldTicker>(&self, ticker: &mut F) {
        self.irq.reset_masked();
        self.timer.borrow_mut().start();
        ticker.attach_us(self.config.fold_period_us);
        self.irq.mask().enable();
    }

    /// Fold the hardware timer into the tick base and restart it
    ///
    /// Called from the fold-back interrupt.
    pub fn fold(&self) {
        self.irq.free(|| {
            let mut timer = self.timer.borrow_mut();
            let elapsed = timer.read_us() >> US_PER_TICK_SHIFT;
            self.base.set(self.base.get().wrapping_add(elapsed));
            timer.reset();
        })
    }

    /// Non-blocking deadline check: `Ok` once `target` is reached
    pub fn poll_until(&self, target: u32) -> nb::Result<(), Infallible> {
        if delta_ticks(target, self.ticks()) == 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn delay_ticks(&self, mut remaining: u32) {
        while remaining > 0 {
            let step = remaining.min(MAX_WAIT_STEP_TICKS);
            self.wait_until(self.ticks().wrapping_add(step));
            remaining -= step;
        }
    }
}

impl<M: InterruptMask, T: MicrosTimer> Hal for TickSource<M, T> {
    fn disable_interrupts(&self) {
        self.irq.disable();
    }

    fn enable_interrupts(&self) -> Result<(), HalError> {
        self.irq.enable()
    }

    fn ticks(&self) -> u32 {
        self.irq.free(|| {
            let elapsed = self.timer.borrow().read_us() >> US_PER_TICK_SHIFT;
            self.base.get().wrapping_add(elapsed)
        })
    }

    fn wait_until(&self, target: u32) {
        match nb::block!(self.poll_until(target)) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    fn check_timer_due(&self, target: u32) -> bool {
        delta_ticks(target, self.ticks()) < DUE_WINDOW_TICKS
    }

    fn sleep(&self) {}

    fn fail(&self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

impl<M: InterruptMask, T: MicrosTimer> DelayUs<u32> for TickSource<M, T> {
    fn delay_us(&mut self, us: u32) {
        // Round up so the delay is never shorter than asked.
        let ticks = us_to_ticks(us) + u32::from(us & ((1 << US_PER_TICK_SHIFT) - 1) != 0);
        self.delay_ticks(ticks);
    }
}

impl<M: InterruptMask, T: MicrosTimer> DelayMs<u32> for TickSource<M, T> {
    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(ms_to_ticks_ceil(ms));
    }
}
