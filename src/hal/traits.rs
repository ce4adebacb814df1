/// Global interrupt mask
///
/// The raw primitive behind the nesting critical section. `disable` and `enable`
/// are not reference counted here; [`IrqNest`](super::IrqNest) does the counting.
///
/// # Safety
///
/// If the implementing type is `Sync`, then between `disable` and `enable` no
/// other execution context that can reach the same mask may run, and any context
/// that preempts the caller while unmasked must run to completion before the
/// caller resumes. Single-core interrupt masking satisfies this; threads do not.
/// Types that are not `Sync` only ever live on one thread and carry no extra
/// obligation.
///
/// A tick source over a non-`Sync` mask cannot be shared between threads:
///
/// ```compile_fail
/// use core::cell::Cell;
/// use simple_lorawan::hal::{InterruptMask, MicrosTimer, TickSource};
///
/// struct Flag(Cell<bool>);
///
/// unsafe impl InterruptMask for Flag {
///     fn disable(&self) { self.0.set(true) }
///     fn enable(&self) { self.0.set(false) }
/// }
///
/// struct Timer;
///
/// impl MicrosTimer for Timer {
///     fn start(&mut self) {}
///     fn read_us(&self) -> u32 { 0 }
///     fn reset(&mut self) {}
/// }
///
/// fn shared<S: Sync>(_: &S) {}
/// shared(&TickSource::new(Flag(Cell::new(false)), Timer));
/// ```
pub unsafe trait InterruptMask {
    /// Mask all maskable interrupts
    fn disable(&self);

    /// Unmask interrupts
    fn enable(&self);
}

// SAFETY: `&M` is `Sync` exactly when `M` is, and forwards to `M`.
unsafe impl<M: InterruptMask + ?Sized> InterruptMask for &M {
    fn disable(&self) {
        (**self).disable()
    }

    fn enable(&self) {
        (**self).enable()
    }
}

/// Free-running hardware microsecond timer
pub trait MicrosTimer {
    /// Start counting
    fn start(&mut self);

    /// Microseconds elapsed since start or the last reset
    fn read_us(&self) -> u32;

    /// Restart counting from zero
    fn reset(&mut self);
}

/// Periodic interrupt source driving the tick fold-back
///
/// Once armed, the platform's interrupt handler must call
/// [`TickSource::fold`](super::TickSource::fold) every `period_us`.
pub trait FoldTicker {
    /// Arm the periodic interrupt
    fn attach_us(&mut self, period_us: u32);
}
