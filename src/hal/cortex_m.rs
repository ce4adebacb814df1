use super::InterruptMask;

/// Interrupt mask over the Cortex-M `PRIMASK` register
///
/// Single-core parts only.
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexM;

// SAFETY: with `PRIMASK` set no interrupt handler runs, and handlers that preempt
// an unmasked caller return before it resumes. Cortex-M parts this is enabled
// for are single core.
unsafe impl InterruptMask for CortexM {
    fn disable(&self) {
        ::cortex_m::interrupt::disable();
    }

    fn enable(&self) {
        // SAFETY: only reached when the outermost critical section closes.
        unsafe { ::cortex_m::interrupt::enable() }
    }
}
