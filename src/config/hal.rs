/// Hardware microseconds per tick, as a shift (1 tick = 64 us)
pub const US_PER_TICK_SHIFT: u32 = 6;

/// Ticks per second at the reference scale
pub const OSTICKS_PER_SEC: u32 = 1_000_000 >> US_PER_TICK_SHIFT;

/// A deadline is due when it is less than this many ticks ahead
pub const DUE_WINDOW_TICKS: u16 = 2;

/// Default fold-back period in microseconds (10 s)
pub const FOLD_PERIOD_US: u32 = 10_000_000;

/// Tick source configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickConfig {
    /// Period of the fold-back ticker in microseconds.
    ///
    /// Must stay well below the hardware timer's own overflow period.
    pub fold_period_us: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            fold_period_us: FOLD_PERIOD_US,
        }
    }
}

/// Convert microseconds to ticks, rounding down
pub const fn us_to_ticks(us: u32) -> u32 {
    us >> US_PER_TICK_SHIFT
}

/// Convert milliseconds to ticks, rounding down
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as u64 * OSTICKS_PER_SEC as u64) / 1000) as u32
}

/// Convert milliseconds to ticks, rounding up
pub const fn ms_to_ticks_ceil(ms: u32) -> u32 {
    let us = ms as u64 * 1000;
    let ticks = (us + (1 << US_PER_TICK_SHIFT) - 1) >> US_PER_TICK_SHIFT;
    if ticks > u32::MAX as u64 {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// Convert ticks to milliseconds, rounding down
pub const fn ticks_to_ms(ticks: u32) -> u32 {
    ((ticks as u64 * 1000) / OSTICKS_PER_SEC as u64) as u32
}
