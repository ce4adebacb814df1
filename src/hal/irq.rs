//! Nesting critical sections
//!
//! The MAC engine brackets its own critical sections with disable/enable pairs
//! and may nest them inside the tick source's. The depth counter makes the
//! mask follow only the outermost pair.

use core::cell::Cell;

use super::{HalError, InterruptMask};

/// Reference-counted interrupt masking
#[derive(Debug)]
pub struct IrqNest<M> {
    mask: M,
    depth: Cell<u32>,
}

impl<M> IrqNest<M> {
    /// Wrap a raw interrupt mask, starting unmasked at depth 0
    pub const fn new(mask: M) -> Self {
        Self {
            mask,
            depth: Cell::new(0),
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Whether a critical section is open
    pub fn is_masked(&self) -> bool {
        self.depth.get() > 0
    }

    /// Raw mask
    pub fn mask(&self) -> &M {
        &self.mask
    }
}

impl<M: InterruptMask> IrqNest<M> {
    /// Enter a critical section, masking on the outermost entry
    pub fn disable(&self) {
        let depth = self.depth.get();
        if depth == 0 {
            self.mask.disable();
        }
        self.depth.set(depth.saturating_add(1));
    }

    /// Leave a critical section, unmasking on the outermost exit
    ///
    /// Leaving more sections than were entered is a programming error; the
    /// mask is left untouched and [`HalError::UnbalancedEnable`] is returned.
    pub fn enable(&self) -> Result<(), HalError> {
        let depth = self.depth.get();
        if depth == 0 {
            return Err(HalError::UnbalancedEnable);
        }
        self.depth.set(depth - 1);
        if depth == 1 {
            self.mask.enable();
        }
        Ok(())
    }

    /// Enter a critical section that ends when the guard drops
    pub fn lock(&self) -> IrqGuard<'_, M> {
        self.disable();
        IrqGuard { nest: self }
    }

    /// Run `f` inside a critical section
    pub fn free<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock();
        f()
    }

    /// Mask interrupts and drop any nesting left from before
    pub(crate) fn reset_masked(&self) {
        self.mask.disable();
        self.depth.set(0);
    }
}

/// Open critical section; leaving it is infallible
pub struct IrqGuard<'a, M: InterruptMask> {
    nest: &'a IrqNest<M>,
}

impl<M: InterruptMask> Drop for IrqGuard<'_, M> {
    fn drop(&mut self) {
        // The guard holds one level, so depth is at least 1 here.
        let _ = self.nest.enable();
    }
}
