//! Synchronization primitives for ISR-safe access.
//!
//! Low-level primitives shared by the driver entry points and the interrupt
//! dispatcher.

use core::cell::{Cell, RefCell, RefMut};
use core::marker::PhantomData;

use critical_section::{CriticalSection, Mutex, RestoreState};

/// Number of [`IrqGuard`]s currently alive.
static DEPTH: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Scoped interrupt mask.
///
/// Acquires the global critical section on construction and releases it on
/// drop. Guards nest: an inner guard knows that an outer one already masked
/// interrupts. Masks set outside this type are reported by
/// [`Scheduler::interrupts_masked`](crate::hal::Scheduler::interrupts_masked).
pub struct IrqGuard {
    restore: RestoreState,
    nested: bool,
    // Guards must be released on the context that acquired them.
    _not_send: PhantomData<*mut ()>,
}

impl IrqGuard {
    /// Mask interrupts until the guard is dropped.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        // SAFETY: released exactly once in `Drop`; the guard is `!Send` and
        // scoped, so nested guards release in reverse order.
        let restore = unsafe { critical_section::acquire() };
        // SAFETY: the critical section was acquired just above.
        let cs = unsafe { CriticalSection::new() };
        let depth = DEPTH.borrow(cs);
        let nested = depth.get() != 0;
        depth.set(depth.get() + 1);

        Self {
            restore,
            nested,
            _not_send: PhantomData,
        }
    }

    /// True if interrupts were already masked by an enclosing guard.
    #[inline(always)]
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// Critical section token valid for the guard's lifetime.
    #[inline(always)]
    pub fn token(&self) -> CriticalSection<'_> {
        // SAFETY: the critical section is held until `self` is dropped.
        unsafe { CriticalSection::new() }
    }
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IrqGuard {
    #[inline]
    fn drop(&mut self) {
        let depth = DEPTH.borrow(self.token());
        depth.set(depth.get().saturating_sub(1));
        // SAFETY: `restore` came from the matching `acquire` in `new`.
        unsafe { critical_section::release(self.restore) };
    }
}

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let guard = IrqGuard::new();
        let mut value = self.lock(&guard);
        f(&mut value)
    }

    /// Borrow the contents for as long as `guard` masks interrupts.
    ///
    /// # Panics
    ///
    /// Panics if the contents are already borrowed on this context.
    #[inline]
    pub fn lock<'a>(&'a self, guard: &'a IrqGuard) -> RefMut<'a, T> {
        self.inner.borrow(guard.token()).borrow_mut()
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}
