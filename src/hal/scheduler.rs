//! Cooperative scheduler interface
//!
//! Blocking calls park the calling task through [`Scheduler`] and the
//! interrupt handler wakes it again. When no task identity is available the
//! driver busy-waits on hardware flags instead (see
//! [`BlockingStrategy`](crate::driver::blocking::BlockingStrategy)).

/// Task suspend/resume primitives of the surrounding scheduler.
pub trait Scheduler {
    /// Opaque task handle.
    type Task: Copy + Eq;

    /// Identify the running task, `None` when running on bare metal.
    fn current_task(&self) -> Option<Self::Task>;

    /// Suspend the calling task until [`wake`](Self::wake) is called for it.
    ///
    /// A wake issued before the suspend must not be lost.
    fn suspend(&self);

    /// Make `task` runnable again.
    ///
    /// Called from interrupt context and from inside critical sections.
    fn wake(&self, task: Self::Task);

    /// True if the calling context runs with interrupts disabled.
    ///
    /// Covers every way the platform can mask them (PRIMASK, FAULTMASK, an
    /// outer critical section). A blocking call that sees this busy-waits on
    /// the hardware flags, since a suspended task could never be woken.
    fn interrupts_masked(&self) -> bool;
}

impl<T: Scheduler + ?Sized> Scheduler for &T {
    type Task = T::Task;

    fn current_task(&self) -> Option<Self::Task> {
        (**self).current_task()
    }

    fn suspend(&self) {
        (**self).suspend();
    }

    fn wake(&self, task: Self::Task) {
        (**self).wake(task);
    }

    fn interrupts_masked(&self) -> bool {
        (**self).interrupts_masked()
    }
}

/// Scheduler for firmware without tasks.
///
/// Every blocking operation degrades to polling the hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareMetal;

impl Scheduler for BareMetal {
    type Task = ();

    #[inline(always)]
    fn current_task(&self) -> Option<()> {
        None
    }

    #[inline(always)]
    fn suspend(&self) {}

    #[inline(always)]
    fn wake(&self, _task: ()) {}

    #[inline(always)]
    fn interrupts_masked(&self) -> bool {
        false
    }
}
