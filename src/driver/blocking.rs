//! How a blocking call waits for the interrupt dispatcher.
//!
//! A call that finds its ring full (TX) or empty (RX) either parks the
//! calling task until the dispatcher wakes it, or, when that is impossible,
//! spins on the hardware event flags itself.

/// Waiting strategy of one blocking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockingStrategy<T> {
    /// Spin on the hardware event flag with interrupts masked, servicing the
    /// ring from the calling context.
    PollHardwareFlag,
    /// Register the task as blocked and suspend it with interrupts enabled.
    SchedulerSuspend(T),
}

impl<T> BlockingStrategy<T> {
    /// Pick the strategy for the current call.
    ///
    /// `interrupts_masked` is true when interrupts were already disabled on
    /// entry, by an outer guard or by the platform. Suspending there would deadlock, as would
    /// suspending without a task identity.
    #[inline]
    pub fn select(interrupts_masked: bool, task: Option<T>) -> Self {
        match task {
            Some(task) if !interrupts_masked => BlockingStrategy::SchedulerSuspend(task),
            _ => BlockingStrategy::PollHardwareFlag,
        }
    }

    /// True for [`PollHardwareFlag`](Self::PollHardwareFlag)
    #[inline(always)]
    pub fn is_polling(&self) -> bool {
        matches!(self, BlockingStrategy::PollHardwareFlag)
    }
}
