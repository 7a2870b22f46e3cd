//! Bulk transfers.
//!
//! A job lends a caller buffer to the driver for the duration of one call.
//! TX jobs are pre-filled into the ring by the caller; everything else, the
//! refill of TX jobs and the whole drain of RX jobs, happens in the
//! interrupt dispatcher, which completes the job and wakes the caller.
//!
//! Only one job per direction may be active. The submitting call never
//! returns while its job is still active, so the dispatcher never touches
//! a buffer whose borrow has ended.

use core::hint::spin_loop;

use super::blocking::BlockingStrategy;
use super::config::State;
use super::error::{IoError, IoResult};
use super::uart::{Uart, UartState};
use crate::hal::{Scheduler, UarteDma};
use crate::internal::job::Job;
use crate::sync::IrqGuard;

/// Job slot selector
#[derive(Clone, Copy)]
enum Direction {
    Rx,
    Tx,
}

impl<H: UarteDma, S: Scheduler, const N: usize> Uart<H, S, N> {
    /// Transmit `data` and wait until all of it has been queued
    ///
    /// Returns the number of bytes transferred (`data.len()`). The last
    /// bytes may still be in the TX ring when this returns; use
    /// [`flush`](Self::flush) to wait for the wire.
    ///
    /// # Errors
    /// - `NotInitialized` - the instance is not running
    /// - `JobInProgress` - another TX job is active
    /// - `Aborted` - the job was cancelled by `abort` or `deinit`
    pub fn submit_tx_job(&self, data: &[u8]) -> IoResult<usize> {
        let (guard, strategy) = self.enter_blocking();
        {
            let mut st = self.inner.lock(&guard);
            st.ensure_enabled()?;
            if data.is_empty() {
                return Ok(0);
            }
            if st.tx_job != Job::Idle {
                return Err(IoError::JobInProgress);
            }

            st.tx_job = Job::transmit(data);
            self.fill_tx_from_job(&mut st);
            self.kick_tx(&mut st);

            if let Some(outcome) = st.tx_job.collect() {
                return outcome.map_err(|()| IoError::Aborted);
            }
            if let BlockingStrategy::SchedulerSuspend(task) = strategy {
                st.blocked_writer = Some(task);
            }
        }

        self.wait_job(guard, strategy, Direction::Tx)
    }

    /// Receive into `buf` and wait for the job to end
    ///
    /// With `idle_ends_recv` set the job ends at the first receive event,
    /// after draining whatever the RX ring holds, and the short count is
    /// returned. Otherwise it ends when `buf` is full. Bytes already in the
    /// RX ring are collected at the next receive event.
    ///
    /// # Errors
    /// - `NotInitialized` - the instance is not running
    /// - `JobInProgress` - another RX job is active
    /// - `Aborted` - the job was cancelled by `abort` or `deinit`
    pub fn submit_rx_job(&self, buf: &mut [u8]) -> IoResult<usize> {
        let (guard, strategy) = self.enter_blocking();
        {
            let mut st = self.inner.lock(&guard);
            st.ensure_enabled()?;
            if buf.is_empty() {
                return Ok(0);
            }
            if st.rx_job != Job::Idle {
                return Err(IoError::JobInProgress);
            }

            st.rx_job = Job::receive(buf);
            if let BlockingStrategy::SchedulerSuspend(task) = strategy {
                st.blocked_reader = Some(task);
            }
        }

        self.wait_job(guard, strategy, Direction::Rx)
    }

    /// Copy job bytes into the TX ring while it has space.
    ///
    /// Finishes the job once its last byte is queued. Returns true if any
    /// byte was queued.
    pub(super) fn fill_tx_from_job(&self, st: &mut UartState<S::Task, N>) -> bool {
        let mut queued = false;
        while !st.tx.is_full() {
            let Some(transfer) = st.tx_job.transfer() else {
                break;
            };
            let Some(byte) = transfer.next_out() else {
                break;
            };
            let complete = transfer.is_complete();

            self.enqueue_tx(st, byte);
            queued = true;

            if complete {
                st.tx_job.finish();
                break;
            }
        }
        queued
    }

    /// Block until the job of `dir` leaves the active state.
    fn wait_job(
        &self,
        guard: IrqGuard,
        strategy: BlockingStrategy<S::Task>,
        dir: Direction,
    ) -> IoResult<usize> {
        match strategy {
            BlockingStrategy::PollHardwareFlag => loop {
                // Nobody else can run the dispatcher while interrupts are masked
                self.dispatch(&guard);

                let mut st = self.inner.lock(&guard);
                if let Some(outcome) = Self::job(&mut st, dir).collect() {
                    return outcome.map_err(|()| IoError::Aborted);
                }
                drop(st);
                spin_loop();
            },
            BlockingStrategy::SchedulerSuspend(task) => {
                drop(guard);
                loop {
                    self.scheduler.suspend();

                    let guard = IrqGuard::new();
                    let mut st = self.inner.lock(&guard);
                    if st.state != State::Enabled {
                        Self::job(&mut st, dir).abort();
                    }
                    if let Some(outcome) = Self::job(&mut st, dir).collect() {
                        let blocked = match dir {
                            Direction::Rx => &mut st.blocked_reader,
                            Direction::Tx => &mut st.blocked_writer,
                        };
                        if *blocked == Some(task) {
                            *blocked = None;
                        }
                        return outcome.map_err(|()| IoError::Aborted);
                    }

                    // Woken before completion; wait again
                    match dir {
                        Direction::Rx => st.blocked_reader = Some(task),
                        Direction::Tx => st.blocked_writer = Some(task),
                    }
                }
            }
        }
    }

    fn job(st: &mut UartState<S::Task, N>, dir: Direction) -> &mut Job {
        match dir {
            Direction::Rx => &mut st.rx_job,
            Direction::Tx => &mut st.tx_job,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
