//! Byte-at-a-time transmit and receive.
//!
//! A full TX ring or an empty RX ring blocks the caller. How it blocks is
//! decided per call by [`BlockingStrategy`]:
//!
//! - `SchedulerSuspend`: the task registers itself, leaves the critical
//!   section and suspends; the interrupt dispatcher wakes it. A wake without
//!   progress means the wait was cancelled and the call fails with `Aborted`.
//! - `PollHardwareFlag`: the caller stays in the critical section and does
//!   the dispatcher's cursor bookkeeping itself from the raw event flags.

use core::hint::spin_loop;

use super::blocking::BlockingStrategy;
use super::config::State;
use super::error::{IoError, IoResult};
use super::uart::{Uart, UartState};
use crate::hal::{Event, Scheduler, UarteDma};
use crate::sync::IrqGuard;

impl<H: UarteDma, S: Scheduler, const N: usize> Uart<H, S, N> {
    // =========================================================================
    // Transmit
    // =========================================================================

    /// Queue one byte for transmission
    ///
    /// Blocks while the TX ring is full.
    ///
    /// # Errors
    /// - `NotInitialized` - the instance is not running
    /// - `Aborted` - the wait for TX space was cancelled (e.g. by `deinit`);
    ///   the byte was not queued
    pub fn send_byte(&self, byte: u8) -> IoResult<()> {
        let (guard, strategy) = self.enter_blocking();

        match strategy {
            BlockingStrategy::PollHardwareFlag => {
                let mut st = self.inner.lock(&guard);
                st.ensure_enabled()?;
                self.clear_line_errors();

                while st.tx.is_full() {
                    self.poll_tx_space(&mut st);
                }

                self.enqueue_tx(&mut st, byte);
                self.kick_tx(&mut st);
                Ok(())
            }
            BlockingStrategy::SchedulerSuspend(task) => {
                let mut guard = guard;
                loop {
                    let mut st = self.inner.lock(&guard);
                    st.ensure_enabled()?;

                    if !st.tx.is_full() {
                        self.enqueue_tx(&mut st, byte);
                        self.kick_tx(&mut st);
                        return Ok(());
                    }

                    let seen = st.tx.consumer;
                    st.blocked_writer = Some(task);
                    drop(st);
                    drop(guard);

                    self.scheduler.suspend();

                    guard = IrqGuard::new();
                    let mut st = self.inner.lock(&guard);
                    if st.state != State::Enabled || st.tx.consumer == seen {
                        if st.blocked_writer == Some(task) {
                            st.blocked_writer = None;
                        }
                        #[cfg(feature = "defmt")]
                        defmt::debug!("send_byte woken without TX space, aborting");
                        return Err(IoError::Aborted);
                    }
                }
            }
        }
    }

    /// Wait until every queued byte has left the TX ring
    ///
    /// # Errors
    /// - `NotInitialized` - the instance is not running
    pub fn flush(&self) -> IoResult<()> {
        loop {
            let (guard, strategy) = self.enter_blocking();
            if strategy.is_polling() {
                self.dispatch(&guard);
            }

            let st = self.inner.lock(&guard);
            st.ensure_enabled()?;
            if st.tx.is_empty() && st.tx_ready {
                return Ok(());
            }
            drop(st);
            drop(guard);
            spin_loop();
        }
    }

    /// One polling step while the TX ring is full.
    fn poll_tx_space(&self, st: &mut UartState<S::Task, N>) {
        if self.hw.event(Event::TxDrdy) {
            self.hw.clear_event(Event::TxDrdy);
            st.tx.consumer = st.tx.consumer.wrapping_add(1);
        } else if self.hw.event(Event::EndTx) {
            // Window ended at the buffer edge; queue the wrapped remainder
            self.start_tx(st, self.hw.tx_amount());
        } else {
            spin_loop();
        }
    }

    // =========================================================================
    // Receive
    // =========================================================================

    /// Take one received byte
    ///
    /// Blocks while the RX ring is empty.
    ///
    /// # Errors
    /// - `NotInitialized` - the instance is not running
    /// - `Aborted` - the wait for data was cancelled (e.g. by `deinit`)
    pub fn recv_byte(&self) -> IoResult<u8> {
        let (guard, strategy) = self.enter_blocking();

        match strategy {
            BlockingStrategy::PollHardwareFlag => {
                let mut st = self.inner.lock(&guard);
                st.ensure_enabled()?;

                while st.rx.is_empty() {
                    self.poll_rx_data(&mut st);
                }

                Ok(self.take_rx_byte(&mut st))
            }
            BlockingStrategy::SchedulerSuspend(task) => {
                let mut guard = guard;
                loop {
                    let mut st = self.inner.lock(&guard);
                    st.ensure_enabled()?;

                    if !st.rx.is_empty() {
                        return Ok(self.take_rx_byte(&mut st));
                    }

                    st.blocked_reader = Some(task);
                    drop(st);
                    drop(guard);

                    self.scheduler.suspend();

                    guard = IrqGuard::new();
                    let mut st = self.inner.lock(&guard);
                    if st.state != State::Enabled || st.rx.is_empty() {
                        if st.blocked_reader == Some(task) {
                            st.blocked_reader = None;
                        }
                        #[cfg(feature = "defmt")]
                        defmt::debug!("recv_byte woken without data, aborting");
                        return Err(IoError::Aborted);
                    }
                }
            }
        }
    }

    /// Dequeue one byte and restart RX DMA if its window filled up.
    fn take_rx_byte(&self, st: &mut UartState<S::Task, N>) -> u8 {
        let byte = self.dequeue_rx(st);
        if self.hw.event(Event::EndRx) {
            self.restart_rx(st, self.hw.rx_amount());
        }
        byte
    }

    /// One polling step while the RX ring is empty.
    fn poll_rx_data(&self, st: &mut UartState<S::Task, N>) {
        if self.hw.event(Event::RxDrdy) {
            self.hw.clear_event(Event::RxDrdy);
            st.rx.produce_rx_byte();
        } else if self.hw.event(Event::EndRx) {
            self.restart_rx(st, self.hw.rx_amount());
        } else {
            spin_loop();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
