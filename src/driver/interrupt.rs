//! Interrupt handling for the UARTE.
//!
//! [`Uart::on_interrupt`] is the single entry point the platform's interrupt
//! vector calls. It walks every event flag once, clears what it observes and
//! moves the ring cursors accordingly. Flags are independent; several may be
//! handled in one invocation.
//!
//! The observed events are returned as an [`InterruptStatus`].

use super::config::State;
use super::uart::{Uart, UartState};
use crate::hal::{Event, Scheduler, UarteDma};
use crate::sync::IrqGuard;

// =============================================================================
// Interrupt Status
// =============================================================================

/// Events handled by one dispatcher pass.
///
/// # Example
///
/// ```ignore
/// #[interrupt]
/// fn UARTE0_UART0() {
///     let status = UART0.on_interrupt();
///     if status.has_error() {
///         LINE_ERRORS.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// Line error (overrun, parity, framing or break) cleared
    pub error: bool,
    /// A byte was received
    pub rx_ready: bool,
    /// The RX DMA window filled and was restarted
    pub end_rx: bool,
    /// The receiver timed out after a stop
    pub rx_timeout: bool,
    /// A byte was sent
    pub tx_ready: bool,
    /// The TX DMA window finished
    pub end_tx: bool,
}

impl InterruptStatus {
    /// Check if any data event was handled
    #[inline]
    pub fn any(&self) -> bool {
        self.rx_ready || self.end_rx || self.rx_timeout || self.tx_ready || self.end_tx
    }

    /// Check if a line error was cleared
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

impl<H: UarteDma, S: Scheduler, const N: usize> Uart<H, S, N> {
    /// Handle a UARTE interrupt (call from ISR)
    ///
    /// Does nothing unless the instance is enabled.
    pub fn on_interrupt(&self) -> InterruptStatus {
        let guard = IrqGuard::new();
        self.dispatch(&guard)
    }

    /// One dispatcher pass inside an already held critical section.
    ///
    /// Polling callers run this inline when the interrupt cannot preempt
    /// them.
    pub(super) fn dispatch(&self, guard: &IrqGuard) -> InterruptStatus {
        let mut status = InterruptStatus::default();
        let mut st = self.inner.lock(guard);
        if st.state != State::Enabled {
            return status;
        }

        status.error = self.clear_line_errors();

        // Receive
        status.rx_timeout = self.take_event(Event::RxTo);
        self.take_event(Event::RxStarted);

        if self.take_event(Event::RxDrdy) {
            status.rx_ready = true;
            st.rx.produce_rx_byte();
            self.service_rx(&mut st);
        }

        if self.hw.event(Event::EndRx) {
            status.end_rx = true;
            self.restart_rx(&mut st, self.hw.rx_amount());
            if !st.rx.is_empty() {
                // The restart may account for bytes whose RXDRDY merged
                self.service_rx(&mut st);
            }
        }

        // Transmit
        self.take_event(Event::TxStopped);
        self.take_event(Event::TxStarted);

        if self.take_event(Event::TxDrdy) {
            status.tx_ready = true;
            if !st.tx.is_empty() {
                st.tx.consumer = st.tx.consumer.wrapping_add(1);
            }

            if st.tx_job.is_active() {
                self.fill_tx_from_job(&mut st);
                if !st.tx_job.is_active() {
                    self.wake_writer(&mut st);
                }
            } else if !st.tx.is_full() {
                self.wake_writer(&mut st);
            }

            if st.config.loopback {
                self.loopback(&mut st);
            }
        }

        if self.hw.event(Event::EndTx) {
            status.end_tx = true;
            let amount = self.hw.tx_amount();
            if st.tx.tx_pending_after(amount) {
                self.start_tx(&mut st, amount);
            } else {
                // Idle; the next submission starts DMA directly
                self.hw.clear_event(Event::EndTx);
                st.tx.consumer = st.tx.snapshot.wrapping_add(amount);
                st.tx_ready = true;
                self.wake_writer(&mut st);
            }
        }

        status
    }

    /// Hand newly received bytes to the RX job, a blocked reader or loopback.
    fn service_rx(&self, st: &mut UartState<S::Task, N>) {
        if !st.rx_job.is_active() {
            if !st.rx.is_empty() {
                self.wake_reader(st);
            }
            if st.config.loopback {
                self.loopback(st);
            }
            return;
        }

        let mut echoed = false;
        while !st.rx.is_empty() && st.rx_job.transfer().is_some_and(|t| !t.is_complete()) {
            let byte = self.dequeue_rx(st);
            if st.config.loopback && !st.tx.is_full() {
                self.enqueue_tx(st, byte);
                echoed = true;
            }
            if let Some(transfer) = st.rx_job.transfer() {
                transfer.push_in(byte);
            }
        }

        let complete = st.rx_job.transfer().is_some_and(|t| t.is_complete());
        if complete || st.config.idle_ends_recv {
            st.rx_job.finish();
            self.wake_reader(st);
        }

        if echoed {
            self.kick_tx(st);
        }
    }

    /// Copy received bytes to the TX ring.
    ///
    /// Bytes that find the TX ring full are dropped; the receive path never
    /// waits for the transmitter.
    fn loopback(&self, st: &mut UartState<S::Task, N>) {
        let mut echoed = false;
        while !st.rx.is_empty() {
            let byte = self.dequeue_rx(st);
            if !st.tx.is_full() {
                self.enqueue_tx(st, byte);
                echoed = true;
            }
        }

        if echoed {
            self.kick_tx(st);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
