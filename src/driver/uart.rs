//! Core UART driver implementation.
//!
//! This module contains the main [`Uart`] structure and core operations:
//!
//! - Construction and state accessors
//! - Lifecycle: init, configure, deinit, abort
//! - DMA restart helpers shared by the byte API, the job API and the
//!   interrupt dispatcher
//!
//! For the byte API, see the [`io`](super::io) module.
//! For bulk jobs, see the [`bulk`](super::bulk) module.
//! For the interrupt entry point, see the [`interrupt`](super::interrupt) module.

use core::hint::spin_loop;

use super::blocking::BlockingStrategy;
use super::config::{BaudRate, PinSelect, State, UartConfig};
use super::error::{ConfigError, ConfigResult, IoError, IoResult, Result};
use crate::hal::{DRIVER_INTERRUPTS, DmaRegion, Event, LineConfig, Scheduler, Trigger, UarteDma};
use crate::internal::buffer::DmaBuffer;
use crate::internal::constants::DEFAULT_BUFFER_SIZE;
use crate::internal::job::Job;
use crate::internal::ring::Ring;
use crate::sync::{CriticalSectionCell, IrqGuard};

// =============================================================================
// Shared State
// =============================================================================

/// Everything the interrupt dispatcher and callers share.
pub(super) struct UartState<T, const N: usize> {
    /// RX ring cursors
    pub rx: Ring<N>,
    /// TX ring cursors
    pub tx: Ring<N>,
    /// No TX DMA in flight and ENDTX already consumed
    pub tx_ready: bool,
    /// Bulk receive slot
    pub rx_job: Job,
    /// Bulk transmit slot
    pub tx_job: Job,
    /// Applied configuration
    pub config: UartConfig,
    /// Baud rate programmed into the peripheral
    pub baud: BaudRate,
    /// Lifecycle state
    pub state: State,
    /// Task waiting for RX data
    pub blocked_reader: Option<T>,
    /// Task waiting for TX space or job completion
    pub blocked_writer: Option<T>,
}

impl<T, const N: usize> UartState<T, N> {
    const fn new() -> Self {
        Self {
            rx: Ring::new(),
            tx: Ring::new(),
            tx_ready: false,
            rx_job: Job::Idle,
            tx_job: Job::Idle,
            config: UartConfig::new(),
            baud: BaudRate::Baud115200,
            state: State::Uninitialized,
            blocked_reader: None,
            blocked_writer: None,
        }
    }

    /// Fail unless the instance is running
    #[inline(always)]
    pub fn ensure_enabled(&self) -> IoResult<()> {
        if self.state == State::Enabled {
            Ok(())
        } else {
            Err(IoError::NotInitialized)
        }
    }

    fn reset_cursors(&mut self) {
        self.rx.reset();
        self.tx.reset();
        self.tx_ready = false;
    }
}

// =============================================================================
// UART Driver
// =============================================================================

/// DMA-backed UART driver
///
/// Owns one RX and one TX ring buffer of `N` bytes each (`N` a power of two)
/// and shares its state with the interrupt handler through a critical
/// section. Every method takes `&self`, so an instance is normally a
/// `static` shared between tasks and the interrupt vector.
///
/// # Type Parameters
/// * `H` - Peripheral access ([`UarteDma`])
/// * `S` - Scheduler used to park blocked callers ([`Scheduler`])
/// * `N` - Ring buffer size per direction
///
/// # Example
/// ```ignore
/// static UART0: Uart<Uarte0, BareMetal> = Uart::new(Uarte0::new(), BareMetal);
///
/// UART0.init(UartConfig::new().with_pins(PinSelect::data(6, 8)))?;
/// UART0.send_byte(b'>')?;
///
/// #[interrupt]
/// fn UARTE0_UART0() {
///     UART0.on_interrupt();
/// }
/// ```
pub struct Uart<H: UarteDma, S: Scheduler, const N: usize = DEFAULT_BUFFER_SIZE> {
    pub(super) hw: H,
    pub(super) scheduler: S,
    pub(super) rx_buf: DmaBuffer<N>,
    pub(super) tx_buf: DmaBuffer<N>,
    pub(super) inner: CriticalSectionCell<UartState<S::Task, N>>,
}

/// UART with 64-byte rings
pub type UartSmall<H, S> = Uart<H, S, 64>;

/// UART with the default 256-byte rings
pub type UartDefault<H, S> = Uart<H, S, DEFAULT_BUFFER_SIZE>;

/// UART with 1 KiB rings
pub type UartLarge<H, S> = Uart<H, S, 1024>;

impl<H: UarteDma, S: Scheduler, const N: usize> Uart<H, S, N> {
    /// Create a new UART instance
    ///
    /// This is a const function suitable for static initialization.
    /// The instance is created in the `Uninitialized` state.
    pub const fn new(hw: H, scheduler: S) -> Self {
        Self {
            hw,
            scheduler,
            rx_buf: DmaBuffer::new(),
            tx_buf: DmaBuffer::new(),
            inner: CriticalSectionCell::new(UartState::new()),
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current lifecycle state
    pub fn state(&self) -> State {
        self.inner.with(|st| st.state)
    }

    /// Get the applied configuration
    pub fn config(&self) -> UartConfig {
        self.inner.with(|st| st.config)
    }

    /// Baud rate actually programmed (nearest supported to the request)
    pub fn baud_rate(&self) -> BaudRate {
        self.inner.with(|st| st.baud)
    }

    /// Received bytes waiting to be read
    pub fn rx_pending(&self) -> usize {
        self.inner.with(|st| st.rx.pending() as usize)
    }

    /// Queued bytes not yet sent
    pub fn tx_pending(&self) -> usize {
        self.inner.with(|st| st.tx.pending() as usize)
    }

    /// Ring buffer size per direction
    pub const fn buffer_size() -> usize {
        N
    }

    /// Access the peripheral
    pub fn peripheral(&self) -> &H {
        &self.hw
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the UART and start receiving
    ///
    /// On an instance that is already running this only re-applies the
    /// register-level configuration; ring buffers and jobs are untouched.
    ///
    /// # Errors
    /// - `InvalidPin` / `InvalidPriority` - the configuration was rejected
    /// - `InterruptRegistration` - the platform refused the interrupt vector;
    ///   the instance stays `Uninitialized`
    pub fn init(&self, config: UartConfig) -> Result<()> {
        {
            let guard = IrqGuard::new();
            let mut st = self.inner.lock(&guard);
            if st.state == State::Enabled {
                return self.apply_config(&mut st, config).map_err(Into::into);
            }
        }

        self.deinit();

        let guard = IrqGuard::new();
        let mut st = self.inner.lock(&guard);
        st.state = State::Configuring;

        if let Err(e) = self.apply_config(&mut st, config) {
            st.state = State::Uninitialized;
            return Err(e.into());
        }

        if !self.hw.attach_interrupt(st.config.interrupt_priority) {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "UART interrupt registration refused (priority {})",
                st.config.interrupt_priority
            );
            st.state = State::Uninitialized;
            return Err(ConfigError::InterruptRegistration.into());
        }
        self.hw.enable_interrupts(DRIVER_INTERRUPTS);

        st.reset_cursors();
        st.rx_job = Job::Idle;
        st.tx_job = Job::Idle;
        st.tx_ready = true;

        // The first RX DMA covers the whole buffer
        self.hw.set_rx_region(self.rx_buf.full_region());
        self.hw.set_tx_region(self.tx_buf.empty_region());

        self.hw.set_enabled(true);
        self.hw.trigger(Trigger::StartRx);

        self.clear_all_events();
        st.state = State::Enabled;

        #[cfg(feature = "defmt")]
        defmt::info!("UART enabled at {} baud", st.baud.bps());

        Ok(())
    }

    /// Apply the register-level configuration
    ///
    /// Translates baud rate, parity, stop bits and flow control into
    /// peripheral settings. Cursors and jobs are not touched, so this can be
    /// used on a running instance.
    ///
    /// # Errors
    /// - `InvalidPin` - a pin number is outside the GPIO range
    /// - `InvalidPriority` - the interrupt priority does not fit
    pub fn configure(&self, config: UartConfig) -> ConfigResult<()> {
        let guard = IrqGuard::new();
        let mut st = self.inner.lock(&guard);
        self.apply_config(&mut st, config)
    }

    fn apply_config(&self, st: &mut UartState<S::Task, N>, config: UartConfig) -> ConfigResult<()> {
        config.validate()?;

        let mut config = config;
        if config.pins.flow_pins_disconnected() {
            // Neither CTS nor RTS routed
            config.flow_control = false;
        }

        let baud = BaudRate::nearest(config.baud_rate);
        self.hw.set_baud_rate(baud);
        self.hw.set_line_config(LineConfig {
            parity: config.parity,
            stop_bits: config.stop_bits,
            hardware_flow_control: config.flow_control,
        });
        self.hw.set_pins(config.pins);

        #[cfg(feature = "defmt")]
        if baud.bps() != config.baud_rate {
            defmt::debug!("baud {} requested, {} applied", config.baud_rate, baud.bps());
        }

        st.config = config;
        st.baud = baud;
        Ok(())
    }

    /// Stop the UART and release the pins
    ///
    /// Stops both DMA directions, flushes the AMOUNT registers with a
    /// zero-length transfer, clears all cursors and fails any blocked caller
    /// with `Aborted`. Calling it on a stopped instance is a no-op apart from
    /// re-clearing the peripheral.
    pub fn deinit(&self) {
        let guard = IrqGuard::new();
        let mut st = self.inner.lock(&guard);

        self.hw.detach_interrupt();
        self.hw.disable_interrupts(u32::MAX);

        if st.state == State::Enabled {
            st.state = State::Disabling;
        }
        st.reset_cursors();

        if self.hw.is_enabled() {
            self.hw.clear_event(Event::TxStopped);
            self.hw.trigger(Trigger::StopRx);
            self.hw.trigger(Trigger::StopTx);
            self.wait_for(Event::TxStopped);

            self.hw.clear_event(Event::TxStopped);
            self.hw.clear_event(Event::EndRx);
            self.hw.clear_event(Event::EndTx);

            // Empty DMA in both directions resets RX and TX AMOUNT
            self.hw.set_rx_region(DmaRegion::empty());
            self.hw.set_tx_region(DmaRegion::empty());
            self.hw.trigger(Trigger::FlushRx);
            self.hw.trigger(Trigger::StartTx);
            while !self.hw.event(Event::EndRx) && !self.hw.event(Event::EndTx) {
                spin_loop();
            }

            self.hw.trigger(Trigger::StopRx);
            self.hw.trigger(Trigger::StopTx);
            self.wait_for(Event::TxStopped);
        }

        self.hw.set_enabled(false);
        self.hw.set_pins(PinSelect::disconnected());
        self.hw.clear_error_source();
        self.clear_all_events();

        self.abort_locked(&mut st);
        st.state = State::Uninitialized;

        #[cfg(feature = "defmt")]
        defmt::info!("UART disabled");
    }

    /// Cancel active jobs and wake every blocked caller
    ///
    /// Woken callers observe no progress and return `Aborted`.
    pub fn abort(&self) {
        let guard = IrqGuard::new();
        let mut st = self.inner.lock(&guard);
        self.abort_locked(&mut st);
    }

    fn abort_locked(&self, st: &mut UartState<S::Task, N>) {
        if st.rx_job.abort() | st.tx_job.abort() {
            #[cfg(feature = "defmt")]
            defmt::warn!("UART jobs aborted");
        }
        self.wake_reader(st);
        self.wake_writer(st);
    }

    /// Enable or disable loopback of received bytes
    pub fn set_loopback(&self, enabled: bool) {
        self.inner.with(|st| st.config.loopback = enabled);
    }

    // =========================================================================
    // DMA Helpers
    // =========================================================================

    /// Account for the finished TX DMA and start the next one.
    pub(super) fn start_tx(&self, st: &mut UartState<S::Task, N>, amount: u32) {
        self.hw.clear_event(Event::TxDrdy);
        self.hw.clear_event(Event::EndTx);
        st.tx_ready = false;

        let desc = st.tx.next_tx_window(amount);
        self.hw.set_tx_region(self.tx_buf.region(desc));
        self.hw.trigger(Trigger::StartTx);
    }

    /// Start TX DMA if bytes are queued and no transfer is in flight.
    pub(super) fn kick_tx(&self, st: &mut UartState<S::Task, N>) {
        if !st.tx.is_empty() && (st.tx_ready || self.hw.event(Event::EndTx)) {
            self.start_tx(st, self.hw.tx_amount());
        }
    }

    /// Account for the finished RX DMA and start the next one.
    pub(super) fn restart_rx(&self, st: &mut UartState<S::Task, N>, amount: u32) {
        self.hw.clear_event(Event::RxDrdy);
        self.hw.clear_event(Event::EndRx);

        #[cfg(feature = "defmt")]
        let before = st.rx.consumer;

        let desc = st.rx.next_rx_window(amount);

        #[cfg(feature = "defmt")]
        if st.rx.consumer != before {
            defmt::debug!("RX overflow, dropped {} bytes", st.rx.consumer.wrapping_sub(before));
        }

        self.hw.set_rx_region(self.rx_buf.region(desc));
        self.hw.trigger(Trigger::StartRx);
    }

    /// Queue one byte for transmission (ring must not be full).
    #[inline]
    pub(super) fn enqueue_tx(&self, st: &mut UartState<S::Task, N>, byte: u8) {
        self.tx_buf.write(st.tx.producer_index(), byte);
        st.tx.producer = st.tx.producer.wrapping_add(1);
    }

    /// Take one received byte (ring must not be empty).
    #[inline]
    pub(super) fn dequeue_rx(&self, st: &mut UartState<S::Task, N>) -> u8 {
        if st.rx.is_full() {
            self.settle_full_rx(st);
        }
        let byte = self.rx_buf.read(st.rx.consumer_index());
        st.rx.consumer = st.rx.consumer.wrapping_add(1);
        byte
    }

    /// Account for a byte the DMA may have written over the oldest slot.
    ///
    /// A full ring receives through a one-byte window on its oldest unread
    /// slot. Until RXDRDY/ENDRX are serviced that slot already holds the
    /// newest byte, so reading it would hand out the newest byte first.
    fn settle_full_rx(&self, st: &mut UartState<S::Task, N>) {
        if self.hw.event(Event::EndRx) {
            self.restart_rx(st, self.hw.rx_amount());
        } else if self.take_event(Event::RxDrdy) {
            st.rx.produce_rx_byte();
        }
    }

    // =========================================================================
    // Wake / Block Helpers
    // =========================================================================

    /// Mask interrupts and pick how the calling blocking operation waits.
    ///
    /// The platform's interrupt mask is sampled before the guard sets it, so
    /// a caller already running with interrupts disabled (outer critical
    /// section, fault handler) polls instead of suspending.
    pub(super) fn enter_blocking(&self) -> (IrqGuard, BlockingStrategy<S::Task>) {
        let masked = self.scheduler.interrupts_masked();
        let guard = IrqGuard::new();
        let strategy = BlockingStrategy::select(
            masked || guard.is_nested(),
            self.scheduler.current_task(),
        );
        (guard, strategy)
    }

    pub(super) fn wake_reader(&self, st: &mut UartState<S::Task, N>) {
        if let Some(task) = st.blocked_reader.take() {
            self.scheduler.wake(task);
        }
    }

    pub(super) fn wake_writer(&self, st: &mut UartState<S::Task, N>) {
        if let Some(task) = st.blocked_writer.take() {
            self.scheduler.wake(task);
        }
    }

    // =========================================================================
    // Event Helpers
    // =========================================================================

    /// Clear ERRORSRC and the line status events.
    ///
    /// Returns true if a line error was pending.
    pub(super) fn clear_line_errors(&self) -> bool {
        let source = self.hw.error_source();
        let mut error = !source.is_empty();
        if error {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "UART line error: overrun={} parity={} framing={} break={}",
                source.overrun(),
                source.parity(),
                source.framing(),
                source.break_condition()
            );
            self.hw.clear_error_source();
        }

        error |= self.take_event(Event::Error);
        self.take_event(Event::Cts);
        self.take_event(Event::Ncts);
        error
    }

    /// Clear `event` if raised. Returns whether it was.
    #[inline]
    pub(super) fn take_event(&self, event: Event) -> bool {
        let raised = self.hw.event(event);
        if raised {
            self.hw.clear_event(event);
        }
        raised
    }

    fn clear_all_events(&self) {
        for event in Event::ALL {
            self.hw.clear_event(event);
        }
    }

    fn wait_for(&self, event: Event) {
        while !self.hw.event(event) {
            spin_loop();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
