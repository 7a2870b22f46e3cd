//! Host-side test doubles.
//!
//! - [`SimUarte`]: byte-accurate model of an EasyDMA UARTE with sticky
//!   event flags, AMOUNT registers, a receive line queue and a TX wire log.
//! - [`ThreadScheduler`]: a [`Scheduler`] backed by `std` threads, so a test
//!   thread can block in the driver while the test body plays the interrupt.

#![allow(missing_docs)]

extern crate std;

use std::collections::{HashSet, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::driver::config::{BaudRate, Parity, PinSelect, StopBits};
use crate::driver::uart::Uart;
use crate::hal::{DmaRegion, ErrorSource, Event, LineConfig, Scheduler, Trigger, UarteDma};

// =============================================================================
// Simulated UARTE
// =============================================================================

/// One DMA direction.
#[derive(Debug, Clone, Copy)]
struct Channel {
    ptr: usize,
    len: u32,
    pos: u32,
    amount: u32,
    active: bool,
}

impl Channel {
    const fn new() -> Self {
        Self {
            ptr: 0,
            len: 0,
            pos: 0,
            amount: 0,
            active: false,
        }
    }

    fn start(&mut self) -> bool {
        self.pos = 0;
        self.active = self.len != 0;
        if !self.active {
            self.amount = 0;
        }
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            self.amount = self.pos;
            self.active = false;
        }
    }

    /// Advance past one byte; returns true when the window is exhausted.
    fn advance(&mut self) -> bool {
        self.pos += 1;
        if self.pos == self.len {
            self.amount = self.pos;
            self.active = false;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct SimState {
    enabled: bool,
    events: u32,
    error_source: u32,
    interrupt_mask: u32,
    attached: Option<u8>,
    refuse_interrupt: bool,
    baud: Option<BaudRate>,
    pins: PinSelect,
    line: LineConfig,
    rx: Channel,
    tx: Channel,
    input: VecDeque<u8>,
    wire: Vec<u8>,
    triggers: [usize; 5],
    autorun: bool,
}

impl SimState {
    fn raise(&mut self, event: Event) {
        self.events |= event.mask();
    }

    fn raised(&self, event: Event) -> bool {
        self.events & event.mask() != 0
    }

    fn receive_one(&mut self) -> bool {
        if !self.rx.active {
            return false;
        }
        let Some(byte) = self.input.pop_front() else {
            return false;
        };

        // SAFETY: the driver keeps the RX window valid while it is active.
        unsafe { (self.rx.ptr as *mut u8).add(self.rx.pos as usize).write_volatile(byte) };
        self.raise(Event::RxDrdy);
        if self.rx.advance() {
            self.raise(Event::EndRx);
        }
        true
    }

    fn transmit_one(&mut self) -> bool {
        if !self.tx.active {
            return false;
        }

        // SAFETY: the driver keeps the TX window valid while it is active.
        let byte = unsafe { (self.tx.ptr as *const u8).add(self.tx.pos as usize).read_volatile() };
        self.wire.push(byte);
        self.raise(Event::TxDrdy);
        if self.tx.advance() {
            self.raise(Event::EndTx);
        }
        true
    }
}

/// Simulated UARTE peripheral.
///
/// Bytes only move when the test calls [`receive_one`](Self::receive_one) or
/// [`transmit_one`](Self::transmit_one), unless autorun is enabled: then a
/// query of RXDRDY/TXDRDY that finds the flag low first moves one byte in
/// that direction, which is what a polling caller would observe on real
/// hardware.
///
/// STOPRX raises RXTO only; ENDRX is not generated for a stopped window.
#[derive(Debug)]
pub struct SimUarte {
    state: Mutex<SimState>,
}

impl SimUarte {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                enabled: false,
                events: 0,
                error_source: 0,
                interrupt_mask: 0,
                attached: None,
                refuse_interrupt: false,
                baud: None,
                pins: PinSelect::disconnected(),
                line: LineConfig {
                    parity: Parity::None,
                    stop_bits: StopBits::One,
                    hardware_flow_control: false,
                },
                rx: Channel::new(),
                tx: Channel::new(),
                input: VecDeque::new(),
                wire: Vec::new(),
                triggers: [0; 5],
                autorun: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn set_autorun(&self, enabled: bool) {
        self.lock().autorun = enabled;
    }

    /// Queue bytes on the RX line.
    pub fn inject(&self, bytes: &[u8]) {
        self.lock().input.extend(bytes.iter().copied());
    }

    /// Receive one queued byte into the RX window.
    pub fn receive_one(&self) -> bool {
        self.lock().receive_one()
    }

    /// Send one byte of the TX window.
    pub fn transmit_one(&self) -> bool {
        self.lock().transmit_one()
    }

    /// Drain everything sent so far.
    pub fn take_wire(&self) -> Vec<u8> {
        core::mem::take(&mut self.lock().wire)
    }

    /// Latch line error bits and raise the ERROR event.
    pub fn raise_error(&self, bits: u32) {
        let mut s = self.lock();
        s.error_source |= bits;
        s.raise(Event::Error);
    }

    pub fn error_source_bits(&self) -> u32 {
        self.lock().error_source
    }

    /// Flag state without autorun side effects.
    pub fn is_raised(&self, event: Event) -> bool {
        self.lock().raised(event)
    }

    pub fn raised_events(&self) -> u32 {
        self.lock().events
    }

    pub fn refuse_interrupt(&self, refuse: bool) {
        self.lock().refuse_interrupt = refuse;
    }

    pub fn attached_priority(&self) -> Option<u8> {
        self.lock().attached
    }

    pub fn interrupt_mask(&self) -> u32 {
        self.lock().interrupt_mask
    }

    pub fn baud(&self) -> Option<BaudRate> {
        self.lock().baud
    }

    pub fn pins(&self) -> PinSelect {
        self.lock().pins
    }

    pub fn line_config(&self) -> LineConfig {
        self.lock().line
    }

    pub fn rx_window_len(&self) -> u32 {
        self.lock().rx.len
    }

    pub fn tx_window_len(&self) -> u32 {
        self.lock().tx.len
    }

    pub fn rx_active(&self) -> bool {
        self.lock().rx.active
    }

    pub fn tx_active(&self) -> bool {
        self.lock().tx.active
    }

    pub fn trigger_count(&self, trigger: Trigger) -> usize {
        self.lock().triggers[trigger_index(trigger)]
    }
}

impl Default for SimUarte {
    fn default() -> Self {
        Self::new()
    }
}

fn trigger_index(trigger: Trigger) -> usize {
    match trigger {
        Trigger::StartRx => 0,
        Trigger::StopRx => 1,
        Trigger::StartTx => 2,
        Trigger::StopTx => 3,
        Trigger::FlushRx => 4,
    }
}

impl UarteDma for SimUarte {
    fn event(&self, event: Event) -> bool {
        let mut s = self.lock();
        if s.autorun && !s.raised(event) {
            match event {
                Event::RxDrdy => {
                    s.receive_one();
                }
                Event::TxDrdy => {
                    s.transmit_one();
                }
                _ => {}
            }
        }
        s.raised(event)
    }

    fn clear_event(&self, event: Event) {
        self.lock().events &= !event.mask();
    }

    fn error_source(&self) -> ErrorSource {
        ErrorSource(self.lock().error_source)
    }

    fn clear_error_source(&self) {
        self.lock().error_source = 0;
    }

    fn rx_amount(&self) -> u32 {
        self.lock().rx.amount
    }

    fn tx_amount(&self) -> u32 {
        self.lock().tx.amount
    }

    fn set_rx_region(&self, region: DmaRegion) {
        let mut s = self.lock();
        s.rx.ptr = region.ptr() as usize;
        s.rx.len = region.len();
    }

    fn set_tx_region(&self, region: DmaRegion) {
        let mut s = self.lock();
        s.tx.ptr = region.ptr() as usize;
        s.tx.len = region.len();
    }

    fn trigger(&self, trigger: Trigger) {
        let mut s = self.lock();
        s.triggers[trigger_index(trigger)] += 1;

        match trigger {
            Trigger::StartRx => {
                if !s.rx.start() {
                    s.raise(Event::EndRx);
                }
                s.raise(Event::RxStarted);
            }
            Trigger::StopRx => {
                s.rx.stop();
                s.raise(Event::RxTo);
            }
            Trigger::StartTx => {
                if !s.tx.start() {
                    s.raise(Event::EndTx);
                }
                s.raise(Event::TxStarted);
            }
            Trigger::StopTx => {
                s.tx.stop();
                s.raise(Event::TxStopped);
            }
            Trigger::FlushRx => {
                s.rx.active = false;
                s.rx.amount = 0;
                s.raise(Event::EndRx);
            }
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn set_pins(&self, pins: PinSelect) {
        self.lock().pins = pins;
    }

    fn set_line_config(&self, config: LineConfig) {
        self.lock().line = config;
    }

    fn set_baud_rate(&self, baud: BaudRate) {
        self.lock().baud = Some(baud);
    }

    fn enable_interrupts(&self, mask: u32) {
        self.lock().interrupt_mask |= mask;
    }

    fn disable_interrupts(&self, mask: u32) {
        self.lock().interrupt_mask &= !mask;
    }

    fn attach_interrupt(&self, priority: u8) -> bool {
        let mut s = self.lock();
        if s.refuse_interrupt {
            return false;
        }
        s.attached = Some(priority);
        true
    }

    fn detach_interrupt(&self) {
        self.lock().attached = None;
    }
}

// =============================================================================
// Thread Scheduler
// =============================================================================

std::thread_local! {
    /// Stand-in for the PRIMASK bit of the calling thread.
    static MASKED: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

/// Run `f` the way firmware runs code with interrupts disabled outside the
/// driver: inside a raw critical section, with the platform mask reporting
/// it.
pub fn with_interrupts_masked<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| {
        let outer = MASKED.replace(true);
        let result = f();
        MASKED.set(outer);
        result
    })
}

#[derive(Debug, Default)]
struct Parked {
    woken: HashSet<ThreadId>,
    suspended: usize,
}

/// Cooperative scheduler where every task is an OS thread.
///
/// A wake issued before the matching suspend is remembered.
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    parked: Mutex<Parked>,
    cond: Condvar,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `count` tasks are suspended.
    pub fn wait_until_suspended(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut parked = self.parked.lock().unwrap();
        while parked.suspended < count {
            let left = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| panic!("{count} tasks never suspended"));
            parked = self.cond.wait_timeout(parked, left).unwrap().0;
        }
    }
}

impl Scheduler for ThreadScheduler {
    type Task = ThreadId;

    fn current_task(&self) -> Option<ThreadId> {
        Some(thread::current().id())
    }

    fn suspend(&self) {
        let me = thread::current().id();
        let mut parked = self.parked.lock().unwrap();
        parked.suspended += 1;
        self.cond.notify_all();

        while !parked.woken.remove(&me) {
            parked = self.cond.wait(parked).unwrap();
        }
        parked.suspended -= 1;
    }

    fn wake(&self, task: ThreadId) {
        self.parked.lock().unwrap().woken.insert(task);
        self.cond.notify_all();
    }

    fn interrupts_masked(&self) -> bool {
        MASKED.get()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Receive `bytes` one at a time, running the interrupt after each.
pub fn feed<S: Scheduler, const N: usize>(uart: &Uart<&SimUarte, S, N>, sim: &SimUarte, bytes: &[u8]) {
    for &byte in bytes {
        sim.inject(&[byte]);
        while sim.receive_one() {
            uart.on_interrupt();
        }
    }
}

/// Let the line run in both directions until nothing moves.
pub fn pump<S: Scheduler, const N: usize>(uart: &Uart<&SimUarte, S, N>, sim: &SimUarte) {
    uart.on_interrupt();
    loop {
        let sent = sim.transmit_one();
        let received = sim.receive_one();
        if !sent && !received {
            break;
        }
        uart.on_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_windows_raise_end_events() {
        let sim = SimUarte::new();
        let mut buf = [0u8; 2];
        // SAFETY: `buf` outlives the simulated transfer.
        sim.set_rx_region(unsafe { DmaRegion::from_raw(buf.as_mut_ptr(), 2) });
        sim.trigger(Trigger::StartRx);
        sim.inject(b"xyz");

        assert!(sim.receive_one());
        assert!(!sim.is_raised(Event::EndRx));
        assert!(sim.receive_one());
        assert!(sim.is_raised(Event::EndRx));
        assert!(!sim.receive_one());

        assert_eq!(sim.rx_amount(), 2);
        assert_eq!(buf, *b"xy");
    }

    #[test]
    fn empty_window_ends_immediately() {
        let sim = SimUarte::new();
        sim.set_tx_region(DmaRegion::empty());
        sim.trigger(Trigger::StartTx);

        assert!(sim.is_raised(Event::EndTx));
        assert_eq!(sim.tx_amount(), 0);
        assert!(!sim.transmit_one());
    }

    #[test]
    fn masked_scope_is_reported_to_the_scheduler() {
        let sched = ThreadScheduler::new();
        assert!(!sched.interrupts_masked());
        assert!(with_interrupts_masked(|| sched.interrupts_masked()));
        assert!(!sched.interrupts_masked());
    }

    #[test]
    fn early_wake_is_not_lost() {
        let sched = ThreadScheduler::new();
        sched.wake(thread::current().id());
        sched.suspend();
    }
}
