//! UARTE peripheral abstraction
//!
//! The driver talks to the DMA-capable UART through the [`UarteDma`] trait.
//! Register layout, bit-field encodings and interrupt vector tables live in
//! the implementation of this trait (usually a thin wrapper around a PAC
//! register block), not in this crate.
//!
//! The model follows an EasyDMA-style UARTE:
//!
//! - RX and TX each have a `{pointer, length}` window ([`DmaRegion`]) and a
//!   start trigger.
//! - Every hardware event is a sticky flag that software clears explicitly.
//! - `AMOUNT` registers report how many bytes the last RX/TX DMA moved and
//!   keep that value until the next start trigger of the same direction.

use crate::driver::config::{BaudRate, Parity, PinSelect, StopBits};

// =============================================================================
// Events
// =============================================================================

/// Hardware event flags raised by the UARTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// CTS line activated
    Cts,
    /// CTS line deactivated
    Ncts,
    /// A byte was received (it may not be in RAM yet)
    RxDrdy,
    /// RX DMA window is full
    EndRx,
    /// A byte was sent from TX RAM
    TxDrdy,
    /// TX DMA window fully sent
    EndTx,
    /// Line error detected, see [`ErrorSource`]
    Error,
    /// Receiver timeout after a stop request
    RxTo,
    /// RX DMA started
    RxStarted,
    /// TX DMA started
    TxStarted,
    /// Transmitter stopped
    TxStopped,
}

impl Event {
    /// Every event the UARTE can raise, in register order.
    pub const ALL: [Event; 11] = [
        Event::Cts,
        Event::Ncts,
        Event::RxDrdy,
        Event::EndRx,
        Event::TxDrdy,
        Event::EndTx,
        Event::Error,
        Event::RxTo,
        Event::RxStarted,
        Event::TxStarted,
        Event::TxStopped,
    ];

    /// Interrupt enable bit for this event (INTEN layout)
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Event::Cts => 1 << 0,
            Event::Ncts => 1 << 1,
            Event::RxDrdy => 1 << 2,
            Event::EndRx => 1 << 4,
            Event::TxDrdy => 1 << 7,
            Event::EndTx => 1 << 8,
            Event::Error => 1 << 9,
            Event::RxTo => 1 << 17,
            Event::RxStarted => 1 << 19,
            Event::TxStarted => 1 << 20,
            Event::TxStopped => 1 << 22,
        }
    }
}

/// Interrupts the driver enables while running.
///
/// The started/stopped/timeout events are housekeeping only and stay masked.
pub const DRIVER_INTERRUPTS: u32 = Event::Error.mask()
    | Event::EndTx.mask()
    | Event::EndRx.mask()
    | Event::TxDrdy.mask()
    | Event::RxDrdy.mask();

// =============================================================================
// Tasks
// =============================================================================

/// Hardware task triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Start RX DMA into the current RX window
    StartRx,
    /// Stop the receiver
    StopRx,
    /// Start TX DMA from the current TX window
    StartTx,
    /// Stop the transmitter
    StopTx,
    /// Flush the RX FIFO into the current RX window
    FlushRx,
}

// =============================================================================
// Error Source
// =============================================================================

/// Decoded ERRORSRC register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorSource(pub u32);

impl ErrorSource {
    /// A start bit arrived before the previous byte was read out of the FIFO
    pub const OVERRUN: u32 = 1 << 0;
    /// Parity check failed
    pub const PARITY: u32 = 1 << 1;
    /// Valid stop bit missing
    pub const FRAMING: u32 = 1 << 2;
    /// RXD held low longer than one frame
    pub const BREAK: u32 = 1 << 3;

    /// True if no error bit is set
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Overrun error reported
    #[inline]
    pub const fn overrun(self) -> bool {
        self.0 & Self::OVERRUN != 0
    }

    /// Parity error reported
    #[inline]
    pub const fn parity(self) -> bool {
        self.0 & Self::PARITY != 0
    }

    /// Framing error reported
    #[inline]
    pub const fn framing(self) -> bool {
        self.0 & Self::FRAMING != 0
    }

    /// Break condition reported
    #[inline]
    pub const fn break_condition(self) -> bool {
        self.0 & Self::BREAK != 0
    }
}

// =============================================================================
// Line Configuration
// =============================================================================

/// Frame format applied to the CONFIG register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Parity bit handling
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware flow control (RTS/CTS)
    pub hardware_flow_control: bool,
}

// =============================================================================
// DMA Region
// =============================================================================

/// A contiguous window of driver-owned memory handed to the DMA engine.
///
/// A region is only valid until the completion event of the DMA operation it
/// was assigned to (ENDRX/ENDTX) or until the driver assigns a new region for
/// the same direction. Implementations must not dereference it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaRegion {
    ptr: *mut u8,
    len: u32,
}

impl DmaRegion {
    /// Zero-length region, used to flush the AMOUNT registers.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            ptr: core::ptr::NonNull::dangling().as_ptr(),
            len: 0,
        }
    }

    /// Create a region from a raw window.
    ///
    /// # Safety
    ///
    /// `ptr..ptr + len` must stay valid and must not be accessed by software
    /// while the DMA operation using it is in flight.
    #[must_use]
    pub const unsafe fn from_raw(ptr: *mut u8, len: u32) -> Self {
        Self { ptr, len }
    }

    /// Start address (value for the `PTR` register)
    #[inline(always)]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Start address as u32 (for 32-bit DMA registers)
    #[inline(always)]
    pub fn addr_u32(&self) -> u32 {
        self.ptr as u32
    }

    /// Length in bytes (value for the `MAXCNT` register)
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// True for a zero-length region
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// SAFETY: a region is a plain address/length pair; the driver enforces the
// ownership rules documented on the type.
unsafe impl Send for DmaRegion {}

// =============================================================================
// Peripheral Trait
// =============================================================================

/// Register-level access to one DMA-capable UART instance.
///
/// All methods take `&self`: the peripheral is shared between the interrupt
/// handler and caller contexts, and every register access is volatile.
pub trait UarteDma {
    /// Returns true if `event` is currently raised.
    fn event(&self, event: Event) -> bool;

    /// Clear a raised event flag.
    fn clear_event(&self, event: Event);

    /// Read the error source register.
    fn error_source(&self) -> ErrorSource;

    /// Clear every bit of the error source register.
    fn clear_error_source(&self);

    /// Bytes moved by the most recent RX DMA.
    fn rx_amount(&self) -> u32;

    /// Bytes moved by the most recent TX DMA.
    fn tx_amount(&self) -> u32;

    /// Program the RX window for the next [`Trigger::StartRx`].
    fn set_rx_region(&self, region: DmaRegion);

    /// Program the TX window for the next [`Trigger::StartTx`].
    fn set_tx_region(&self, region: DmaRegion);

    /// Fire a hardware task.
    fn trigger(&self, trigger: Trigger);

    /// Enable or disable the peripheral.
    fn set_enabled(&self, enabled: bool);

    /// Returns true if the peripheral is enabled.
    fn is_enabled(&self) -> bool;

    /// Route the UART signals to GPIO pins (disconnected when `None`).
    fn set_pins(&self, pins: PinSelect);

    /// Apply parity, stop bits and hardware flow control.
    fn set_line_config(&self, config: LineConfig);

    /// Apply a baud rate.
    fn set_baud_rate(&self, baud: BaudRate);

    /// Enable the interrupts for the events in `mask` (INTENSET).
    fn enable_interrupts(&self, mask: u32);

    /// Disable the interrupts for the events in `mask` (INTENCLR).
    fn disable_interrupts(&self, mask: u32);

    /// Register the driver interrupt vector and unmask it at the NVIC with
    /// the given priority. Returns `false` if the platform refuses.
    fn attach_interrupt(&self, priority: u8) -> bool;

    /// Mask the interrupt source at the interrupt controller.
    fn detach_interrupt(&self);
}

impl<T: UarteDma + ?Sized> UarteDma for &T {
    fn event(&self, event: Event) -> bool {
        (**self).event(event)
    }

    fn clear_event(&self, event: Event) {
        (**self).clear_event(event);
    }

    fn error_source(&self) -> ErrorSource {
        (**self).error_source()
    }

    fn clear_error_source(&self) {
        (**self).clear_error_source();
    }

    fn rx_amount(&self) -> u32 {
        (**self).rx_amount()
    }

    fn tx_amount(&self) -> u32 {
        (**self).tx_amount()
    }

    fn set_rx_region(&self, region: DmaRegion) {
        (**self).set_rx_region(region);
    }

    fn set_tx_region(&self, region: DmaRegion) {
        (**self).set_tx_region(region);
    }

    fn trigger(&self, trigger: Trigger) {
        (**self).trigger(trigger);
    }

    fn set_enabled(&self, enabled: bool) {
        (**self).set_enabled(enabled);
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn set_pins(&self, pins: PinSelect) {
        (**self).set_pins(pins);
    }

    fn set_line_config(&self, config: LineConfig) {
        (**self).set_line_config(config);
    }

    fn set_baud_rate(&self, baud: BaudRate) {
        (**self).set_baud_rate(baud);
    }

    fn enable_interrupts(&self, mask: u32) {
        (**self).enable_interrupts(mask);
    }

    fn disable_interrupts(&self, mask: u32) {
        (**self).disable_interrupts(mask);
    }

    fn attach_interrupt(&self, priority: u8) -> bool {
        (**self).attach_interrupt(priority)
    }

    fn detach_interrupt(&self) {
        (**self).detach_interrupt();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_masks_are_distinct() {
        let mut seen = 0u32;
        for event in Event::ALL {
            assert_eq!(seen & event.mask(), 0, "{event:?} overlaps");
            seen |= event.mask();
        }
    }

    #[test]
    fn driver_interrupts_exclude_housekeeping_events() {
        assert_ne!(DRIVER_INTERRUPTS & Event::RxDrdy.mask(), 0);
        assert_ne!(DRIVER_INTERRUPTS & Event::EndTx.mask(), 0);
        assert_eq!(DRIVER_INTERRUPTS & Event::RxTo.mask(), 0);
        assert_eq!(DRIVER_INTERRUPTS & Event::TxStopped.mask(), 0);
        assert_eq!(DRIVER_INTERRUPTS & Event::Cts.mask(), 0);
    }

    #[test]
    fn error_source_decodes_bits() {
        let src = ErrorSource(ErrorSource::PARITY | ErrorSource::BREAK);
        assert!(src.parity());
        assert!(src.break_condition());
        assert!(!src.overrun());
        assert!(!src.framing());
        assert!(ErrorSource::default().is_empty());
    }

    #[test]
    fn empty_region_has_zero_length() {
        let region = DmaRegion::empty();
        assert!(region.is_empty());
        assert_eq!(region.len(), 0);
    }
}
