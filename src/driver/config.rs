//! Configuration types for the UARTE DMA driver

use crate::internal::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_INTERRUPT_PRIORITY, MAX_INTERRUPT_PRIORITY, MAX_PIN,
};

/// Parity bit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Even parity bit included
    Even,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// Baud rates supported by the UARTE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    /// 1200 baud
    Baud1200,
    /// 2400 baud
    Baud2400,
    /// 4800 baud
    Baud4800,
    /// 9600 baud
    Baud9600,
    /// 14400 baud
    Baud14400,
    /// 19200 baud
    Baud19200,
    /// 28800 baud
    Baud28800,
    /// 31250 baud (MIDI)
    Baud31250,
    /// 38400 baud
    Baud38400,
    /// 56000 baud
    Baud56000,
    /// 57600 baud
    Baud57600,
    /// 76800 baud
    Baud76800,
    /// 115200 baud
    #[default]
    Baud115200,
    /// 230400 baud
    Baud230400,
    /// 250000 baud
    Baud250000,
    /// 460800 baud
    Baud460800,
    /// 921600 baud
    Baud921600,
    /// 1 Mbaud
    Baud1M,
}

impl BaudRate {
    /// Every supported rate, ascending.
    pub const ALL: [BaudRate; 18] = [
        BaudRate::Baud1200,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud14400,
        BaudRate::Baud19200,
        BaudRate::Baud28800,
        BaudRate::Baud31250,
        BaudRate::Baud38400,
        BaudRate::Baud56000,
        BaudRate::Baud57600,
        BaudRate::Baud76800,
        BaudRate::Baud115200,
        BaudRate::Baud230400,
        BaudRate::Baud250000,
        BaudRate::Baud460800,
        BaudRate::Baud921600,
        BaudRate::Baud1M,
    ];

    /// Nominal rate in bits per second
    #[must_use]
    pub const fn bps(self) -> u32 {
        match self {
            BaudRate::Baud1200 => 1_200,
            BaudRate::Baud2400 => 2_400,
            BaudRate::Baud4800 => 4_800,
            BaudRate::Baud9600 => 9_600,
            BaudRate::Baud14400 => 14_400,
            BaudRate::Baud19200 => 19_200,
            BaudRate::Baud28800 => 28_800,
            BaudRate::Baud31250 => 31_250,
            BaudRate::Baud38400 => 38_400,
            BaudRate::Baud56000 => 56_000,
            BaudRate::Baud57600 => 57_600,
            BaudRate::Baud76800 => 76_800,
            BaudRate::Baud115200 => 115_200,
            BaudRate::Baud230400 => 230_400,
            BaudRate::Baud250000 => 250_000,
            BaudRate::Baud460800 => 460_800,
            BaudRate::Baud921600 => 921_600,
            BaudRate::Baud1M => 1_000_000,
        }
    }

    /// Closest supported rate to `requested`.
    ///
    /// Zero selects the default rate. Ties resolve to the lower rate.
    #[must_use]
    pub const fn nearest(requested: u32) -> Self {
        let requested = if requested == 0 {
            DEFAULT_BAUD_RATE
        } else {
            requested
        };

        let mut best = BaudRate::ALL[0];
        let mut best_diff = requested.abs_diff(best.bps());
        let mut i = 1;
        while i < BaudRate::ALL.len() {
            let diff = requested.abs_diff(BaudRate::ALL[i].bps());
            if diff < best_diff {
                best = BaudRate::ALL[i];
                best_diff = diff;
            }
            i += 1;
        }
        best
    }
}

/// GPIO routing of the UART signals; `None` leaves a signal disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSelect {
    /// Transmit data
    pub txd: Option<u8>,
    /// Receive data
    pub rxd: Option<u8>,
    /// Clear to send (flow control input)
    pub cts: Option<u8>,
    /// Request to send (flow control output)
    pub rts: Option<u8>,
}

impl PinSelect {
    /// All signals disconnected
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            txd: None,
            rxd: None,
            cts: None,
            rts: None,
        }
    }

    /// Data lines only, no flow control pins
    #[must_use]
    pub const fn data(txd: u8, rxd: u8) -> Self {
        Self {
            txd: Some(txd),
            rxd: Some(rxd),
            cts: None,
            rts: None,
        }
    }

    /// Attach flow control pins
    #[must_use]
    pub const fn with_flow_pins(mut self, cts: u8, rts: u8) -> Self {
        self.cts = Some(cts);
        self.rts = Some(rts);
        self
    }

    /// True if neither CTS nor RTS is connected
    #[must_use]
    pub const fn flow_pins_disconnected(&self) -> bool {
        self.cts.is_none() && self.rts.is_none()
    }

    /// True if every connected pin is within the GPIO range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        const fn ok(pin: Option<u8>) -> bool {
            match pin {
                Some(p) => p <= MAX_PIN,
                None => true,
            }
        }
        ok(self.txd) && ok(self.rxd) && ok(self.cts) && ok(self.rts)
    }
}

/// UART driver configuration
///
/// Use the builder methods to customize:
///
/// ```ignore
/// let config = UartConfig::new()
///     .with_baud_rate(1_000_000)
///     .with_pins(PinSelect::data(6, 8))
///     .with_idle_ends_recv(false);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Requested baud rate in bps, 0 selects the default
    pub baud_rate: u32,
    /// Parity bit handling
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware flow control, forced off when no flow pins are connected
    pub flow_control: bool,
    /// Interrupt priority passed to the interrupt controller
    pub interrupt_priority: u8,
    /// An RX job ends as soon as the RX queue drains, even if short
    pub idle_ends_recv: bool,
    /// Re-queue every received byte for transmission
    pub loopback: bool,
    /// Pin routing
    pub pins: PinSelect,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UartConfig {
    /// Default configuration: 115200 8N1, no flow control
    #[must_use]
    pub const fn new() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
            interrupt_priority: DEFAULT_INTERRUPT_PRIORITY,
            idle_ends_recv: true,
            loopback: false,
            pins: PinSelect::disconnected(),
        }
    }

    /// Set the requested baud rate
    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set parity handling
    #[must_use]
    pub const fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the number of stop bits
    #[must_use]
    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Enable or disable hardware flow control
    #[must_use]
    pub const fn with_flow_control(mut self, enabled: bool) -> Self {
        self.flow_control = enabled;
        self
    }

    /// Set the interrupt priority
    #[must_use]
    pub const fn with_interrupt_priority(mut self, priority: u8) -> Self {
        self.interrupt_priority = priority;
        self
    }

    /// Set whether an RX job ends when the RX queue drains
    #[must_use]
    pub const fn with_idle_ends_recv(mut self, enabled: bool) -> Self {
        self.idle_ends_recv = enabled;
        self
    }

    /// Enable or disable loopback
    #[must_use]
    pub const fn with_loopback(mut self, enabled: bool) -> Self {
        self.loopback = enabled;
        self
    }

    /// Set pin routing
    #[must_use]
    pub const fn with_pins(mut self, pins: PinSelect) -> Self {
        self.pins = pins;
        self
    }

    /// Check the parameters that can be rejected
    pub(crate) const fn validate(&self) -> Result<(), crate::ConfigError> {
        if !self.pins.is_valid() {
            return Err(crate::ConfigError::InvalidPin);
        }
        if self.interrupt_priority > MAX_INTERRUPT_PRIORITY {
            return Err(crate::ConfigError::InvalidPriority);
        }
        Ok(())
    }
}

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not initialized, or deinitialized
    #[default]
    Uninitialized,
    /// `init` is applying configuration
    Configuring,
    /// Running; byte and job APIs are available
    Enabled,
    /// `deinit` is stopping the hardware
    Disabling,
}

// =============================================================================
// Unit Tests
// =============================================================================
