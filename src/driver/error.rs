//! Error types for the UARTE DMA driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Initialization and configuration failures
//! - [`IoError`]: Runtime send/receive failures
//!
//! The unified [`Error`] enum wraps both domain errors and is returned
//! by most driver methods.
//!
//! RX overflow is deliberately absent: dropping the oldest unread bytes is
//! defined behavior, not a failure.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
///
/// These errors occur during `init`/`configure`. The instance is left
/// `Uninitialized` when one of them is returned from `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pin number outside the GPIO range of the device
    InvalidPin,
    /// Interrupt priority does not fit the priority field
    InvalidPriority,
    /// The platform refused to register the interrupt vector
    InterruptRegistration,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidPin => "invalid pin selection",
            ConfigError::InvalidPriority => "invalid interrupt priority",
            ConfigError::InterruptRegistration => "interrupt registration failed",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime send/receive errors
///
/// A caller receiving one of these must treat the byte (or the remainder of
/// the job) as not transferred. The ring buffer cursors may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// The instance has not been initialized (or was deinitialized)
    NotInitialized,
    /// A blocked wait was woken without progress, or cancelled by `deinit`
    Aborted,
    /// A job in the same direction is already active
    JobInProgress,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::NotInitialized => "not initialized",
            IoError::Aborted => "transfer aborted",
            IoError::JobInProgress => "job already in progress",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Lifecycle calls return it; the byte and job APIs return [`IoError`]
/// directly.
/// ```ignore
/// match uart.init(config) {
///     Err(Error::Config(ConfigError::InterruptRegistration)) => { /* vector taken */ }
///     Err(e) => return Err(e),
///     Ok(()) => {}
/// }
///
/// match uart.recv_byte() {
///     Err(IoError::Aborted) => { /* wait cancelled */ }
///     Err(IoError::NotInitialized) => { /* call init first */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for UART operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
