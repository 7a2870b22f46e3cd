//! Core driver components for the UARTE peripheral.
//!
//! This module contains the building blocks for configuring and operating
//! one DMA-backed UART instance:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`uart`] - The [`Uart`] driver and its lifecycle
//! - [`io`] - Byte-at-a-time send and receive
//! - [`bulk`] - Caller-buffer transfer jobs
//! - [`interrupt`] - The interrupt dispatcher
//! - [`blocking`] - How blocking calls wait
//!
//! # Example
//!
//! ```ignore
//! use uarte_dma::driver::{Parity, PinSelect, UartConfig};
//!
//! let config = UartConfig::new()
//!     .with_baud_rate(9600)
//!     .with_parity(Parity::Even)
//!     .with_pins(PinSelect::data(6, 8));
//! ```

// Submodules
pub mod blocking;
pub mod bulk;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod io;
pub mod uart;

// Re-exports for convenience
pub use blocking::BlockingStrategy;
pub use config::{BaudRate, Parity, PinSelect, State, StopBits, UartConfig};
pub use error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};
pub use interrupt::InterruptStatus;
pub use uart::{Uart, UartDefault, UartLarge, UartSmall};
