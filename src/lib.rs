//! UARTE DMA Driver
//!
//! A `no_std`, `no_alloc` full-duplex UART driver for EasyDMA-style UARTE
//! peripherals (nRF52-class): every byte moves through RAM by DMA, and the
//! driver keeps a ring buffer per direction that software fills and drains
//! independently of the hardware.
//!
//! # Architecture
//!
//! The driver is organized into three layers:
//!
//! 1. **Driver Layer** ([`driver`]): the [`Uart`] instance with its
//!    lifecycle, byte API, bulk jobs and interrupt dispatcher
//! 2. **HAL Layer** ([`hal`]): the [`UarteDma`](hal::UarteDma) peripheral
//!    trait and the [`Scheduler`](hal::Scheduler) trait the platform provides
//! 3. **Sync Layer** ([`sync`]): the nested critical section guarding all
//!    state shared with the interrupt handler
//!
//! ## Data Flow
//!
//! - RX: the hardware writes into the RX ring through a DMA window; the
//!   interrupt dispatcher advances the producer cursor per received byte and
//!   restarts the window when it fills. Callers take bytes with
//!   [`Uart::recv_byte`] or lend a buffer with [`Uart::submit_rx_job`].
//! - TX: callers queue bytes with [`Uart::send_byte`] or
//!   [`Uart::submit_tx_job`]; the dispatcher retires sent bytes and restarts
//!   TX DMA while bytes remain.
//!
//! When the RX ring overflows, the oldest unread bytes are dropped and the
//! newest kept. This is not reported as an error.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and driver logging
//! - `embedded-io`: Implement `embedded_io` traits for `&Uart`
//!
//! # Example
//!
//! ```ignore
//! use uarte_dma::{BareMetal, PinSelect, UartConfig, uart_static};
//!
//! uart_static!(UART0: Uarte0 = Uarte0::new(), BareMetal = BareMetal);
//!
//! fn main() -> ! {
//!     UART0
//!         .init(UartConfig::new().with_pins(PinSelect::data(6, 8)))
//!         .unwrap();
//!
//!     loop {
//!         let byte = UART0.recv_byte().unwrap();
//!         UART0.send_byte(byte).unwrap();
//!     }
//! }
//!
//! #[interrupt]
//! fn UARTE0_UART0() {
//!     UART0.on_interrupt();
//! }
//! ```
//!
//! # Memory Requirements
//!
//! Two rings of `N` bytes each (default 256), inline in the [`Uart`]
//! instance. The instance must live in DMA-reachable RAM.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "embedded-io")]
pub mod integration;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::blocking::BlockingStrategy;
pub use driver::config::{BaudRate, Parity, PinSelect, State, StopBits, UartConfig};
pub use driver::error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};
pub use driver::interrupt::InterruptStatus;
pub use driver::uart::{Uart, UartDefault, UartLarge, UartSmall};
pub use hal::{BareMetal, DmaRegion, ErrorSource, Event, LineConfig, Scheduler, Trigger, UarteDma};

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        // Defaults
        DEFAULT_BAUD_RATE,
        DEFAULT_BUFFER_SIZE,
        DEFAULT_INTERRUPT_PRIORITY,
        // Limits
        MAX_BUFFER_SIZE,
        MAX_INTERRUPT_PRIORITY,
        MAX_PIN,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static UART instance.
///
/// The ring buffers live inside the instance, so the static is also the DMA
/// memory. The buffer size defaults to
/// [`DEFAULT_BUFFER_SIZE`](crate::constants::DEFAULT_BUFFER_SIZE).
///
/// # Examples
///
/// ```ignore
/// uarte_dma::uart_static!(UART0: Uarte0 = Uarte0::new(), BareMetal = BareMetal);
/// uarte_dma::uart_static!(UART1: Uarte1 = Uarte1::new(), RtosScheduler = RtosScheduler, 1024);
///
/// UART0.init(UartConfig::new())?;
/// ```
#[macro_export]
macro_rules! uart_static {
    ($name:ident: $hw:ty = $hw_init:expr, $sched:ty = $sched_init:expr) => {
        $crate::uart_static!(
            $name: $hw = $hw_init,
            $sched = $sched_init,
            $crate::constants::DEFAULT_BUFFER_SIZE
        );
    };
    ($name:ident: $hw:ty = $hw_init:expr, $sched:ty = $sched_init:expr, $size:expr) => {
        static $name: $crate::Uart<$hw, $sched, { $size }> = $crate::Uart::new($hw_init, $sched_init);
    };
}
