//! Synchronization and Concurrency Support
//!
//! The driver state is shared between caller tasks and the interrupt
//! dispatcher. All of it lives behind a [`CriticalSectionCell`], and every
//! entry point takes an [`IrqGuard`] for the span of its state access.
//!
//! # Example
//!
//! ```ignore
//! use uarte_dma::sync::{CriticalSectionCell, IrqGuard};
//!
//! static COUNTER: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
//!
//! fn bump() {
//!     COUNTER.with(|count| *count += 1);
//! }
//!
//! fn bump_twice() {
//!     let guard = IrqGuard::new();
//!     let mut count = COUNTER.lock(&guard);
//!     *count += 2;
//! }
//! ```

mod primitives;

pub use primitives::{CriticalSectionCell, IrqGuard};
