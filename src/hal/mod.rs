//! Collaborator interfaces
//!
//! The driver core is hardware- and scheduler-agnostic. It needs:
//!
//! - [`UarteDma`]: register-level access to one DMA-capable UART
//! - [`Scheduler`]: task identification and suspend/wake primitives
//!
//! Both are implemented by the platform crate.

pub mod scheduler;
pub mod uarte;

pub use scheduler::{BareMetal, Scheduler};
pub use uarte::{DRIVER_INTERRUPTS, DmaRegion, ErrorSource, Event, LineConfig, Trigger, UarteDma};
