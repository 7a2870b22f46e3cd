//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//!
//! # Contents
//!
//! - [`constants`]: Defaults and limits
//! - [`ring`]: Ring cursors and DMA window computation
//! - [`buffer`]: DMA-visible byte storage
//! - [`job`]: Bulk transfer bookkeeping
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Types here are subject to
//! change without notice.

pub(crate) mod buffer;
pub(crate) mod constants;
pub(crate) mod job;
pub(crate) mod ring;
