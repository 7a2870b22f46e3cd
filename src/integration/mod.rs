//! External Stack Integrations
//!
//! - **embedded-io** (`embedded_io`): blocking `Read`/`Write`/`ReadReady`/
//!   `WriteReady` on a shared `&Uart`
//!   - Requires `embedded-io` feature
//!
//! # Example
//!
//! ```ignore
//! use embedded_io::Write;
//!
//! let mut port = &UART0;
//! port.write_all(b"AT\r\n")?;
//! port.flush()?;
//! ```

#[cfg(feature = "embedded-io")]
pub mod embedded_io;
