//! `embedded-io` integration.
//!
//! The traits take `&mut self`, so they are implemented for `&Uart`: any
//! number of handles to one static instance can exist, and the driver's own
//! rules (one job per direction) still apply.
//!
//! - `write` submits a TX job for the whole buffer.
//! - `read` blocks for the first byte, then takes whatever else is already
//!   buffered without waiting.

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write, WriteReady};

use crate::driver::error::{Error, IoError};
use crate::driver::uart::Uart;
use crate::hal::{Scheduler, UarteDma};

impl embedded_io::Error for IoError {
    fn kind(&self) -> ErrorKind {
        match self {
            IoError::NotInitialized => ErrorKind::NotConnected,
            IoError::Aborted => ErrorKind::Interrupted,
            IoError::JobInProgress => ErrorKind::Other,
        }
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::InvalidInput,
            Error::Io(e) => e.kind(),
        }
    }
}

impl<H: UarteDma, S: Scheduler, const N: usize> ErrorType for &Uart<H, S, N> {
    type Error = IoError;
}

impl<H: UarteDma, S: Scheduler, const N: usize> Read for &Uart<H, S, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };

        *first = self.recv_byte()?;
        let mut count = 1;
        for slot in rest {
            if self.rx_pending() == 0 {
                break;
            }
            *slot = self.recv_byte()?;
            count += 1;
        }
        Ok(count)
    }
}

impl<H: UarteDma, S: Scheduler, const N: usize> ReadReady for &Uart<H, S, N> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.rx_pending() > 0)
    }
}

impl<H: UarteDma, S: Scheduler, const N: usize> Write for &Uart<H, S, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.submit_tx_job(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Uart::flush(self)
    }
}

impl<H: UarteDma, S: Scheduler, const N: usize> WriteReady for &Uart<H, S, N> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.tx_pending() < N)
    }
}
