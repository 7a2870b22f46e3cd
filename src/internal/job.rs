//! Bulk transfer bookkeeping
//!
//! A job borrows a caller buffer for the duration of one blocking
//! `submit_*_job` call. The buffer is stored as a raw pointer because the
//! interrupt dispatcher fills or drains it while the caller is parked; the
//! submitting call never returns while its job is still [`Job::Active`].

/// Caller buffer attached to an active job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transfer {
    ptr: *mut u8,
    len: usize,
    done: usize,
}

impl Transfer {
    /// True once every byte has been moved
    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.done == self.len
    }

    /// Bytes moved so far
    #[inline(always)]
    pub fn transferred(&self) -> usize {
        self.done
    }

    /// Take the next byte of a TX job.
    #[inline]
    pub fn next_out(&mut self) -> Option<u8> {
        if self.is_complete() {
            return None;
        }
        // SAFETY: `done < len` and the submitting call keeps the buffer alive
        // while the job is active.
        let byte = unsafe { self.ptr.add(self.done).read() };
        self.done += 1;
        Some(byte)
    }

    /// Store the next byte of an RX job. Returns false if the job is full.
    #[inline]
    pub fn push_in(&mut self, byte: u8) -> bool {
        if self.is_complete() {
            return false;
        }
        // SAFETY: `done < len` and the submitting call holds the only
        // mutable borrow of the buffer while the job is active.
        unsafe { self.ptr.add(self.done).write(byte) };
        self.done += 1;
        true
    }
}

/// Progress of the job slot of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Job {
    /// No job
    #[default]
    Idle,
    /// Bytes are being moved between the ring and the caller buffer
    Active(Transfer),
    /// Finished with the given byte count, not yet collected by the caller
    Complete(usize),
    /// Cancelled by abort or deinit
    Aborted,
}

// SAFETY: the raw pointer is only dereferenced inside the driver's critical
// section while the submitting call keeps the buffer borrowed.
unsafe impl Send for Job {}

impl Job {
    /// Start a TX job reading from `data`.
    pub fn transmit(data: &[u8]) -> Self {
        Job::Active(Transfer {
            ptr: data.as_ptr().cast_mut(),
            len: data.len(),
            done: 0,
        })
    }

    /// Start an RX job writing into `buf`.
    pub fn receive(buf: &mut [u8]) -> Self {
        Job::Active(Transfer {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            done: 0,
        })
    }

    /// True while the dispatcher may touch the caller buffer
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        matches!(self, Job::Active(_))
    }

    /// Active transfer, if any
    #[inline(always)]
    pub fn transfer(&mut self) -> Option<&mut Transfer> {
        match self {
            Job::Active(transfer) => Some(transfer),
            _ => None,
        }
    }

    /// Close an active job with however many bytes it has moved.
    pub fn finish(&mut self) {
        if let Job::Active(transfer) = self {
            *self = Job::Complete(transfer.transferred());
        }
    }

    /// Cancel an active job. Returns true if one was active.
    pub fn abort(&mut self) -> bool {
        if self.is_active() {
            *self = Job::Aborted;
            true
        } else {
            false
        }
    }

    /// Collect the outcome of a finished job and free the slot.
    ///
    /// Returns `None` while the job is still active.
    pub fn collect(&mut self) -> Option<Result<usize, ()>> {
        let outcome = match *self {
            Job::Active(_) => return None,
            Job::Complete(n) => Ok(n),
            Job::Aborted => Err(()),
            Job::Idle => Ok(0),
        };
        *self = Job::Idle;
        Some(outcome)
    }
}
