//! DMA-visible byte storage
//!
//! The EasyDMA engine reads and writes these bytes behind the compiler's
//! back, so the storage lives in an [`UnsafeCell`] and is only touched
//! through raw pointers. Software access always happens inside the driver's
//! critical section, at indices the DMA window does not currently cover.

use core::cell::UnsafeCell;

use super::ring::DmaDescriptor;
use crate::hal::DmaRegion;

/// Fixed-size buffer handed to the DMA engine.
#[repr(C, align(4))]
pub(crate) struct DmaBuffer<const N: usize> {
    bytes: UnsafeCell<[u8; N]>,
}

// SAFETY: software access is serialized by the driver's critical section and
// restricted to indices outside the active DMA window.
unsafe impl<const N: usize> Sync for DmaBuffer<N> {}

impl<const N: usize> DmaBuffer<N> {
    /// Zeroed buffer (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            bytes: UnsafeCell::new([0; N]),
        }
    }

    /// Read the byte at `index` (`index < N`).
    #[inline(always)]
    pub fn read(&self, index: usize) -> u8 {
        debug_assert!(index < N);
        // SAFETY: index is in bounds; volatile since DMA wrote it.
        unsafe { self.bytes.get().cast::<u8>().add(index).read_volatile() }
    }

    /// Write `byte` at `index` (`index < N`).
    #[inline(always)]
    pub fn write(&self, index: usize, byte: u8) {
        debug_assert!(index < N);
        // SAFETY: index is in bounds; volatile since DMA will read it.
        unsafe { self.bytes.get().cast::<u8>().add(index).write_volatile(byte) }
    }

    /// Hardware region for a DMA window.
    #[inline]
    pub fn region(&self, desc: DmaDescriptor) -> DmaRegion {
        debug_assert!(desc.offset + desc.len <= N);
        // SAFETY: the window lies inside the buffer, which outlives the
        // driver instance that programs it.
        unsafe { DmaRegion::from_raw(self.bytes.get().cast::<u8>().add(desc.offset), desc.len as u32) }
    }

    /// Region covering the whole buffer.
    #[inline]
    pub fn full_region(&self) -> DmaRegion {
        self.region(DmaDescriptor { offset: 0, len: N })
    }

    /// Zero-length region at the start of the buffer.
    #[inline]
    pub fn empty_region(&self) -> DmaRegion {
        self.region(DmaDescriptor { offset: 0, len: 0 })
    }
}

impl<const N: usize> Default for DmaBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
