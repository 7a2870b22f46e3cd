//! Ring buffer cursors and DMA window computation.
//!
//! Each direction keeps three free-running `u32` cursors. They never wrap
//! back to a buffer index on their own: the index of a cursor is always
//! `cursor & MASK`, and fill levels are unsigned wrapping differences.
//!
//! | Cursor     | RX writer                     | TX writer                     |
//! |------------|-------------------------------|-------------------------------|
//! | `consumer` | caller / dispatcher job drain | dispatcher (byte sent)        |
//! | `producer` | dispatcher (byte received)    | caller / dispatcher job fill  |
//! | `snapshot` | DMA restart                   | DMA restart                   |
//!
//! `snapshot` is the DMA-side cursor as of the last restart: the producer for
//! RX, the consumer for TX. Adding the hardware `AMOUNT` of the completed
//! transfer to it yields the exact position after that transfer, which
//! resynchronises the per-event `+1` bookkeeping.

/// A `{offset, length}` window into a ring buffer for one DMA operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DmaDescriptor {
    /// Byte offset into the buffer
    pub offset: usize,
    /// Window length, never crossing the physical end of the buffer
    pub len: usize,
}

/// Cursors for one direction of a ring buffer of `N` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Ring<const N: usize> {
    /// Bytes consumed (RX: read by software, TX: sent by hardware)
    pub consumer: u32,
    /// Bytes produced (RX: received by hardware, TX: queued by software)
    pub producer: u32,
    /// DMA-side cursor captured at the last DMA restart
    pub snapshot: u32,
}

impl<const N: usize> Ring<N> {
    /// Index mask shared by both directions
    pub const MASK: u32 = (N as u32).wrapping_sub(1);

    /// Buffer size in bytes
    pub const SIZE: u32 = N as u32;

    /// Compile-time check on the buffer size
    const VALID: () = assert!(
        N.is_power_of_two() && N >= 2 && N <= crate::internal::constants::MAX_BUFFER_SIZE,
        "ring buffer size must be a power of two between 2 and 32768"
    );

    /// Empty cursors
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::VALID;
        Self {
            consumer: 0,
            producer: 0,
            snapshot: 0,
        }
    }

    /// Zero all cursors
    #[inline(always)]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Unconsumed bytes
    #[inline(always)]
    pub fn pending(&self) -> u32 {
        self.producer.wrapping_sub(self.consumer)
    }

    /// True when no byte can be produced without overwriting
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.pending() > Self::MASK
    }

    /// True when nothing is pending
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.producer == self.consumer
    }

    /// Buffer index of the consumer cursor
    #[inline(always)]
    pub fn consumer_index(&self) -> usize {
        (self.consumer & Self::MASK) as usize
    }

    /// Buffer index of the producer cursor
    #[inline(always)]
    pub fn producer_index(&self) -> usize {
        (self.producer & Self::MASK) as usize
    }

    /// Record one byte reported by the receiver.
    ///
    /// Keeps the backlog within the buffer: once a full ring receives over
    /// its oldest unread slot, that byte is dropped by moving the consumer.
    #[inline]
    pub fn produce_rx_byte(&mut self) {
        self.producer = self.producer.wrapping_add(1);
        self.drop_oldest_overflow();
    }

    /// Account for a completed RX DMA and compute the next RX window.
    ///
    /// `amount` is what the finished transfer moved into the buffer. If the
    /// unread backlog now exceeds the buffer, the consumer is advanced so
    /// that exactly `N` of the newest bytes remain: the oldest bytes are
    /// dropped, nothing is moved.
    ///
    /// A full ring still gets a one-byte window over its oldest unread slot,
    /// so the receiver keeps running and later bytes displace older ones.
    pub fn next_rx_window(&mut self, amount: u32) -> DmaDescriptor {
        self.snapshot = self.snapshot.wrapping_add(amount);
        self.producer = self.snapshot;
        self.drop_oldest_overflow();

        let index = self.producer & Self::MASK;
        let free = Self::SIZE.wrapping_add(self.consumer).wrapping_sub(self.producer);
        let mut count = free.max(1);

        if index + count > Self::SIZE {
            // The free space wraps; the remainder needs another DMA request.
            count = Self::SIZE - index;
        }

        DmaDescriptor {
            offset: index as usize,
            len: count as usize,
        }
    }

    #[inline(always)]
    fn drop_oldest_overflow(&mut self) {
        if self.pending() > Self::MASK {
            self.consumer = self.producer.wrapping_sub(Self::SIZE);
        }
    }

    /// Account for a completed TX DMA and compute the next TX window.
    ///
    /// `amount` is what the finished transfer sent. The returned window may
    /// be empty when nothing is queued.
    pub fn next_tx_window(&mut self, amount: u32) -> DmaDescriptor {
        self.snapshot = self.snapshot.wrapping_add(amount);
        self.consumer = self.snapshot;

        let index = self.consumer & Self::MASK;
        let mut count = self.pending();

        if index + count > Self::SIZE {
            // Queued bytes wrap; the remainder needs another DMA request.
            count = Self::SIZE - index;
        }

        DmaDescriptor {
            offset: index as usize,
            len: count as usize,
        }
    }

    /// True if bytes are queued beyond the TX transfer that just finished
    #[inline(always)]
    pub fn tx_pending_after(&self, amount: u32) -> bool {
        self.producer != self.snapshot.wrapping_add(amount)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::buffer::DmaBuffer;

    #[test]
    fn mask_and_size() {
        assert_eq!(Ring::<16>::MASK, 15);
        assert_eq!(Ring::<16>::SIZE, 16);
        assert_eq!(Ring::<2>::MASK, 1);
    }

    #[test]
    fn pending_full_empty() {
        let mut ring = Ring::<4>::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());

        ring.producer = 4;
        assert_eq!(ring.pending(), 4);
        assert!(ring.is_full());

        ring.consumer = 1;
        assert!(!ring.is_full());
        assert!(!ring.is_empty());
    }

    #[test]
    fn pending_survives_u32_wraparound() {
        let mut ring = Ring::<8>::new();
        ring.consumer = u32::MAX - 2;
        ring.producer = 3;
        assert_eq!(ring.pending(), 6);
        assert_eq!(ring.consumer_index(), ((u32::MAX - 2) & 7) as usize);
        assert!(!ring.is_full());
    }

    #[test]
    fn rx_window_initial_transfer_covers_whole_buffer() {
        let mut ring = Ring::<16>::new();
        ring.consumer = 16;
        ring.producer = 16;
        ring.snapshot = 16;

        let desc = ring.next_rx_window(0);
        assert_eq!(desc, DmaDescriptor { offset: 0, len: 16 });
    }

    #[test]
    fn rx_window_truncated_at_buffer_end() {
        let mut ring = Ring::<16>::new();
        // 10 received, 6 read: 12 bytes free starting at index 10
        let desc = ring.next_rx_window(10);
        ring.consumer = 6;
        assert_eq!(desc, DmaDescriptor { offset: 10, len: 6 });

        let desc = ring.next_rx_window(0);
        assert_eq!(desc.offset, 10);
        assert_eq!(desc.len, 6);

        // After those 6 land, the rest of the free space starts at 0
        let desc = ring.next_rx_window(6);
        assert_eq!(desc, DmaDescriptor { offset: 0, len: 6 });
        assert_eq!(ring.producer, 16);
    }

    #[test]
    fn rx_window_full_ring_receives_over_oldest_slot() {
        let mut ring = Ring::<8>::new();
        let desc = ring.next_rx_window(8);
        assert_eq!(desc, DmaDescriptor { offset: 0, len: 1 });
        assert_eq!(ring.pending(), 8);
        assert_eq!(ring.consumer, 0);
    }

    #[test]
    fn rx_overflow_keeps_newest_size_bytes() {
        let mut ring = Ring::<8>::new();
        let desc = ring.next_rx_window(10);

        assert_eq!(desc, DmaDescriptor { offset: 2, len: 1 });
        assert_eq!(ring.pending(), 8);
        assert_eq!(ring.producer, 10);
        // bytes 3..=10 (1-based) remain
        assert_eq!(ring.consumer, 2);
    }

    #[test]
    fn rx_overflow_then_one_read_opens_one_byte() {
        let mut ring = Ring::<4>::new();
        ring.next_rx_window(6);
        ring.consumer = ring.consumer.wrapping_add(1);

        let desc = ring.next_rx_window(0);
        assert_eq!(desc.len, 1);
        assert_eq!(desc.offset, (6 & 3) as usize);
    }

    #[test]
    fn tx_window_truncated_at_buffer_end() {
        let mut ring = Ring::<16>::new();
        ring.snapshot = 10;
        ring.consumer = 10;
        ring.producer = 22;

        let desc = ring.next_tx_window(0);
        assert_eq!(desc, DmaDescriptor { offset: 10, len: 6 });

        // Second request after the first 6 bytes went out
        let desc = ring.next_tx_window(6);
        assert_eq!(desc, DmaDescriptor { offset: 0, len: 6 });
        assert_eq!(ring.consumer, 16);
    }

    #[test]
    fn tx_window_resyncs_consumer_from_snapshot() {
        let mut ring = Ring::<8>::new();
        ring.producer = 5;
        // TXDRDY accounting saw only 2 of the 3 bytes the DMA sent
        ring.consumer = 2;

        let desc = ring.next_tx_window(3);
        assert_eq!(ring.consumer, 3);
        assert_eq!(desc, DmaDescriptor { offset: 3, len: 2 });
    }

    #[test]
    fn tx_window_empty_when_nothing_queued() {
        let mut ring = Ring::<8>::new();
        ring.producer = 4;
        let desc = ring.next_tx_window(4);
        assert_eq!(desc.len, 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn tx_pending_after_transfer() {
        let mut ring = Ring::<8>::new();
        ring.producer = 4;
        assert!(ring.tx_pending_after(3));
        assert!(!ring.tx_pending_after(4));
    }

    #[test]
    fn per_byte_overflow_drops_oldest() {
        let mut ring = Ring::<4>::new();
        for _ in 0..6 {
            ring.produce_rx_byte();
            assert!(ring.pending() <= 4);
        }
        assert_eq!(ring.consumer, 2);
        assert_eq!(ring.producer, 6);
    }

    #[test]
    fn capacity_invariant_across_rx_windows() {
        let mut ring = Ring::<8>::new();
        let mut window = ring.next_rx_window(0);

        for step in 0..50u32 {
            // DMA fills the whole window, reader catches up every third step
            window = ring.next_rx_window(window.len as u32);
            assert!(ring.pending() <= 8);
            assert!(window.len >= 1);
            assert!(window.offset + window.len <= 8);
            if step % 3 == 0 {
                ring.consumer = ring.producer;
                window = ring.next_rx_window(0);
            }
        }
    }

    #[test]
    fn overflow_scenario_returns_newest_bytes() {
        let buf = DmaBuffer::<4>::new();
        let mut ring = Ring::<4>::new();
        let read = |ring: &mut Ring<4>| {
            let byte = buf.read(ring.consumer_index());
            ring.consumer = ring.consumer.wrapping_add(1);
            byte
        };

        for byte in *b"abc" {
            buf.write(ring.producer_index(), byte);
            ring.produce_rx_byte();
        }
        assert_eq!(read(&mut ring), b'a');
        assert_eq!(ring.consumer, 1);

        // One DMA completion moves d, e, f from the snapshot (0) onwards
        for (i, byte) in b"def".iter().enumerate() {
            buf.write((3 + i) & 3, *byte);
        }
        ring.next_rx_window(6);
        assert_eq!(ring.producer, 6);
        assert_eq!(ring.consumer, 2);

        assert_eq!(read(&mut ring), b'c');
        assert_eq!(read(&mut ring), b'd');
        assert_eq!(read(&mut ring), b'e');
    }
}
