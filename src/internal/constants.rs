//! Driver constants

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Baud rate applied when the configuration requests 0
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default interrupt priority
pub const DEFAULT_INTERRUPT_PRIORITY: u8 = 1;

/// Highest priority value the interrupt controller accepts (3 priority bits)
pub const MAX_INTERRUPT_PRIORITY: u8 = 7;

/// Highest GPIO number (P1.15)
pub const MAX_PIN: u8 = 47;

// =============================================================================
// Buffer Sizing
// =============================================================================

/// Default ring buffer size per direction
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Largest ring buffer the 16-bit MAXCNT field can cover in one DMA
pub const MAX_BUFFER_SIZE: usize = 1 << 15;
