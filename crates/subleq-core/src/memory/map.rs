//! Fixed address-space map: program memory, device table, and port sentinels.

/// Number of cells in the flat address space (`2^24`).
pub const MEMORY_CELLS: usize = 1 << 24;

/// First address outside the address space.
pub const ADDRESS_LIMIT: i32 = 0x0100_0000;

/// Sentinel operand for console write (`b`), keyboard read (`a`) and halt (`c`).
pub const IO_PORT: i32 = 0x00FF_FFFF;

/// Sentinel operand `a` that reads and clears the interrupt-requested flag.
pub const INTERRUPT_PORT: i32 = 0x00FF_FFFE;

/// Value stored by a keyboard read when no byte is buffered.
pub const NO_KEY: i32 = IO_PORT;

/// Inclusive start of the read-only device region.
pub const DEVICE_BASE: i32 = 0x0060_0000;

/// Number of entries in the identity lookup table at [`DEVICE_BASE`].
pub const IDENTITY_TABLE_LEN: usize = 256;

/// Region classification for addresses inside the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Writable program and data memory (`0x000000..0x600000`).
    Program,
    /// Read-only device and identity-table memory (`0x600000..0x1000000`).
    Device,
}

/// Classifies `addr`, returning `None` outside the address space.
#[must_use]
pub const fn decode_memory_region(addr: i32) -> Option<MemoryRegion> {
    if addr < 0 || addr >= ADDRESS_LIMIT {
        None
    } else if addr < DEVICE_BASE {
        Some(MemoryRegion::Program)
    } else {
        Some(MemoryRegion::Device)
    }
}
