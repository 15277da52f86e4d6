//! Flat 24-bit cell memory and its arithmetic.

/// 24-bit two's-complement arithmetic helpers.
pub mod arith;
/// Fixed address-space map and port sentinels.
pub mod map;

pub use arith::{sub_wrapped, to_signed24, MAX_WORD, MIN_WORD, SIGN_BIT, WORD_MASK, WORD_MODULUS};
pub use map::{
    decode_memory_region, MemoryRegion, ADDRESS_LIMIT, DEVICE_BASE, IDENTITY_TABLE_LEN,
    INTERRUPT_PORT, IO_PORT, MEMORY_CELLS, NO_KEY,
};

use crate::Fault;

/// The machine's address space: exactly [`MEMORY_CELLS`] signed cells.
///
/// Cells hold host-native `i32` values. Loaded images may contain values
/// outside the 24-bit range; only the subtract step folds results back into
/// `[MIN_WORD, MAX_WORD]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Box<[i32]>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("cells", &self.cells.len())
            .finish()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Allocates a zeroed address space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_CELLS].into_boxed_slice(),
        }
    }

    /// Builds memory from an image placed at address 0, then installs the
    /// identity table. Cells past [`MEMORY_CELLS`] are ignored.
    #[must_use]
    pub fn from_image(image: &[i32]) -> Self {
        let mut memory = Self::new();
        let len = image.len().min(MEMORY_CELLS);
        memory.cells[..len].copy_from_slice(&image[..len]);
        memory.install_identity_table();
        memory
    }

    /// Writes `mem[DEVICE_BASE + i] = i` for every byte value `i`.
    #[allow(clippy::cast_sign_loss)]
    pub fn install_identity_table(&mut self) {
        let base = DEVICE_BASE as usize;
        for (offset, cell) in self.cells[base..base + IDENTITY_TABLE_LEN]
            .iter_mut()
            .enumerate()
        {
            *cell = i32::from(u8::try_from(offset).unwrap_or(u8::MAX));
        }
    }

    /// Number of cells (always [`MEMORY_CELLS`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read-only view of every cell.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Reads the cell at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::AddressOutOfRange`] when `addr` is outside `[0, 2^24)`.
    pub fn read(&self, addr: i32) -> Result<i32, Fault> {
        Ok(self.cells[index(addr)?])
    }

    /// Writes the cell at `addr`, including device-region cells.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::AddressOutOfRange`] when `addr` is outside `[0, 2^24)`.
    pub fn write(&mut self, addr: i32, value: i32) -> Result<(), Fault> {
        self.cells[index(addr)?] = value;
        Ok(())
    }

    /// Writes the cell at `addr` unless `protect` is set and `addr` lies in
    /// the device region. Returns whether the store happened.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::AddressOutOfRange`] when `addr` is outside `[0, 2^24)`.
    pub fn write_guarded(&mut self, addr: i32, value: i32, protect: bool) -> Result<bool, Fault> {
        let slot = index(addr)?;
        if protect && matches!(decode_memory_region(addr), Some(MemoryRegion::Device)) {
            return Ok(false);
        }
        self.cells[slot] = value;
        Ok(true)
    }
}

fn index(addr: i32) -> Result<usize, Fault> {
    usize::try_from(addr)
        .ok()
        .filter(|slot| *slot < MEMORY_CELLS)
        .ok_or(Fault::AddressOutOfRange { addr })
}
