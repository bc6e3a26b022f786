//! SUBLEQ memory subsystem.
//!
//! 256 byte-wide cells. The last cell doubles as a memory-mapped output
//! port: every store to it also emits the byte to the output stream.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The number of memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Address of the memory-mapped output port (the last cell).
pub const OUTPUT_PORT: u8 = (MEMORY_SIZE - 1) as u8;

/// SUBLEQ memory: 256 eight-bit cells plus the pending output stream.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    #[serde(deserialize_with = "deserialize_cells")]
    cells: Vec<u8>,
    /// Bytes emitted through the output port and not yet taken by the host.
    #[serde(skip)]
    output: Vec<u8>,
}

/// Outcome of copying a program image into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Bytes copied into memory, starting at address 0.
    pub loaded: usize,
    /// Bytes past the end of memory that were discarded.
    pub dropped: usize,
}

impl LoadReport {
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
            output: Vec::new(),
        }
    }

    /// Read a cell. Every `u8` is a valid address.
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[usize::from(addr)]
    }

    /// Store a cell. A store to [`OUTPUT_PORT`] also emits `value` once.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[usize::from(addr)] = value;
        if addr == OUTPUT_PORT {
            tracing::debug!(byte = value, "output port write");
            self.output.push(value);
        }
    }

    /// Read using an externally supplied address.
    pub fn read_checked(&self, addr: usize) -> Result<u8, MemoryError> {
        Ok(self.read(Self::to_addr(addr)?))
    }

    /// Write using an externally supplied address.
    pub fn write_checked(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        self.write(Self::to_addr(addr)?, value);
        Ok(())
    }

    fn to_addr(addr: usize) -> Result<u8, MemoryError> {
        u8::try_from(addr).map_err(|_| MemoryError::AddressOutOfRange(addr))
    }

    /// Clear all memory to zeros.
    ///
    /// Output already emitted stays pending; it belongs to the host.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy `image` into the low addresses, truncating at capacity.
    ///
    /// Cells past the image are left untouched.
    pub fn load_image(&mut self, image: &[u8]) -> LoadReport {
        let loaded = image.len().min(MEMORY_SIZE);
        self.cells[..loaded].copy_from_slice(&image[..loaded]);
        LoadReport {
            loaded,
            dropped: image.len() - loaded,
        }
    }

    /// Take every byte emitted through the output port since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Bytes emitted but not yet taken.
    pub fn pending_output(&self) -> &[u8] {
        &self.output
    }

    /// The raw cell contents, address 0 first.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let start = start.min(MEMORY_SIZE);
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start..end).map(|i| (i, self.cells[i])).collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .field("pending_output", &self.output.len())
            .finish()
    }
}

fn deserialize_cells<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let cells = Vec::<u8>::deserialize(deserializer)?;
    if cells.len() != MEMORY_SIZE {
        return Err(serde::de::Error::invalid_length(
            cells.len(),
            &"exactly 256 memory cells",
        ));
    }
    Ok(cells)
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {0} out of range (0 to 255)")]
    AddressOutOfRange(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(10, 42);
        assert_eq!(mem.read(10), 42);
        assert!(mem.pending_output().is_empty());
    }

    #[test]
    fn test_output_port_emits_once_per_write() {
        let mut mem = Memory::new();
        mem.write(OUTPUT_PORT, b'A');
        assert_eq!(mem.read(OUTPUT_PORT), 65);
        assert_eq!(mem.take_output(), vec![65]);

        mem.write(OUTPUT_PORT, b'h');
        mem.write(OUTPUT_PORT, b'h');
        mem.write(254, b'x');
        assert_eq!(mem.take_output(), b"hh".to_vec());
        assert!(mem.take_output().is_empty());
    }

    #[test]
    fn test_checked_bounds() {
        let mut mem = Memory::new();
        assert!(mem.read_checked(0).is_ok());
        assert!(mem.read_checked(255).is_ok());
        assert_eq!(mem.read_checked(256), Err(MemoryError::AddressOutOfRange(256)));
        assert_eq!(
            mem.write_checked(1000, 1),
            Err(MemoryError::AddressOutOfRange(1000))
        );

        mem.write_checked(255, 7).unwrap();
        assert_eq!(mem.take_output(), vec![7]);
    }

    #[test]
    fn test_load_image() {
        let mut mem = Memory::new();
        let report = mem.load_image(&[3, 3, 6]);

        assert_eq!(report, LoadReport { loaded: 3, dropped: 0 });
        assert!(!report.is_truncated());
        assert_eq!(mem.dump(0, 4), vec![(0, 3), (1, 3), (2, 6), (3, 0)]);
    }

    #[test]
    fn test_load_image_truncates() {
        let mut mem = Memory::new();
        let image: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let report = mem.load_image(&image);

        assert_eq!(report, LoadReport { loaded: 256, dropped: 44 });
        assert_eq!(mem.as_slice(), &image[..256]);
        assert!(mem.pending_output().is_empty());
    }

    #[test]
    fn test_clear_keeps_pending_output() {
        let mut mem = Memory::new();
        mem.load_image(&[1, 2, 3]);
        mem.write(OUTPUT_PORT, 9);
        mem.clear();

        assert!(mem.as_slice().iter().all(|&c| c == 0));
        assert_eq!(mem.pending_output(), &[9]);
    }

    #[test]
    fn test_deserialize_rejects_wrong_size() {
        let json = r#"{"cells":[1,2,3]}"#;
        assert!(serde_json::from_str::<Memory>(json).is_err());
    }
}
