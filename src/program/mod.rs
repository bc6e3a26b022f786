//! Program loading, snapshots and disassembly.
//!
//! This module provides:
//! - Raw binary image loading
//! - JSON machine snapshots
//! - A disassembler (memory → readable `subleq` triples)

pub mod disasm;
pub mod image;

pub use disasm::{disassemble, format_triple};
pub use image::{read_image, save_snapshot, load_snapshot, ImageError};
