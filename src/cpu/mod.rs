//! CPU emulation for the SUBLEQ machine.
//!
//! This module implements the complete datapath:
//! - 256 eight-bit memory cells, the last one mapped to the output port
//! - 5 registers: A, B, MAR, PC and the micro-state cursor
//! - One instruction (`subleq a, b, c`) executed over twelve clock phases

pub mod memory;
pub mod registers;
pub mod phase;
pub mod execute;

pub use memory::{Memory, MemoryError, LoadReport, MEMORY_SIZE, OUTPUT_PORT};
pub use registers::Registers;
pub use phase::{Phase, PhaseError};
pub use execute::{Cpu, CpuError, CpuState};
