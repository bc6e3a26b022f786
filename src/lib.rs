//! # SUBLEQ Emulator
//!
//! A cycle-accurate emulator of an 8-bit SUBLEQ one-instruction computer.
//!
//! Every instruction is `subleq a, b, c`: subtract `mem[a]` from `mem[b]`,
//! store the result in `mem[b]`, and jump to `c` if the result is zero or
//! negative. The emulator models the datapath one clock cycle at a time,
//! including the two-cycle latency of every memory read, so programs can be
//! single-stepped at bus-transfer granularity.

pub mod cpu;
pub mod program;
pub mod shell;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, MemoryError, Registers, Phase, LoadReport};
pub use program::{disassemble, read_image, save_snapshot, load_snapshot, ImageError};
pub use shell::Shell;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
