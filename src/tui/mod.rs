//! TUI debugger for the SUBLEQ emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and micro-state visualization
//! - Memory view highlighting PC and MAR
//! - Instruction step, clock step, run and breakpoint controls
//! - Output port pane

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
