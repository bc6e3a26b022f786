//! WebAssembly bindings for the SUBLEQ emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use crate::cpu::{Cpu, MEMORY_SIZE};
use crate::program::{format_triple, image};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<u8>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
        }
    }

    /// Load a raw program image. Returns the number of bytes dropped.
    #[wasm_bindgen]
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        self.program = bytes.to_vec();
        self.cpu = Cpu::new();
        self.cpu.load_image(bytes).dropped
    }

    /// Step one instruction. Returns the clock cycles spent.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<u32, JsError> {
        self.cpu.step_instruction()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Step one clock cycle. Returns the phase that was executed.
    #[wasm_bindgen]
    pub fn clock(&mut self) -> Result<String, JsError> {
        let phase = self.cpu.step_clock_cycle()
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(format!("{}", phase))
    }

    /// Run up to `max_instructions` instructions. Returns the clock count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_instructions: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(u64::from(max_instructions))
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.clock_count)
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.load_image(&self.program);
    }

    #[wasm_bindgen]
    pub fn is_faulted(&self) -> bool {
        self.cpu.is_faulted()
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.cpu.regs.pc
    }

    #[wasm_bindgen]
    pub fn a(&self) -> u8 {
        self.cpu.regs.a
    }

    #[wasm_bindgen]
    pub fn b(&self) -> u8 {
        self.cpu.regs.b
    }

    #[wasm_bindgen]
    pub fn mar(&self) -> u8 {
        self.cpu.regs.mar
    }

    /// Raw micro-state cursor.
    #[wasm_bindgen]
    pub fn phase(&self) -> u8 {
        self.cpu.regs.phase
    }

    #[wasm_bindgen]
    pub fn instruction_count(&self) -> u64 {
        self.cpu.instruction_count
    }

    #[wasm_bindgen]
    pub fn clock_count(&self) -> u64 {
        self.cpu.clock_count
    }

    /// Get memory cell value at index (0-255).
    #[wasm_bindgen]
    pub fn memory_at(&self, index: usize) -> Result<u8, JsError> {
        self.cpu.mem.read_checked(index)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Write a memory cell; a write to 255 is emitted as output.
    #[wasm_bindgen]
    pub fn set_memory(&mut self, index: usize, value: u8) -> Result<(), JsError> {
        self.cpu.mem.write_checked(index, value)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get all memory as a typed array.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Uint8Array {
        Uint8Array::from(&self.memory_bytes()[..])
    }

    /// Take everything written to the output port since the last call.
    #[wasm_bindgen]
    pub fn take_output(&mut self) -> Uint8Array {
        Uint8Array::from(&self.drain_output()[..])
    }

    /// Get the whole machine state as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        image::snapshot_to_string(&self.cpu)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Disassemble the instruction at the current PC.
    #[wasm_bindgen]
    pub fn current_instruction(&self) -> String {
        format_triple(self.cpu.operands_at(self.cpu.regs.pc))
    }
}

impl WasmCpu {
    fn memory_bytes(&self) -> Vec<u8> {
        self.cpu.mem.dump(0, MEMORY_SIZE).into_iter().map(|(_, v)| v).collect()
    }

    fn drain_output(&mut self) -> Vec<u8> {
        self.cpu.take_output()
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble a raw program image.
#[wasm_bindgen]
pub fn wasm_disassemble(bytes: &[u8]) -> String {
    crate::program::disassemble(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_array_sources() {
        let mut cpu = WasmCpu::new();
        assert_eq!(cpu.load(&[3, 255, 0, 191]), 0);
        assert!(cpu.step().is_ok());

        let memory = cpu.memory_bytes();
        assert_eq!(memory.len(), MEMORY_SIZE);
        assert_eq!(memory[255], 0x41);
        assert_eq!(cpu.drain_output(), vec![0x41]);
        assert!(cpu.drain_output().is_empty());
    }
}
