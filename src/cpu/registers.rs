//! SUBLEQ CPU registers.
//!
//! The datapath has five registers, all eight bits wide:
//! - A: subtrahend, the value at the first operand address
//! - B: minuend, the value at the second operand address
//! - MAR: memory-address register, scratch for indirect addressing
//! - PC: program counter
//! - phase: micro-state cursor into the twelve-phase cycle
//!
//! The program counter wraps modulo 256 on every increment, so it is always a
//! valid memory address.

use crate::cpu::phase::{Phase, PhaseError};
use serde::{Deserialize, Serialize};

/// The SUBLEQ register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// A: operand loaded through the first address cell
    pub a: u8,

    /// B: operand loaded through the second address cell
    pub b: u8,

    /// MAR: memory-address register
    pub mar: u8,

    /// PC: program counter
    pub pc: u8,

    /// Raw micro-state cursor. Kept as a raw ordinal so a corrupted value is
    /// representable and caught by the clock instead of at construction.
    pub phase: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decode the micro-state cursor.
    pub fn phase(&self) -> Result<Phase, PhaseError> {
        Phase::try_from(self.phase)
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase.ordinal();
    }

    /// True when no instruction is in flight.
    pub fn at_instruction_boundary(&self) -> bool {
        self.phase == Phase::INITIAL.ordinal()
    }

    /// Increment the program counter by 1, wrapping at 256.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u8 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr;
    }

    /// The branch condition: the signed difference of the operands, taken
    /// before the 8-bit store wraps it, is zero or negative.
    pub fn branch_condition(&self) -> bool {
        i16::from(self.b) - i16::from(self.a) <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        regs.pc = 10;
        assert_eq!(regs.advance_pc(), 10);
        assert_eq!(regs.pc, 11);

        regs.pc = 255;
        assert_eq!(regs.advance_pc(), 255);
        assert_eq!(regs.pc, 0);
    }

    #[test]
    fn test_branch_condition_uses_unwrapped_difference() {
        let mut regs = Registers::new();

        regs.a = 5;
        regs.b = 5;
        assert!(regs.branch_condition());

        // 3 - 200 wraps to 59 when stored, but the comparison sees -197.
        regs.a = 200;
        regs.b = 3;
        assert!(regs.branch_condition());

        regs.a = 3;
        regs.b = 200;
        assert!(!regs.branch_condition());
    }

    #[test]
    fn test_phase_decoding() {
        let mut regs = Registers::new();
        assert!(regs.at_instruction_boundary());
        assert_eq!(regs.phase(), Ok(Phase::PcToBusA));

        regs.set_phase(Phase::Branch);
        assert_eq!(regs.phase, 11);
        assert!(!regs.at_instruction_boundary());

        regs.phase = 12;
        assert_eq!(regs.phase(), Err(PhaseError(12)));

        regs.reset();
        assert_eq!(regs, Registers::default());
    }
}
