//! Micro-state decoding.
//!
//! One SUBLEQ instruction takes twelve clock cycles. A memory read is two
//! of them: one to drive the address bus, one to latch the data. The
//! instruction's three operand cells are consumed by phases 0-3, 4-7 and
//! 9-10; phase 8 stores the difference and phase 11 decides the branch.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the twelve clock phases of the datapath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// Drive `pc` onto the address bus (operand A address cell).
    PcToBusA = 0,
    /// Latch `memory[pc]` into `mar`.
    BusToMarA = 1,
    /// Drive `mar` onto the address bus.
    MarToBusA = 2,
    /// Latch `memory[mar]` into `a`, advance `pc`.
    BusToA = 3,
    /// Drive `pc` onto the address bus (operand B address cell).
    PcToBusB = 4,
    /// Latch `memory[pc]` into `mar`.
    BusToMarB = 5,
    /// Drive `mar` onto the address bus.
    MarToBusB = 6,
    /// Latch `memory[mar]` into `b`, advance `pc`.
    BusToB = 7,
    /// Store `b - a` at `memory[mar]`.
    SubtractStore = 8,
    /// Drive `pc` onto the address bus (branch target cell).
    PcToBusC = 9,
    /// Latch `memory[pc]` into `mar`.
    BusToMarC = 10,
    /// Jump to `mar` if `b - a <= 0`, otherwise advance `pc`. Retires the instruction.
    Branch = 11,
}

impl Phase {
    /// Number of phases in one instruction.
    pub const COUNT: u8 = 12;

    /// The phase every instruction starts in.
    pub const INITIAL: Phase = Phase::PcToBusA;

    pub const ALL: [Phase; 12] = [
        Phase::PcToBusA,
        Phase::BusToMarA,
        Phase::MarToBusA,
        Phase::BusToA,
        Phase::PcToBusB,
        Phase::BusToMarB,
        Phase::MarToBusB,
        Phase::BusToB,
        Phase::SubtractStore,
        Phase::PcToBusC,
        Phase::BusToMarC,
        Phase::Branch,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// The phase that follows this one; [`Phase::Branch`] wraps to the start.
    pub const fn next(self) -> Phase {
        match self {
            Phase::PcToBusA => Phase::BusToMarA,
            Phase::BusToMarA => Phase::MarToBusA,
            Phase::MarToBusA => Phase::BusToA,
            Phase::BusToA => Phase::PcToBusB,
            Phase::PcToBusB => Phase::BusToMarB,
            Phase::BusToMarB => Phase::MarToBusB,
            Phase::MarToBusB => Phase::BusToB,
            Phase::BusToB => Phase::SubtractStore,
            Phase::SubtractStore => Phase::PcToBusC,
            Phase::PcToBusC => Phase::BusToMarC,
            Phase::BusToMarC => Phase::Branch,
            Phase::Branch => Phase::PcToBusA,
        }
    }

    /// True for the address-assert phases that only model read latency.
    pub const fn is_bus_assert(self) -> bool {
        matches!(
            self,
            Phase::PcToBusA
                | Phase::MarToBusA
                | Phase::PcToBusB
                | Phase::MarToBusB
                | Phase::PcToBusC
        )
    }

    /// Register-transfer notation for the micro-operation.
    pub const fn describe(self) -> &'static str {
        match self {
            Phase::PcToBusA => "pc -> addr bus",
            Phase::BusToMarA => "mem[pc] -> mar",
            Phase::MarToBusA => "mar -> addr bus",
            Phase::BusToA => "mem[mar] -> a, pc + 1",
            Phase::PcToBusB => "pc -> addr bus",
            Phase::BusToMarB => "mem[pc] -> mar",
            Phase::MarToBusB => "mar -> addr bus",
            Phase::BusToB => "mem[mar] -> b, pc + 1",
            Phase::SubtractStore => "b - a -> mem[mar]",
            Phase::PcToBusC => "pc -> addr bus",
            Phase::BusToMarC => "mem[pc] -> mar",
            Phase::Branch => "b - a <= 0 ? mar -> pc : pc + 1",
        }
    }
}

impl TryFrom<u8> for Phase {
    type Error = PhaseError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Phase::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or(PhaseError(raw))
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase.ordinal()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02} {}", self.ordinal(), self.describe())
    }
}

/// A raw cursor value that names no phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("micro-state {0} is not a legal phase (0 to 11)")]
pub struct PhaseError(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_table() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(usize::from(phase.ordinal()), i);
            assert_eq!(Phase::try_from(i as u8), Ok(*phase));
        }
    }

    #[test]
    fn test_cycle_returns_after_twelve() {
        let mut phase = Phase::INITIAL;
        for step in 1..=Phase::COUNT {
            phase = phase.next();
            assert_eq!(phase == Phase::INITIAL, step == Phase::COUNT);
        }
    }

    #[test]
    fn test_illegal_ordinals() {
        assert_eq!(Phase::try_from(12), Err(PhaseError(12)));
        assert_eq!(Phase::try_from(255), Err(PhaseError(255)));
    }

    #[test]
    fn test_bus_assert_phases() {
        let asserts: Vec<u8> = Phase::ALL
            .iter()
            .filter(|p| p.is_bus_assert())
            .map(|p| p.ordinal())
            .collect();
        assert_eq!(asserts, vec![0, 2, 4, 6, 9]);
    }
}
