//! CPU execution engine for the SUBLEQ machine.
//!
//! Implements the twelve-phase clock cycle and the instruction stepper built
//! on top of it.

use crate::cpu::memory::LoadReport;
use crate::cpu::phase::Phase;
use crate::cpu::{Memory, Registers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    #[default]
    Running,
    /// The micro-state cursor was found outside the cycle. Sticky until reset.
    Faulted,
}

/// The SUBLEQ CPU together with the memory it owns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Retired instructions since reset.
    pub instruction_count: u64,
    /// Clock cycles since reset.
    pub clock_count: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset registers, counters, the fault flag and every memory cell to zero.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.instruction_count = 0;
        self.clock_count = 0;
    }

    /// Copy a program image into low memory.
    pub fn load_image(&mut self, image: &[u8]) -> LoadReport {
        let report = self.mem.load_image(image);
        if report.is_truncated() {
            tracing::warn!(
                size = image.len(),
                loaded = report.loaded,
                dropped = report.dropped,
                "program image is bigger than memory, truncated"
            );
        }
        report
    }

    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    pub fn is_faulted(&self) -> bool {
        self.state == CpuState::Faulted
    }

    /// Advance the datapath by one clock pulse.
    ///
    /// Returns the phase that was executed.
    pub fn step_clock_cycle(&mut self) -> Result<Phase, CpuError> {
        if self.is_faulted() {
            return Err(CpuError::Faulted);
        }

        let phase = match self.regs.phase() {
            Ok(phase) => phase,
            Err(err) => {
                tracing::error!(phase = err.0, "micro-state outside the cycle");
                self.state = CpuState::Faulted;
                return Err(CpuError::InvalidPhase(err.0));
            }
        };

        tracing::trace!(
            phase = phase.ordinal(),
            pc = self.regs.pc,
            mar = self.regs.mar,
            "clock"
        );

        self.execute(phase);
        self.regs.set_phase(phase.next());
        self.clock_count += 1;

        Ok(phase)
    }

    /// Perform the micro-operation of one phase.
    fn execute(&mut self, phase: Phase) {
        let regs = &mut self.regs;
        match phase {
            // Address is on the bus; data becomes valid next cycle.
            Phase::PcToBusA
            | Phase::MarToBusA
            | Phase::PcToBusB
            | Phase::MarToBusB
            | Phase::PcToBusC => {}

            Phase::BusToMarA | Phase::BusToMarB | Phase::BusToMarC => {
                regs.mar = self.mem.read(regs.pc);
            }

            Phase::BusToA => {
                regs.a = self.mem.read(regs.mar);
                regs.advance_pc();
            }

            Phase::BusToB => {
                regs.b = self.mem.read(regs.mar);
                regs.advance_pc();
            }

            Phase::SubtractStore => {
                self.mem.write(regs.mar, regs.b.wrapping_sub(regs.a));
            }

            Phase::Branch => {
                let taken = regs.branch_condition();
                if taken {
                    regs.jump(regs.mar);
                } else {
                    regs.advance_pc();
                }
                self.instruction_count += 1;
                tracing::debug!(
                    count = self.instruction_count,
                    taken,
                    pc = regs.pc,
                    "instruction retired"
                );
            }
        }
    }

    /// Run the clock until the cursor is back at the start of an instruction.
    ///
    /// From the initial phase this executes one whole instruction; from any
    /// other phase it finishes the one in flight. Returns the clock cycles
    /// spent.
    pub fn step_instruction(&mut self) -> Result<u32, CpuError> {
        let mut cycles = 0;
        for _ in 0..Phase::COUNT {
            self.step_clock_cycle()?;
            cycles += 1;
            if self.regs.at_instruction_boundary() {
                break;
            }
        }
        debug_assert!(self.regs.at_instruction_boundary());
        Ok(cycles)
    }

    /// Run for at most `max_instructions` instructions.
    ///
    /// Returns the number of instructions retired.
    pub fn run_limited(&mut self, max_instructions: u64) -> Result<u64, CpuError> {
        let start = self.instruction_count;
        for _ in 0..max_instructions {
            self.step_instruction()?;
        }
        Ok(self.instruction_count - start)
    }

    /// The three operand cells starting at `addr`, wrapping at the top of memory.
    pub fn operands_at(&self, addr: u8) -> [u8; 3] {
        [
            self.mem.read(addr),
            self.mem.read(addr.wrapping_add(1)),
            self.mem.read(addr.wrapping_add(2)),
        ]
    }

    /// Take every byte the program wrote to the output port.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.mem.take_output()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid micro-state {0}, CPU faulted")]
    InvalidPhase(u8),

    #[error("CPU is faulted; reset required")]
    Faulted,
}
