//! Line-oriented command shell around the CPU.
//!
//! Reads one command per line, runs it against the machine and writes the
//! response. Bytes the program emits through the output port are written to
//! the same stream as soon as the command that produced them finishes.

mod command;

pub use command::{Command, CommandError, CommandName};

use crate::cpu::{Cpu, CpuError, LoadReport};
use crate::program::image;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
h            -- prints this help page
si   or   s  -- single instruction step
sc           -- single clock cycle step (sub-instruction)
c <x>        -- execute x many instructions
rr           -- print all register contents
rm <x> <<y>> -- read memory address x (or range x to y)
wm <x> <y>   -- write value y into address x
ps           -- print statistics
x            -- reset the machine and reload the program
save <path>  -- save the machine state
restore <p>  -- restore a saved machine state
q            -- quit";

/// Whether the shell should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The interactive shell state.
pub struct Shell {
    cpu: Cpu,
    /// Image loaded at startup, reloaded on reset.
    image: Vec<u8>,
    report: LoadReport,
}

impl Shell {
    /// Create a shell with a freshly reset machine holding `image`.
    pub fn new(image: Vec<u8>) -> Self {
        let mut cpu = Cpu::new();
        let report = cpu.load_image(&image);
        Self { cpu, image, report }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// How the startup image fit into memory.
    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    /// Read commands from `input` until `q` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        let mut line = String::new();
        loop {
            write!(out, " > ")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }

            let flow = match Command::parse(&line) {
                Ok(Some(command)) => self.execute(command, &mut out)?,
                Ok(None) => Flow::Continue,
                Err(err) => {
                    writeln!(out, "{}", err)?;
                    Flow::Continue
                }
            };
            out.flush()?;

            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Execute one command, writing its response to `out`.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        tracing::debug!(?command, "shell command");
        match command {
            Command::Step => {
                let result = self.cpu.step_instruction().map(|_| ());
                self.report_step(result, out)?;
            }
            Command::Continue { count } => {
                let result = self.cpu.run_limited(count).map(|_| ());
                self.report_step(result, out)?;
            }
            Command::Clock => {
                let result = self.cpu.step_clock_cycle().map(|_| ());
                self.flush_program_output(out)?;
                match result {
                    Ok(()) => writeln!(
                        out,
                        "pc: 0x{:02x}\tstate: {:02}",
                        self.cpu.regs.pc, self.cpu.regs.phase
                    )?,
                    Err(err) => writeln!(out, "error: {}", err)?,
                }
            }
            Command::ReadMemory { start, end } => match end {
                Some(end) if start <= end => {
                    for addr in start..=end {
                        writeln!(out, "0x{:02x}: 0x{:02x}", addr, self.cpu.mem.read(addr))?;
                    }
                }
                _ => writeln!(out, "0x{:02x}", self.cpu.mem.read(start))?,
            },
            Command::WriteMemory { addr, value } => {
                let old = self.cpu.mem.read(addr);
                self.cpu.mem.write(addr, value);
                self.flush_program_output(out)?;
                writeln!(out, "0x{:02x} -> 0x{:02x}", old, self.cpu.mem.read(addr))?;
            }
            Command::Registers => {
                let regs = &self.cpu.regs;
                writeln!(out, "a:     0x{:02x}", regs.a)?;
                writeln!(out, "b:     0x{:02x}", regs.b)?;
                writeln!(out, "mar:   0x{:02x}", regs.mar)?;
                writeln!(out, "pc:    0x{:02x}", regs.pc)?;
                match regs.phase() {
                    Ok(phase) => writeln!(out, "state: {}", phase)?,
                    Err(err) => writeln!(out, "state: {}", err)?,
                }
            }
            Command::Stats => {
                writeln!(
                    out,
                    "instructions: {}\tclock cycles: {}",
                    self.cpu.instruction_count, self.cpu.clock_count
                )?;
                if self.cpu.is_faulted() {
                    writeln!(out, "cpu faulted; use `x` to reset")?;
                }
            }
            Command::Reset => {
                self.cpu.reset();
                self.report = self.cpu.load_image(&self.image);
                writeln!(out, "reset; loaded {} bytes", self.report.loaded)?;
            }
            Command::Save { path } => match image::save_snapshot(&path, &self.cpu) {
                Ok(()) => writeln!(out, "saved to {}", path.display())?,
                Err(err) => writeln!(out, "error: {}", err)?,
            },
            Command::Restore { path } => match image::load_snapshot(&path) {
                Ok(cpu) => {
                    self.cpu = cpu;
                    writeln!(out, "restored; pc: 0x{:02x}", self.cpu.regs.pc)?;
                }
                Err(err) => writeln!(out, "error: {}", err)?,
            },
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn report_step<W: Write>(&mut self, result: Result<(), CpuError>, out: &mut W) -> io::Result<()> {
        self.flush_program_output(out)?;
        match result {
            Ok(()) => writeln!(out, "pc: 0x{:02x}", self.cpu.regs.pc),
            Err(err) => writeln!(out, "error: {}", err),
        }
    }

    fn flush_program_output<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let bytes = self.cpu.take_output();
        if !bytes.is_empty() {
            out.write_all(&bytes)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(image: &[u8], script: &str) -> (Shell, String) {
        let mut shell = Shell::new(image.to_vec());
        let mut out = Vec::new();
        shell.run(Cursor::new(script), &mut out).unwrap();
        (shell, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_step_and_stats() {
        let (shell, out) = session(&[3, 3, 6, 253], "s\nps\nq\n");

        assert!(out.contains("pc: 0x06\n"));
        assert!(out.contains("instructions: 1\tclock cycles: 12\n"));
        assert_eq!(shell.cpu().mem.read(3), 0);
    }

    #[test]
    fn test_clock_step_prints_state() {
        let (_, out) = session(&[3, 3, 6, 253], "sc\nsc\nsc\nsc\n");

        assert!(out.contains("pc: 0x00\tstate: 01\n"));
        assert!(out.contains("pc: 0x01\tstate: 04\n"));
    }

    #[test]
    fn test_write_output_port_echoes_byte() {
        let (shell, out) = session(&[], "wm 255 65\n");

        assert!(out.contains("A\n0x00 -> 0x41\n"));
        assert_eq!(shell.cpu().mem.read(255), 65);
    }

    #[test]
    fn test_read_memory_range() {
        let (_, out) = session(&[3, 3, 6, 253], "rm 1 3\nrm 3\n");

        assert!(out.contains("0x01: 0x03\n0x02: 0x06\n0x03: 0xfd\n"));
        assert!(out.contains("0xfd\n"));
    }

    #[test]
    fn test_bad_input_keeps_running() {
        let (_, out) = session(&[], "bogus\nrm 300\nwm 1\nrr\n");

        assert!(out.contains("unknown command `bogus`"));
        assert!(out.contains("memory address 300 out of range"));
        assert!(out.contains("expects an argument <value>"));
        assert!(out.contains("pc:    0x00\n"));
    }

    #[test]
    fn test_reset_reloads_image() {
        let (shell, out) = session(&[3, 3, 6, 253], "c 3\nx\nps\n");

        assert!(out.contains("reset; loaded 4 bytes\n"));
        assert!(out.contains("instructions: 0\tclock cycles: 0\n"));
        assert_eq!(shell.cpu().mem.read(3), 253);
    }

    #[test]
    fn test_run_stops_on_eof() {
        let (shell, _) = session(&[3, 3, 0, 0], "c 2");
        assert_eq!(shell.cpu().instruction_count, 2);
    }

    #[test]
    fn test_truncated_image_reported() {
        let shell = Shell::new(vec![1; 300]);
        assert_eq!(shell.load_report().dropped, 44);
    }
}
