//! SUBLEQ Emulator - CLI Entry Point
//!
//! Commands:
//! - `subleq-emu shell [image]` - Interactive command shell (default)
//! - `subleq-emu run <image>` - Run a program for a bounded number of instructions
//! - `subleq-emu debug <image>` - Interactive TUI debugger
//! - `subleq-emu disasm <image>` - Disassemble a program image

use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default log filter.
const LOG_ENV: &str = "SUBLEQ_LOG";

#[derive(Parser)]
#[command(name = "subleq-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-accurate emulator of an 8-bit SUBLEQ computer")]
struct Cli {
    /// Log filter (e.g. `debug`, `subleq=trace`); overrides SUBLEQ_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive command shell (type `h` for help)
    Shell {
        /// Raw binary program image to load at address 0
        image: Option<String>,
    },
    /// Run a program and print its output
    Run {
        /// Raw binary program image to load at address 0
        image: String,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "10000")]
        max_instructions: u64,
        /// Print each instruction before it executes
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive TUI debugger
    Debug {
        /// Raw binary program image to load at address 0
        image: String,
    },
    /// Disassemble a program image
    Disasm {
        /// Raw binary program image
        image: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    match cli.command {
        Some(Commands::Shell { image }) => run_shell(image.as_deref()),
        None => run_shell(None),
        Some(Commands::Run { image, max_instructions, trace }) => {
            run_program(&image, max_instructions, trace);
        }
        Some(Commands::Debug { image }) => {
            debug_program(&image);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_or_exit(path: &str) -> Vec<u8> {
    match subleq::read_image(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    }
}

fn report_truncation(path: &str, size: usize, report: subleq::LoadReport) {
    if report.is_truncated() {
        eprintln!(
            "program file {} ({} bytes) is bigger than memory.\nLoading only the first {} bytes.",
            path, size, report.loaded
        );
    }
}

fn run_shell(path: Option<&str>) {
    use subleq::Shell;

    let image = path.map(load_or_exit).unwrap_or_default();
    let size = image.len();
    let mut shell = Shell::new(image);
    if let Some(path) = path {
        report_truncation(path, size, shell.load_report());
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = shell.run(stdin.lock(), stdout.lock()) {
        eprintln!("❌ Shell I/O error: {}", e);
        std::process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Output write failed: {0}")]
    Output(#[from] std::io::Error),
    #[error("CPU error at PC=0x{pc:02x}: {source}")]
    Cpu {
        pc: u8,
        #[source]
        source: subleq::CpuError,
    },
}

fn run_program(path: &str, max_instructions: u64, trace: bool) {
    use subleq::Cpu;

    let image = load_or_exit(path);
    let mut cpu = Cpu::new();
    let report = cpu.load_image(&image);
    report_truncation(path, image.len(), report);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = execute_program(&mut cpu, max_instructions, trace, &mut stdout) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    eprintln!();
    eprintln!("━━━ Result ━━━");
    eprintln!("Instructions: {}", cpu.instruction_count);
    eprintln!("Clock cycles: {}", cpu.clock_count);
    eprintln!("PC:  0x{:02x}", cpu.regs.pc);
    eprintln!("A:   0x{:02x}   B: 0x{:02x}   MAR: 0x{:02x}", cpu.regs.a, cpu.regs.b, cpu.regs.mar);
}

/// Execute up to `max_instructions`, writing trace lines and port output to `out`.
fn execute_program<W: Write>(
    cpu: &mut subleq::Cpu,
    max_instructions: u64,
    trace: bool,
    out: &mut W,
) -> Result<(), RunError> {
    use subleq::program::format_triple;

    for _ in 0..max_instructions {
        let pc = cpu.regs.pc;
        if trace {
            writeln!(out, "0x{:02x}: {}", pc, format_triple(cpu.operands_at(pc)))?;
        }

        if let Err(source) = cpu.step_instruction() {
            out.flush()?;
            return Err(RunError::Cpu { pc, source });
        }

        let output = cpu.take_output();
        if !output.is_empty() {
            out.write_all(&output)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use subleq::tui::run_debugger;

    let image = load_or_exit(path);
    if let Err(e) = run_debugger(image) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    eprintln!("❌ This build has no TUI debugger; rebuild with `--features tui`");
    std::process::exit(1);
}

fn disassemble_file(path: &str) {
    let image = load_or_exit(path);
    println!("{}", subleq::disassemble(&image));
}

#[cfg(test)]
mod tests {
    use super::*;
    use subleq::{Cpu, CpuError};

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    fn cpu_with(image: &[u8]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_image(image);
        cpu
    }

    #[test]
    fn test_execute_writes_trace_and_output() {
        let mut cpu = cpu_with(&[3, 255, 0, 191]);
        let mut out = Vec::new();
        execute_program(&mut cpu, 1, true, &mut out).unwrap();
        assert_eq!(out, b"0x00: subleq 0x03, 0xff, 0x00  ; out\nA");
    }

    #[test]
    fn test_broken_output_is_an_error() {
        let mut cpu = cpu_with(&[3, 255, 0, 191]);
        assert!(matches!(
            execute_program(&mut cpu, 1, true, &mut BrokenPipe),
            Err(RunError::Output(_))
        ));

        // Without tracing the failure comes from the port output.
        let mut cpu = cpu_with(&[3, 255, 0, 191]);
        assert!(matches!(
            execute_program(&mut cpu, 1, false, &mut BrokenPipe),
            Err(RunError::Output(_))
        ));
        assert_eq!(cpu.instruction_count, 1);

        // A silent program still fails on the final flush.
        let mut cpu = cpu_with(&[3, 4, 0, 0, 0]);
        assert!(matches!(
            execute_program(&mut cpu, 1, false, &mut BrokenPipe),
            Err(RunError::Output(_))
        ));
    }

    #[test]
    fn test_cpu_fault_reports_pc() {
        let mut cpu = Cpu::new();
        cpu.regs.phase = 200;
        let mut out = Vec::new();
        match execute_program(&mut cpu, 5, false, &mut out) {
            Err(RunError::Cpu { pc, source }) => {
                assert_eq!(pc, 0);
                assert_eq!(source, CpuError::InvalidPhase(200));
            }
            other => panic!("expected CPU error, got {:?}", other),
        }
    }
}
