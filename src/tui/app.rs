//! Debugger application state and logic.

use crate::cpu::{Cpu, MEMORY_SIZE};
use crate::program::disasm::disassemble_at;
use std::collections::HashSet;

/// Instructions executed per UI tick while running.
const INSTRUCTIONS_PER_TICK: u32 = 16;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Original program for reference.
    pub program: Vec<u8>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u8>,
    /// Everything the program has written to the output port.
    pub output: Vec<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset (in rows of 8 cells).
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>) -> Self {
        let mut cpu = Cpu::new();
        let report = cpu.load_image(&program);
        let status = if report.is_truncated() {
            format!("Program truncated: {} bytes dropped.", report.dropped)
        } else {
            "Ready. 's' step, 'c' clock, 'r' run, 'q' quit.".into()
        };

        Self {
            cpu,
            program,
            breakpoints: HashSet::new(),
            output: Vec::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
        }
    }

    /// Step one instruction (or finish the one in flight).
    pub fn step(&mut self) {
        let pc = self.cpu.regs.pc;
        match self.cpu.step_instruction() {
            Ok(cycles) => {
                self.status = format!("PC=0x{:02x}: {} cycles", pc, cycles);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
        self.collect_output();
    }

    /// Step one clock cycle.
    pub fn clock(&mut self) {
        match self.cpu.step_clock_cycle() {
            Ok(phase) => self.status = format!("Clock: {}", phase),
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
        self.collect_output();
    }

    /// Run until breakpoint or fault.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one batch of continuous execution.
    pub fn tick(&mut self) {
        for _ in 0..INSTRUCTIONS_PER_TICK {
            if !self.running {
                return;
            }

            if !self.cpu.is_running() {
                self.running = false;
                self.status = format!("Faulted after {} cycles", self.cpu.clock_count);
                return;
            }

            self.step();

            // Check for breakpoint
            let pc = self.cpu.regs.pc;
            if self.breakpoints.contains(&pc) {
                self.running = false;
                self.status = format!("Breakpoint at PC=0x{:02x}", pc);
            }
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC=0x{:02x}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC=0x{:02x}", pc);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.load_image(&self.program);
        self.output.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.mem_scroll + 1 < MEMORY_SIZE / 8 {
            self.mem_scroll += 1;
        }
    }

    /// Get disassembly starting at the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.cpu.regs.pc;
        disassemble_at(&self.cpu.mem, pc, lines)
            .into_iter()
            .map(|(addr, text)| (addr, text, addr == pc))
            .collect()
    }

    /// Output bytes as text, with non-printable bytes escaped.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .map(|&b| match b {
                b'\n' | 0x20..=0x7e => char::from(b).to_string(),
                _ => format!("\\x{:02x}", b),
            })
            .collect()
    }

    fn collect_output(&mut self) {
        let bytes = self.cpu.take_output();
        self.output.extend(bytes);
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('c') => {
                            app.running = false;
                            app.clock();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
