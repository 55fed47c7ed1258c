use anyhow::Result;
use asmcore::{Cpu, Step};
use chrono::Local;

use crate::editor_view::Program;
use crate::event_bus::Event;
use crate::views::View;

const LOG_CAPACITY: usize = 1000;

/// The execution panel. Owns the engine handle for the whole session;
/// nothing else touches the machine directly.
pub struct ProcessorView {
    cpu: Cpu,
    log: Vec<String>,
    finished: bool,
    max_run_steps: u32,
}

impl ProcessorView {
    pub fn new(cpu: Cpu, max_run_steps: u32) -> Self {
        Self {
            cpu,
            log: Vec::new(),
            finished: false,
            max_run_steps,
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Install a fresh program image in the engine.
    pub fn reload(&mut self, program: &Program) -> Result<()> {
        self.cpu.load(&program.binary)?;
        self.finished = false;
        self.append_log(&format!("program loaded ({} bytes)", program.binary.len()));
        Ok(())
    }

    /// Rewind the engine to the state right after the last load.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.finished = false;
        self.append_log("processor reset");
    }

    pub fn append_log(&mut self, line: &str) {
        let stamped = format!("[{}] {}", Local::now().format("%H:%M:%S"), line);
        self.log.push(stamped);
        if self.log.len() > LOG_CAPACITY {
            self.log.remove(0);
        }
    }

    pub fn on_finished(&mut self, code: i32) {
        self.finished = true;
        self.append_log(&format!("program exited with code {}", code));
    }

    /// Execute one instruction; returns the events the controller
    /// should route (output lines, state update, exit).
    pub fn step(&mut self) -> Vec<Event> {
        match self.cpu.step() {
            Ok(Step::Ran) => vec![Event::ExecutionStepped],
            Ok(Step::Printed(line)) => {
                vec![Event::LogLine(line), Event::ExecutionStepped]
            }
            Ok(Step::Exited(code)) => {
                vec![Event::ExecutionStepped, Event::ExecutionExited(code)]
            }
            Err(e) => {
                self.append_log(&format!("fault: {}", e));
                vec![Event::ExecutionStepped, Event::ExecutionExited(1)]
            }
        }
    }

    /// Execute until the program exits or the configured step cap is
    /// reached. Output lines keep their order ahead of the exit event.
    pub fn run(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        match self.cpu.run(self.max_run_steps) {
            Ok(summary) => {
                events.extend(summary.printed.into_iter().map(Event::LogLine));
                events.push(Event::ExecutionStepped);
                if let Some(code) = summary.exit {
                    events.push(Event::ExecutionExited(code));
                } else {
                    self.append_log(&format!(
                        "run paused after {} steps without exit",
                        summary.steps
                    ));
                }
            }
            Err(e) => {
                self.append_log(&format!("fault: {}", e));
                events.push(Event::ExecutionStepped);
                events.push(Event::ExecutionExited(1));
            }
        }
        events
    }
}

impl View for ProcessorView {}
