//! Instruction cycle for the SUBLEQ machine.
//!
//! Each cycle fetches the triple `(a, b, c)` at `pc` and takes exactly one of
//! four paths, checked in this order:
//! 1. `b == IO_PORT`: write the low byte of `mem[a]` to the output device
//! 2. `a == IO_PORT`: pop a keystroke into `mem[b]` (`NO_KEY` when empty)
//! 3. `a == INTERRUPT_PORT`: move the interrupt flag into `mem[b]`
//! 4. otherwise `mem[b] -= mem[a]` with 24-bit wraparound, branching to `c`
//!    (or halting when `c == IO_PORT`) if the stored cell is `<= 0`
//!
//! Faults are terminal and latched in [`RunState::Faulted`].

use std::io::Write;
use std::sync::Arc;

use crate::{
    diag, sub_wrapped, EngineConfig, Fault, InstructionKind, Keyboard, Memory, Operand,
    ProgramImage, RunError, RunOutcome, RunState, StepOutcome, TraceEvent, TraceSink,
    ADDRESS_LIMIT, INTERRUPT_PORT, IO_PORT, NO_KEY,
};

/// Width of one instruction triple.
pub const INSTRUCTION_CELLS: i32 = 3;

/// The machine: memory, program counter, policy, and the keyboard handle it
/// shares with the input thread.
pub struct Engine {
    memory: Memory,
    pc: i32,
    config: EngineConfig,
    keyboard: Arc<Keyboard>,
    run_state: RunState,
    trace: Option<Box<dyn TraceSink>>,
    retired: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pc", &self.pc)
            .field("config", &self.config)
            .field("run_state", &self.run_state)
            .field("retired", &self.retired)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine at `pc = 0` over `memory`.
    #[must_use]
    pub fn new(memory: Memory, config: EngineConfig, keyboard: Arc<Keyboard>) -> Self {
        Self {
            memory,
            pc: 0,
            config,
            keyboard,
            run_state: RunState::Running,
            trace: None,
            retired: 0,
        }
    }

    /// Creates an engine from a loaded image (identity table included).
    #[must_use]
    pub fn from_image(image: &ProgramImage, config: EngineConfig, keyboard: Arc<Keyboard>) -> Self {
        Self::new(image.to_memory(), config, keyboard)
    }

    /// Installs the sink that receives [`TraceEvent`]s while tracing is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Shared keystroke buffer; clone the `Arc` to hand it to a producer.
    #[must_use]
    pub const fn keyboard(&self) -> &Arc<Keyboard> {
        &self.keyboard
    }

    /// Current memory contents.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Program counter of the next fetch.
    #[must_use]
    pub const fn pc(&self) -> i32 {
        self.pc
    }

    /// Moves the program counter. Does not revive a stopped engine.
    pub fn set_pc(&mut self, pc: i32) {
        self.pc = pc;
    }

    /// Active engine policy.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Instructions retired since construction.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// Writes the configured dump window to `out`.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `out`.
    pub fn dump_memory(&self, out: &mut dyn Write) -> std::io::Result<()> {
        diag::write_dump(&self.memory, self.config.dump_window, out)
    }

    /// Runs one instruction cycle.
    ///
    /// A stopped engine keeps reporting how it stopped: `Halted` and
    /// `Terminated` are returned again, and a latched fault is returned as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Fault`] when the cycle faults and
    /// [`RunError::Output`] when the output device fails.
    pub fn step(&mut self, out: &mut dyn Write) -> Result<StepOutcome, RunError> {
        match self.run_state {
            RunState::Running => {}
            RunState::Halted => return Ok(StepOutcome::Halted),
            RunState::Terminated => return Ok(StepOutcome::Terminated),
            RunState::Faulted(fault) => return Err(fault.into()),
        }

        if self.keyboard.terminate_requested() {
            log::info!("terminate requested at pc {:06X}", self.pc);
            self.run_state = RunState::Terminated;
            return Ok(StepOutcome::Terminated);
        }

        if self.keyboard.take_dump_request() {
            log::debug!("dumping memory window {:?}", self.config.dump_window);
            self.dump_memory(out)?;
        }

        match self.cycle(out) {
            Ok(outcome) => {
                if let StepOutcome::Retired { .. } = outcome {
                    self.retired += 1;
                }
                Ok(outcome)
            }
            Err(RunError::Fault(fault)) => {
                log::debug!("fault latched: {fault}");
                self.run_state = RunState::Faulted(fault);
                self.emit(TraceEvent::FaultRaised { fault });
                Err(fault.into())
            }
            Err(err) => Err(err),
        }
    }

    /// Steps until the engine halts, terminates, or faults.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`Engine::step`].
    pub fn run(&mut self, out: &mut dyn Write) -> Result<RunOutcome, RunError> {
        self.run_bounded(out, None)
    }

    /// Steps at most `max_steps` times, stopping early on halt, terminate,
    /// or fault. When the budget runs out the last `Retired` outcome is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`Engine::step`].
    pub fn run_for(&mut self, out: &mut dyn Write, max_steps: u64) -> Result<RunOutcome, RunError> {
        self.run_bounded(out, Some(max_steps))
    }

    fn run_bounded(
        &mut self,
        out: &mut dyn Write,
        max_steps: Option<u64>,
    ) -> Result<RunOutcome, RunError> {
        let mut steps = 0;
        let mut final_step = StepOutcome::Retired {
            kind: InstructionKind::Subleq,
            next_pc: self.pc,
        };
        while max_steps.map_or(true, |limit| steps < limit) {
            final_step = self.step(out)?;
            match final_step {
                StepOutcome::Retired { .. } => steps += 1,
                StepOutcome::Halted | StepOutcome::Terminated => break,
            }
        }
        Ok(RunOutcome { steps, final_step })
    }

    fn cycle(&mut self, out: &mut dyn Write) -> Result<StepOutcome, RunError> {
        let pc = self.pc;
        if !(0..ADDRESS_LIMIT).contains(&pc) {
            return Err(Fault::PcOutOfRange { pc }.into());
        }

        let a = self.memory.read(pc)?;
        let b = self.memory.read(pc + 1)?;
        let c = self.memory.read(pc + 2)?;
        self.emit(TraceEvent::InstructionStart { pc, a, b, c });

        if a >= ADDRESS_LIMIT {
            return Err(Fault::OperandOutOfRange {
                operand: Operand::A,
                pc,
                value: a,
            }
            .into());
        }
        if b >= ADDRESS_LIMIT {
            return Err(Fault::OperandOutOfRange {
                operand: Operand::B,
                pc,
                value: b,
            }
            .into());
        }

        let next_pc = pc + INSTRUCTION_CELLS;

        if b == IO_PORT {
            let byte = self.memory.read(a)?.to_le_bytes()[0];
            out.write_all(&[byte])?;
            out.flush()?;
            return Ok(self.retire(pc, InstructionKind::ConsoleWrite, next_pc));
        }

        if a == IO_PORT {
            self.keyboard.clear_interrupt();
            let value = self.keyboard.pop().map_or(NO_KEY, i32::from);
            self.memory.write(b, value)?;
            return Ok(self.retire(pc, InstructionKind::KeyboardRead, next_pc));
        }

        if a == INTERRUPT_PORT {
            let flag = self.keyboard.take_interrupt();
            self.memory.write(b, i32::from(flag))?;
            return Ok(self.retire(pc, InstructionKind::InterruptCheck, next_pc));
        }

        if self.config.negative_operand_faults {
            if a < 0 {
                return Err(Fault::NegativeOperand {
                    operand: Operand::A,
                    pc,
                    value: a,
                }
                .into());
            }
            if b < 0 {
                return Err(Fault::NegativeOperand {
                    operand: Operand::B,
                    pc,
                    value: b,
                }
                .into());
            }
        }

        let result = sub_wrapped(self.memory.read(b)?, self.memory.read(a)?);
        self.memory
            .write_guarded(b, result, self.config.protect_device_range)?;

        // Branch on the cell, not `result`: a suppressed device-range store
        // leaves the old value in place.
        if self.memory.read(b)? <= 0 {
            if c == IO_PORT {
                self.run_state = RunState::Halted;
                self.emit(TraceEvent::Halted { pc });
                return Ok(StepOutcome::Halted);
            }
            return Ok(self.retire(pc, InstructionKind::Subleq, c));
        }
        Ok(self.retire(pc, InstructionKind::Subleq, next_pc))
    }

    fn retire(&mut self, pc: i32, kind: InstructionKind, next_pc: i32) -> StepOutcome {
        self.pc = next_pc;
        self.emit(TraceEvent::InstructionRetired { pc, kind });
        StepOutcome::Retired { kind, next_pc }
    }

    fn emit(&mut self, event: TraceEvent) {
        if !self.config.tracing_enabled {
            return;
        }
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }
}
