use std::io::{self, Write};
use std::sync::Arc;

use subleq_core::{Engine, Keyboard, LoadError, ProgramImage, RunError, TraceEvent, TraceSink};

use crate::{spawn_capture, Args, RawModeGuard};

/// Exit status for a clean halt or a user-requested termination.
pub const EXIT_OK: i32 = 0;

/// Exit status for load failures, faults, and device errors.
pub const EXIT_FAILURE: i32 = 1;

/// Trace sink printing one line per fetched instruction.
#[derive(Debug)]
pub struct ConsoleTrace<W> {
    out: W,
}

impl<W: Write> ConsoleTrace<W> {
    /// Wraps the writer that receives trace lines.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for ConsoleTrace<W> {
    fn on_event(&mut self, event: TraceEvent) {
        if let TraceEvent::InstructionStart { pc, a, b, c } = event {
            // Trace output is best effort; the console write path reports errors.
            let _ = write!(
                self.out,
                "PC: {pc:06X} A: {a:X} ({a}) B: {b:X} ({b}) C: {c:X} ({c})\r\n"
            );
        }
    }
}

/// Loads the image named by `args` and builds an engine around `keyboard`.
///
/// # Errors
///
/// Returns the [`LoadError`] of [`ProgramImage::load`].
pub fn load_engine(args: &Args, keyboard: Arc<Keyboard>) -> Result<Engine, LoadError> {
    let image = ProgramImage::load(&args.image)?;
    let config = args.engine_config();
    let mut engine = Engine::from_image(&image, config, keyboard);
    if config.tracing_enabled {
        log::info!("instruction trace enabled");
        engine.set_trace_sink(Box::new(ConsoleTrace::new(io::stdout())));
    }
    Ok(engine)
}

/// Runs `engine` to completion and maps the outcome to an exit status.
///
/// Fault diagnostics go to `out`, terminated with `\r\n` so they render in
/// raw mode.
pub fn run_engine(engine: &mut Engine, out: &mut dyn Write) -> i32 {
    match engine.run(out) {
        Ok(outcome) => {
            let reason = if outcome.terminated() {
                "terminated by interrupt"
            } else {
                "halted"
            };
            log::info!("{reason} after {} instructions", outcome.steps);
            EXIT_OK
        }
        Err(RunError::Fault(fault)) => {
            let _ = write!(out, "\r\n{fault}. Exiting.\r\n");
            let _ = out.flush();
            EXIT_FAILURE
        }
        Err(RunError::Output(err)) => {
            log::error!("console output failed: {err}");
            EXIT_FAILURE
        }
    }
}

/// Runs the interpreter on the real terminal and returns the exit status.
///
/// The terminal is restored before this returns, so the caller may exit the
/// process immediately afterwards.
#[must_use]
pub fn run(args: &Args) -> i32 {
    let keyboard = Arc::new(Keyboard::new(args.capture_config()));
    let mut engine = match load_engine(args, Arc::clone(&keyboard)) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_FAILURE;
        }
    };

    let _guard = RawModeGuard::enter().unwrap_or_else(|err| {
        log::warn!("raw mode unavailable: {err}");
        RawModeGuard::inactive()
    });

    if let Err(err) = spawn_capture(io::stdin(), keyboard) {
        eprintln!("error: failed to start keyboard thread: {err}");
        return EXIT_FAILURE;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_engine(&mut engine, &mut out)
}
