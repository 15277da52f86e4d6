//! Terminal front end for the SUBLEQ interpreter.

/// Command-line arguments and logger setup.
pub mod cli;
pub use cli::{init_logging, Args, Overflow};

/// Raw-mode terminal guard.
pub mod terminal;
pub use terminal::RawModeGuard;

/// Background keystroke capture.
pub mod capture;
pub use capture::{capture_loop, spawn_capture};

/// Image loading, execution, and exit-code mapping.
pub mod runner;
pub use runner::{load_engine, run, run_engine, ConsoleTrace, EXIT_FAILURE, EXIT_OK};

