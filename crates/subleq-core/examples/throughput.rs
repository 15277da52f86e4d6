//! Instruction-throughput harness for the SUBLEQ engine.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --release -p subleq-core --example throughput
//! ```
//!
//! Runs a countdown loop (one subtract plus one unconditional jump per
//! iteration) and reports retired instructions per second.

#![allow(clippy::pedantic)]

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::io;
use std::sync::Arc;
use std::time::Instant;

use subleq_core::{Engine, EngineConfig, Keyboard, Memory, IO_PORT};

const ITERATIONS: i32 = 4_000_000;

fn countdown_program(iterations: i32) -> Vec<i32> {
    vec![
        10, 11, 6, // counter -= 1; exit when it reaches zero
        12, 12, 0, // z = 0, loop
        12, 12, IO_PORT, // halt
        0, 1, iterations, 0, // pad, one, counter, z
    ]
}

fn main() -> io::Result<()> {
    let mut engine = Engine::new(
        Memory::from_image(&countdown_program(ITERATIONS)),
        EngineConfig::default(),
        Arc::new(Keyboard::default()),
    );
    let mut sink = io::sink();

    let started = Instant::now();
    let outcome = engine
        .run(&mut sink)
        .map_err(|err| io::Error::other(err.to_string()))?;
    let elapsed = started.elapsed();

    let rate = outcome.steps as f64 / elapsed.as_secs_f64();
    println!(
        "retired {} instructions in {:.3}s ({:.1} M instr/s), halted={}",
        outcome.steps,
        elapsed.as_secs_f64(),
        rate / 1_000_000.0,
        outcome.halted()
    );
    Ok(())
}
