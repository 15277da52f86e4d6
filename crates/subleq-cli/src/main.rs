//! CLI entry point for the `subleq` interpreter binary.

use std::process;

use clap::Parser;
use crossterm as _;
use log as _;
use simple_logger as _;
use subleq_cli::{init_logging, run, Args};
use subleq_core as _;
#[cfg(test)]
use tempfile as _;

fn main() {
    let args = Args::parse();
    if let Err(err) = init_logging(args.log_level()) {
        eprintln!("warning: logging disabled: {err}");
    }
    // `run` restores the terminal before returning.
    let code = run(&args);
    process::exit(code);
}
