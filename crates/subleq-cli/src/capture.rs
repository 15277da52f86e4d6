//! Keystroke capture.
//!
//! A dedicated thread blocks on the input device and feeds every byte into
//! the shared [`Keyboard`]. The engine never waits on input; it only drains
//! what the thread has already buffered.

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use subleq_core::Keyboard;

const READ_CHUNK: usize = 64;

/// Starts the capture thread.
///
/// The thread is detached in normal use: it may stay blocked in `read`
/// until the process exits.
///
/// # Errors
///
/// Returns the spawn error when the thread cannot be created.
pub fn spawn_capture<R>(mut input: R, keyboard: Arc<Keyboard>) -> io::Result<JoinHandle<u64>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("subleq-capture".to_string())
        .spawn(move || capture_loop(&mut input, &keyboard))
}

/// Reads `input` until end of file, a read error, or a terminate request,
/// pushing each byte into `keyboard`. Returns the number of bytes read.
pub fn capture_loop(input: &mut dyn Read, keyboard: &Keyboard) -> u64 {
    let mut chunk = [0_u8; READ_CHUNK];
    let mut total = 0_u64;
    while !keyboard.terminate_requested() {
        match input.read(&mut chunk) {
            Ok(0) => {
                log::debug!("input closed after {total} bytes");
                break;
            }
            Ok(read) => {
                for &byte in &chunk[..read] {
                    keyboard.push(byte);
                }
                total += read as u64;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                log::warn!("keyboard read failed: {err}");
                break;
            }
        }
    }
    total
}
