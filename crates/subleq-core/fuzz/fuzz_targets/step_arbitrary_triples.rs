#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use subleq_core::{sub_wrapped, Engine, EngineConfig, Keyboard, Memory, MAX_WORD, MIN_WORD};

const MAX_STEPS: u64 = 256;

fuzz_target!(|data: &[u8]| {
    let cells: Vec<i32> = data
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    if cells.len() < 2 {
        return;
    }

    let result = sub_wrapped(cells[0], cells[1]);
    assert!((MIN_WORD..=MAX_WORD).contains(&result));

    let config = if data[0] & 1 == 0 {
        EngineConfig::default()
    } else {
        EngineConfig::lenient()
    };
    let keyboard = Arc::new(Keyboard::default());
    for byte in data.iter().rev().take(4) {
        keyboard.push(*byte);
    }

    let mut engine = Engine::new(Memory::from_image(&cells), config, keyboard);
    let mut out = Vec::new();
    let _ = engine.run_for(&mut out, MAX_STEPS);
});
