//! Instruction-cycle integration coverage: arithmetic, ports, halting, and
//! fault behaviour observed through the public engine API.

#![allow(clippy::pedantic, clippy::nursery)]

use log as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use proptest::prelude::*;
use rstest::rstest;
use subleq_core::{
    sub_wrapped, Engine, EngineConfig, Fault, InstructionKind, Keyboard, Memory, Operand,
    ProgramImage, RunState, StepOutcome, TraceEvent, TraceSink, ADDRESS_LIMIT, DEVICE_BASE,
    INTERRUPT_BYTE, INTERRUPT_PORT, IO_PORT, MAX_WORD, MEMORY_CELLS, MIN_WORD, NO_KEY,
};

#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<TraceEvent>>>);

impl TraceSink for SharedSink {
    fn on_event(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}

fn engine(cells: &[i32]) -> Engine {
    Engine::new(
        Memory::from_image(cells),
        EngineConfig::default(),
        Arc::new(Keyboard::default()),
    )
}

/// Polls the keyboard until a byte arrives, echoes it, then halts.
#[rustfmt::skip]
const ECHO_ONE_KEY: [i32; 18] = [
    IO_PORT, 15, 3, // key -> mem[15]
    15, 16, 9, // t -= key; real keys make t <= 0
    16, 16, 0, // no key yet: t = 0, poll again
    15, IO_PORT, 12, // write key
    17, 17, IO_PORT, // halt
    0, 0, 0, // key, t, z
];

#[rstest]
#[case(0, 1, -1)]
#[case(8_388_608, 0, -8_388_608)]
#[case(5, 3, 2)]
#[case(0, 0xFF_FFFF, 1)]
#[case(MIN_WORD, 1, MAX_WORD)]
fn sub_wrapped_boundaries(#[case] x: i32, #[case] y: i32, #[case] expected: i32) {
    assert_eq!(sub_wrapped(x, y), expected);
}

proptest! {
    #[test]
    fn property_sub_wrapped_is_24_bit_twos_complement(x in 0i32..0x100_0000, y in 0i32..0x100_0000) {
        let result = sub_wrapped(x, y);
        prop_assert!((MIN_WORD..=MAX_WORD).contains(&result));
        let expected = (x - y).rem_euclid(0x100_0000);
        prop_assert_eq!(result.rem_euclid(0x100_0000), expected);
    }

    #[test]
    fn property_subleq_step_never_stores_outside_word_range(x in any::<i32>(), y in any::<i32>()) {
        let mut engine = engine(&[3, 4, 0, x, y]);
        let _ = engine.step(&mut Vec::new());
        let stored = engine.memory().read(4).unwrap();
        prop_assert!((MIN_WORD..=MAX_WORD).contains(&stored));
    }
}

#[test]
fn halt_only_program_stops_cleanly_without_output() {
    let mut engine = engine(&[0, 0, IO_PORT]);
    let mut out = Vec::new();
    let outcome = engine.run(&mut out).unwrap();
    assert!(outcome.halted());
    assert_eq!(outcome.steps, 0);
    assert!(out.is_empty());
    assert_eq!(engine.run_state(), RunState::Halted);
}

#[test]
fn console_write_emits_exactly_one_byte() {
    let mut engine = engine(&[6, IO_PORT, 3, 7, 7, IO_PORT, i32::from(b'H'), 0]);
    let mut out = Vec::new();
    let outcome = engine.run(&mut out).unwrap();
    assert!(outcome.halted());
    assert_eq!(out, b"H");
}

#[test]
fn console_write_sends_only_the_low_byte() {
    let mut engine = engine(&[6, IO_PORT, 3, 7, 7, IO_PORT, 0x1234_41, 0]);
    let mut out = Vec::new();
    engine.run(&mut out).unwrap();
    assert_eq!(out, vec![0x41]);
}

#[test]
fn echo_program_copies_one_key_to_output() {
    let mut engine = engine(&ECHO_ONE_KEY);
    engine.keyboard().push(b'A');
    let mut out = Vec::new();
    let outcome = engine.run(&mut out).unwrap();
    assert!(outcome.halted());
    assert_eq!(out, vec![0x41]);
}

#[test]
fn echo_program_polls_while_no_key_is_buffered() {
    let mut engine = engine(&ECHO_ONE_KEY);
    let mut out = Vec::new();
    let outcome = engine.run_for(&mut out, 30).unwrap();
    assert_eq!(outcome.steps, 30);
    assert!(out.is_empty());
    assert_eq!(engine.memory().read(15), Ok(NO_KEY));

    engine.keyboard().push(b'z');
    let outcome = engine.run(&mut out).unwrap();
    assert!(outcome.halted());
    assert_eq!(out, b"z");
}

#[test]
fn interrupt_flag_is_consumed_by_a_keyboard_read() {
    #[rustfmt::skip]
    let mut engine = engine(&[
        IO_PORT, 12, 3, // keyboard read clears the flag
        INTERRUPT_PORT, 13, 6, // sample flag
        14, 14, IO_PORT, // halt
        0, 0, 0, 0, 7, 0,
    ]);
    engine.keyboard().push(INTERRUPT_BYTE);
    engine.run(&mut Vec::new()).unwrap();
    assert_eq!(engine.memory().read(12), Ok(i32::from(INTERRUPT_BYTE)));
    assert_eq!(engine.memory().read(13), Ok(0));
}

#[test]
fn interrupt_check_reads_one_then_zero() {
    #[rustfmt::skip]
    let mut engine = engine(&[
        INTERRUPT_PORT, 12, 3, // first sample
        INTERRUPT_PORT, 13, 6, // second sample
        14, 14, IO_PORT, // halt
        0, 0, 0, 0, 0, 0,
    ]);
    engine.keyboard().push(INTERRUPT_BYTE);
    engine.run(&mut Vec::new()).unwrap();
    assert_eq!(engine.memory().read(12), Ok(1));
    assert_eq!(engine.memory().read(13), Ok(0));
}

#[test]
fn fetch_at_last_address_faults_instead_of_wrapping() {
    let mut engine = engine(&[]);
    engine.set_pc(ADDRESS_LIMIT - 1);
    let err = engine.step(&mut Vec::new()).unwrap_err();
    assert_eq!(
        err.fault(),
        Some(Fault::AddressOutOfRange {
            addr: ADDRESS_LIMIT
        })
    );
}

#[rstest]
#[case(-1)]
#[case(ADDRESS_LIMIT)]
fn pc_outside_address_space_faults(#[case] pc: i32) {
    let mut engine = engine(&[]);
    engine.set_pc(pc);
    let err = engine.step(&mut Vec::new()).unwrap_err();
    assert_eq!(err.fault(), Some(Fault::PcOutOfRange { pc }));
}

#[rstest]
#[case(vec![ADDRESS_LIMIT, 3, 0], Operand::A, false)]
#[case(vec![3, ADDRESS_LIMIT, 0], Operand::B, false)]
#[case(vec![-3, 3, 0], Operand::A, true)]
#[case(vec![3, -2, 0], Operand::B, true)]
fn operand_faults_name_the_offending_slot(
    #[case] cells: Vec<i32>,
    #[case] operand: Operand,
    #[case] negative: bool,
) {
    let value = cells[match operand {
        Operand::A => 0,
        Operand::B => 1,
    }];
    let expected = if negative {
        Fault::NegativeOperand {
            operand,
            pc: 0,
            value,
        }
    } else {
        Fault::OperandOutOfRange {
            operand,
            pc: 0,
            value,
        }
    };

    let mut engine = engine(&cells);
    let err = engine.step(&mut Vec::new()).unwrap_err();
    assert_eq!(err.fault(), Some(expected));
    assert_eq!(engine.run_state(), RunState::Faulted(expected));
    assert_eq!(
        engine.step(&mut Vec::new()).unwrap_err().fault(),
        Some(expected)
    );
}

#[test]
fn lenient_engine_reaches_memory_with_a_negative_b() {
    let mut engine = Engine::new(
        Memory::from_image(&[3, -2, 0]),
        EngineConfig::lenient(),
        Arc::new(Keyboard::default()),
    );
    let err = engine.step(&mut Vec::new()).unwrap_err();
    assert_eq!(err.fault(), Some(Fault::AddressOutOfRange { addr: -2 }));
}

#[test]
fn branch_to_negative_target_faults_on_next_fetch() {
    let mut engine = engine(&[3, 3, -6]);
    let mut out = Vec::new();
    assert_eq!(
        engine.step(&mut out).unwrap(),
        StepOutcome::Retired {
            kind: InstructionKind::Subleq,
            next_pc: -6
        }
    );
    let err = engine.run(&mut out).unwrap_err();
    assert_eq!(err.fault(), Some(Fault::PcOutOfRange { pc: -6 }));
}

#[test]
fn identity_table_survives_protected_subtraction() {
    let mut engine = engine(&[9, DEVICE_BASE + 0x41, 3, 10, 10, IO_PORT, 0, 0, 0, 1]);
    engine.run(&mut Vec::new()).unwrap();
    assert_eq!(engine.memory().read(DEVICE_BASE + 0x41), Ok(0x41));
}

#[test]
fn loaded_image_runs_end_to_end() {
    let text = "; echo one key\nFFFFFF F 3\nF 10 9\n10 10 0\nF FFFFFF C\n11 11 FFFFFF\n0 0 0\n";
    let image = ProgramImage::parse(text).unwrap();
    assert_eq!(image.cells(), &ECHO_ONE_KEY);

    let keyboard = Arc::new(Keyboard::default());
    keyboard.push(b'A');
    let mut engine = Engine::from_image(&image, EngineConfig::default(), keyboard);
    let mut out = Vec::new();
    engine.run(&mut out).unwrap();
    assert_eq!(out, vec![0x41]);
}

#[test]
fn oversized_cell_list_is_truncated_to_the_address_space() {
    let image = ProgramImage::from_cells(vec![7; MEMORY_CELLS + 1]);
    assert!(image.truncated());
    assert_eq!(image.len(), MEMORY_CELLS);
    assert_eq!(image.cells()[MEMORY_CELLS - 1], 7);
}

#[test]
fn parsing_stops_once_memory_is_full() {
    let text = format!("oversized\n{}", "1 ".repeat(MEMORY_CELLS + 1));
    let image = ProgramImage::parse(&text).unwrap();
    assert!(image.truncated());
    assert_eq!(image.len(), MEMORY_CELLS);

    let memory = image.to_memory();
    assert_eq!(memory.read(0), Ok(1));
    assert_eq!(memory.read(DEVICE_BASE + 0x41), Ok(0x41));
}

#[test]
fn image_filling_memory_exactly_is_not_truncated() {
    let image = ProgramImage::from_cells(vec![0; MEMORY_CELLS]);
    assert!(!image.truncated());
    assert_eq!(image.len(), MEMORY_CELLS);
}

#[test]
fn trace_reports_operands_before_each_instruction() {
    let sink = SharedSink::default();
    let events = Rc::clone(&sink.0);
    let mut engine = Engine::new(
        Memory::from_image(&[6, IO_PORT, 3, 7, 7, IO_PORT, 0x21, 0]),
        EngineConfig {
            tracing_enabled: true,
            ..EngineConfig::default()
        },
        Arc::new(Keyboard::default()),
    );
    engine.set_trace_sink(Box::new(sink));
    engine.run(&mut Vec::new()).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            TraceEvent::InstructionStart {
                pc: 0,
                a: 6,
                b: IO_PORT,
                c: 3
            },
            TraceEvent::InstructionRetired {
                pc: 0,
                kind: InstructionKind::ConsoleWrite
            },
            TraceEvent::InstructionStart {
                pc: 3,
                a: 7,
                b: 7,
                c: IO_PORT
            },
            TraceEvent::Halted { pc: 3 },
        ]
    );
}

#[test]
fn trace_sink_is_silent_when_tracing_is_disabled() {
    let sink = SharedSink::default();
    let events = Rc::clone(&sink.0);
    let mut engine = engine(&[0, 0, IO_PORT]);
    engine.set_trace_sink(Box::new(sink));
    engine.run(&mut Vec::new()).unwrap();
    assert!(events.borrow().is_empty());
}
