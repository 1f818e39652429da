//! Runs the reference summation program and prints a state report after
//! every instruction.

use accum_core::{CoreConfig, CoreState, StepOutcome, DEFAULT_HALT_OPCODE};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const PROGRAM: [u8; 16] = [
    0x08, 0x10, 0x00, // LOAD ACC, [0x1000]
    0xB7, 0x10, 0x01, // ADD ACC, [0x1001]
    0xB7, 0x10, 0x02, // ADD ACC, [0x1002]
    0xA6, 0xFF, // XOR ACC, #0xFF
    0xD4, // INC ACC
    0x00, 0x10, 0x03, // STORE ACC, [0x1003]
    DEFAULT_HALT_OPCODE,
];

fn main() {
    let mut state = CoreState::new();
    if let Err(fault) = state
        .load_image(0x0000, &PROGRAM)
        .and_then(|()| state.load_image(0x1000, &[0x01, 0x02, 0x03]))
    {
        eprintln!("load failed: {fault}");
        return;
    }

    let config = CoreConfig::default();
    println!("{}", state.report(&[]));
    loop {
        match state.step(&config) {
            Ok(StepOutcome::Retired { .. }) => println!("{}", state.report(&[])),
            Ok(StepOutcome::Halted { .. }) => break,
            Err(fault) => {
                eprintln!("fault: {fault}");
                return;
            }
        }
    }
    println!("{}", state.report(&[0x1000, 0x1001, 0x1002, 0x1003]));
}
