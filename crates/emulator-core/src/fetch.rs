//! Operand fetch unit.
//!
//! Reads the opcode at `PC` into `IR`, then the trailing address/constant
//! bytes its addressing mode needs, in address order. The fetch is precise:
//! when any byte lies past the end of memory nothing is committed.

use crate::decoder::{Decoder, Instruction};
use crate::encoding::{Destination, Source, TransferMethod, TransferRegister};
use crate::memory::{read_byte_checked, ADDRESS_SPACE_BYTES};
use crate::state::ImmediateLatch;
use crate::{CoreState, FaultCode};

struct FetchCursor<'a> {
    memory: &'a [u8],
    position: usize,
}

impl<'a> FetchCursor<'a> {
    fn new(memory: &'a [u8], pc: u16) -> Self {
        Self {
            memory,
            position: usize::from(pc),
        }
    }

    fn next_byte(&mut self) -> Result<u8, FaultCode> {
        let byte = read_byte_checked(self.memory, self.position)?;
        self.position += 1;
        Ok(byte)
    }

    fn next_pair(&mut self) -> Result<(u8, u8), FaultCode> {
        let msb = self.next_byte()?;
        let lsb = self.next_byte()?;
        Ok((msb, lsb))
    }

    fn next_pc(&self) -> u16 {
        // An instruction ending on the last byte wraps PC to zero.
        u16::try_from(self.position % ADDRESS_SPACE_BYTES).unwrap_or_default()
    }
}

/// Fetches the instruction at `PC`, filling `IR` and the immediate latch.
///
/// Returns the decoded instruction for callers that want to inspect it.
///
/// # Errors
///
/// Returns [`FaultCode::OutOfBounds`] when the opcode or a trailing byte
/// would be read past the end of memory. Registers and latch are unchanged
/// in that case.
pub fn fetch(state: &mut CoreState) -> Result<Instruction, FaultCode> {
    let pc = state.regs.pc();
    let mut cursor = FetchCursor::new(state.memory.as_slice(), pc);
    let opcode = cursor.next_byte()?;
    let instruction = Decoder::decode(opcode);
    let mut latch = state.latch;

    match instruction {
        Instruction::Alu {
            destination,
            source,
            ..
        } => fetch_alu_operands(&mut cursor, &mut latch, destination, source)?,
        Instruction::Transfer {
            register, method, ..
        } => fetch_transfer_operands(&mut cursor, &mut latch, register, method)?,
        Instruction::Branch { .. } => {
            let (msb, lsb) = cursor.next_pair()?;
            latch.set_pair(msb, lsb);
        }
        Instruction::Unclassified => {}
    }

    let next_pc = cursor.next_pc();
    state.regs.set_ir(opcode);
    state.regs.set_pc(next_pc);
    state.latch = latch;

    tracing::trace!(pc, opcode, next_pc, ?instruction, "fetched");
    Ok(instruction)
}

fn fetch_alu_operands(
    cursor: &mut FetchCursor<'_>,
    latch: &mut ImmediateLatch,
    destination: Destination,
    source: Source,
) -> Result<(), FaultCode> {
    if destination == Destination::Absolute {
        let (msb, lsb) = cursor.next_pair()?;
        latch.set_pair(msb, lsb);
        latch.destination = u16::from_be_bytes([msb, lsb]);
    }

    match source {
        Source::Immediate if destination == Destination::Accumulator => {
            latch.msb = cursor.next_byte()?;
        }
        Source::Immediate | Source::Absolute => {
            let (msb, lsb) = cursor.next_pair()?;
            latch.set_pair(msb, lsb);
        }
        Source::IndirectMar | Source::Accumulator => {}
    }

    Ok(())
}

fn fetch_transfer_operands(
    cursor: &mut FetchCursor<'_>,
    latch: &mut ImmediateLatch,
    register: TransferRegister,
    method: TransferMethod,
) -> Result<(), FaultCode> {
    match (method, register) {
        (TransferMethod::Immediate, TransferRegister::Accumulator) => {
            latch.msb = cursor.next_byte()?;
        }
        (TransferMethod::Absolute, _) | (TransferMethod::Immediate, TransferRegister::Mar) => {
            let (msb, lsb) = cursor.next_pair()?;
            latch.set_pair(msb, lsb);
        }
        (TransferMethod::IndirectMar | TransferMethod::Reserved11, _) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::fetch;
    use crate::decoder::trailing_byte_count;
    use crate::{CoreState, FaultCode, ImmediateLatch};

    fn state_with(origin: u16, bytes: &[u8]) -> CoreState {
        let mut state = CoreState::new();
        state.load_image(origin, bytes).expect("image fits");
        state.regs.set_pc(origin);
        state
    }

    #[test]
    fn absolute_load_latches_address_bytes_in_order() {
        let mut state = state_with(0x0000, &[0x08, 0x10, 0x00]);
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.ir(), 0x08);
        assert_eq!(state.regs.pc(), 0x0003);
        assert_eq!(state.latch.msb, 0x10);
        assert_eq!(state.latch.lsb, 0x00);
    }

    #[test]
    fn byte_constant_reads_single_byte() {
        let mut state = state_with(0x0009, &[0xA6, 0xFF, 0xEE]);
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.pc(), 0x000B);
        assert_eq!(state.latch.msb, 0xFF);
    }

    #[test]
    fn word_constant_for_mar_reads_two_bytes() {
        let mut state = state_with(0x0100, &[0x0D, 0x12, 0x34]);
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.pc(), 0x0103);
        assert_eq!(state.latch.word(), 0x1234);
    }

    #[test]
    fn memory_destination_and_source_keep_separate_addresses() {
        // ADD [0x2000], [0x3000]
        let mut state = state_with(0x0000, &[0xBF, 0x20, 0x00, 0x30, 0x00]);
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.pc(), 0x0005);
        assert_eq!(state.latch.destination, 0x2000);
        assert_eq!(state.latch.word(), 0x3000);
    }

    #[test]
    fn indirect_and_register_forms_read_nothing() {
        // INC ACC
        let mut state = state_with(0x0000, &[0xD4, 0x99]);
        state.latch = ImmediateLatch {
            msb: 0xAA,
            lsb: 0xBB,
            destination: 0xCCDD,
        };
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.pc(), 0x0001);
        assert_eq!(state.latch.msb, 0xAA);
        assert_eq!(state.latch.lsb, 0xBB);
    }

    #[test]
    fn branch_target_is_read_msb_first() {
        let mut state = state_with(0x0040, &[0x11, 0x00, 0x50]);
        fetch(&mut state).expect("fetch succeeds");

        assert_eq!(state.regs.pc(), 0x0043);
        assert_eq!(state.latch.word(), 0x0050);
    }

    #[test]
    fn trailing_byte_past_end_faults_without_side_effects() {
        let mut state = state_with(0xFFFE, &[0x08, 0x10]);
        state.regs.set_acc(0x42);
        let before = (state.regs, state.latch);

        assert_eq!(fetch(&mut state), Err(FaultCode::OutOfBounds));
        assert_eq!((state.regs, state.latch), before);
        assert_eq!(state.regs.pc(), 0xFFFE);
    }

    #[test]
    fn instruction_ending_on_last_byte_wraps_pc() {
        let mut state = state_with(0xFFFD, &[0x08, 0x10, 0x00]);
        fetch(&mut state).expect("fetch succeeds");
        assert_eq!(state.regs.pc(), 0x0000);

        let mut single = state_with(0xFFFF, &[0xD4]);
        fetch(&mut single).expect("fetch succeeds");
        assert_eq!(single.regs.pc(), 0x0000);
    }

    proptest! {
        #[test]
        fn pc_advances_by_instruction_length(
            opcode in any::<u8>(),
            trailing in proptest::collection::vec(any::<u8>(), 4),
            origin in 0u16..0xF000,
        ) {
            let mut bytes = vec![opcode];
            bytes.extend_from_slice(&trailing);
            let mut state = state_with(origin, &bytes);

            fetch(&mut state).expect("fetch succeeds");

            prop_assert_eq!(state.regs.ir(), opcode);
            prop_assert_eq!(
                state.regs.pc(),
                origin + 1 + u16::from(trailing_byte_count(opcode))
            );
        }
    }
}
