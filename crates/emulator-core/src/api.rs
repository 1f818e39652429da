//! Host-facing machine API: state container, driver configuration, step and
//! run loops, and trace hooks.

use crate::memory::{new_address_space, read_byte_checked, write_block, AddressSpace};
use crate::report::StateReport;
use crate::state::{ImmediateLatch, RegisterFile};
use crate::{execute, fetch, FaultCode};

/// Opcode the driver treats as "stop" before fetching.
///
/// The decoder gives it no meaning of its own: `0x19` classifies as a
/// branch-on-zero.
pub const DEFAULT_HALT_OPCODE: u8 = 0x19;

/// Driver configuration for [`CoreState::step`] and [`CoreState::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Opcode value checked at `PC` before every fetch.
    pub halt_opcode: u8,
    /// Upper bound on retired instructions for one `run` call.
    pub max_steps: Option<u64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            halt_opcode: DEFAULT_HALT_OPCODE,
            max_steps: None,
        }
    }
}

/// Complete machine state: register file, immediate latch and memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Architectural registers.
    pub regs: RegisterFile,
    /// Operand bytes captured by the last fetch.
    pub latch: ImmediateLatch,
    /// Full 64 KiB byte-addressable memory.
    #[cfg_attr(feature = "serde", serde(with = "address_space_serde"))]
    pub memory: Box<AddressSpace>,
}

#[cfg(feature = "serde")]
mod address_space_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::memory::AddressSpace;

    pub(super) fn serialize<S: Serializer>(
        memory: &AddressSpace,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(memory)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Box<AddressSpace>, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let len = bytes.len();
        bytes.into_boxed_slice().try_into().map_err(|_| {
            <D::Error as serde::de::Error>::invalid_length(len, &"a 65536-byte address space")
        })
    }
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreState {
    /// Creates a machine with zeroed registers, latch and memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::default(),
            latch: ImmediateLatch::default(),
            memory: new_address_space(),
        }
    }

    /// Clears registers and latch. The memory image is preserved.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::default();
        self.latch = ImmediateLatch::default();
    }

    /// Copies `image` into memory starting at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::OutOfBounds`] when the image does not fit below
    /// the end of memory. Nothing is written in that case.
    pub fn load_image(&mut self, origin: u16, image: &[u8]) -> Result<(), FaultCode> {
        write_block(self.memory.as_mut_slice(), origin, image)?;
        tracing::debug!(origin, len = image.len(), "image loaded");
        Ok(())
    }

    /// Fetches the instruction at `PC` into `IR` and the immediate latch.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::OutOfBounds`] when the instruction runs past the
    /// end of memory.
    pub fn fetch(&mut self) -> Result<(), FaultCode> {
        fetch(self).map(|_| ())
    }

    /// Executes the instruction held in `IR`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnresolvedAddress`] for a store through the
    /// immediate-constant method.
    pub fn execute(&mut self) -> Result<(), FaultCode> {
        execute(self)
    }

    /// Runs one driver step: halt check, then fetch and execute.
    ///
    /// # Errors
    ///
    /// Propagates the fault raised by fetch or execute.
    pub fn step(&mut self, config: &CoreConfig) -> Result<StepOutcome, FaultCode> {
        let pc = self.regs.pc();
        if read_byte_checked(self.memory.as_slice(), usize::from(pc))? == config.halt_opcode {
            return Ok(StepOutcome::Halted { pc });
        }

        self.fetch()?;
        let opcode = self.regs.ir();
        self.execute()?;
        Ok(StepOutcome::Retired { pc, opcode })
    }

    /// Steps until halt, fault or the configured step limit.
    pub fn run(&mut self, config: &CoreConfig) -> RunOutcome {
        self.run_traced(config, &mut NoopTraceSink)
    }

    /// Like [`Self::run`], reporting every boundary to `sink`.
    pub fn run_traced(&mut self, config: &CoreConfig, sink: &mut dyn TraceSink) -> RunOutcome {
        let mut steps = 0_u64;
        let stop = loop {
            if config.max_steps.is_some_and(|limit| steps >= limit) {
                break StopReason::StepLimit;
            }

            match self.step(config) {
                Ok(StepOutcome::Retired { pc, opcode }) => {
                    steps += 1;
                    sink.on_event(TraceEvent::InstructionRetired {
                        pc,
                        opcode,
                        regs: self.regs,
                    });
                }
                Ok(StepOutcome::Halted { pc }) => {
                    sink.on_event(TraceEvent::Halted { pc });
                    break StopReason::Halted;
                }
                Err(cause) => {
                    let pc = self.regs.pc();
                    tracing::warn!(%cause, class = ?cause.class(), pc, "fault raised");
                    sink.on_event(TraceEvent::FaultRaised { cause, pc });
                    break StopReason::Fault(cause);
                }
            }
        };

        tracing::debug!(steps, ?stop, "run stopped");
        RunOutcome { steps, stop }
    }

    /// Snapshots registers and the memory cells at `watch`.
    #[must_use]
    pub fn report(&self, watch: &[u16]) -> StateReport {
        StateReport::capture(self, watch)
    }
}

/// Result of one driver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// An instruction was fetched and executed.
    Retired {
        /// Address the instruction was fetched from.
        pc: u16,
        /// Opcode byte of the retired instruction.
        opcode: u8,
    },
    /// The halt opcode sits at `PC`; nothing was fetched.
    Halted {
        /// Address of the halt opcode.
        pc: u16,
    },
}

/// Why a run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The halt opcode was reached.
    Halted,
    /// `CoreConfig::max_steps` instructions retired.
    StepLimit,
    /// Fetch or execute faulted.
    Fault(FaultCode),
}

/// Aggregated outcome of [`CoreState::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of instructions retired.
    pub steps: u64,
    /// Stop condition observed.
    pub stop: StopReason,
}

/// Events emitted at instruction boundaries by [`CoreState::run_traced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// An instruction retired.
    InstructionRetired {
        /// Address the instruction was fetched from.
        pc: u16,
        /// Opcode byte.
        opcode: u8,
        /// Register file after execution.
        regs: RegisterFile,
    },
    /// The halt opcode was reached.
    Halted {
        /// Address of the halt opcode.
        pc: u16,
    },
    /// A fault stopped the run.
    FaultRaised {
        /// Fault raised.
        cause: FaultCode,
        /// `PC` when the fault was observed.
        pc: u16,
    },
}

/// Sink trait for run-loop trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        CoreConfig, CoreState, RunOutcome, StepOutcome, StopReason, TraceEvent,
        DEFAULT_HALT_OPCODE,
    };
    use crate::FaultCode;

    #[test]
    fn default_config_halts_on_0x19_without_limit() {
        let config = CoreConfig::default();
        assert_eq!(config.halt_opcode, DEFAULT_HALT_OPCODE);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn new_state_allocates_full_zeroed_address_space() {
        let state = CoreState::new();
        assert_eq!(state.memory.len(), usize::from(u16::MAX) + 1);
        assert!(state.memory.iter().all(|byte| *byte == 0));
        assert_eq!(state.regs.pc(), 0);
    }

    #[test]
    fn reset_clears_registers_and_keeps_memory() {
        let mut state = CoreState::new();
        state.memory[0x1234] = 0xAD;
        state.regs.set_acc(0x55);
        state.regs.set_pc(0x4567);
        state.latch.set_pair(0x12, 0x34);

        state.reset();

        assert_eq!(state.regs.acc(), 0);
        assert_eq!(state.regs.pc(), 0);
        assert_eq!(state.latch.word(), 0);
        assert_eq!(state.memory[0x1234], 0xAD);
    }

    #[test]
    fn image_past_end_of_memory_is_rejected_untouched() {
        let mut state = CoreState::new();
        assert_eq!(
            state.load_image(0xFFFF, &[0x01, 0x02]),
            Err(FaultCode::OutOfBounds)
        );
        assert_eq!(state.memory[0xFFFF], 0x00);
        state
            .load_image(0xFFFF, &[0x01])
            .expect("one byte fits at the last cell");
        assert_eq!(state.memory[0xFFFF], 0x01);
    }

    #[test]
    fn step_reports_halt_without_fetching() {
        let mut state = CoreState::new();
        state.load_image(0x0000, &[0x19]).expect("image fits");

        let outcome = state.step(&CoreConfig::default());

        assert_eq!(outcome, Ok(StepOutcome::Halted { pc: 0x0000 }));
        assert_eq!(state.regs.pc(), 0x0000);
        assert_eq!(state.regs.ir(), 0x00);
    }

    #[test]
    fn custom_halt_opcode_lets_0x19_execute_as_branch() {
        let mut state = CoreState::new();
        // BRZ 0x0040 with ACC=0 jumps.
        state
            .load_image(0x0000, &[0x19, 0x00, 0x40])
            .expect("image fits");
        let config = CoreConfig {
            halt_opcode: 0xFF,
            ..CoreConfig::default()
        };

        let outcome = state.step(&config);

        assert_eq!(
            outcome,
            Ok(StepOutcome::Retired {
                pc: 0x0000,
                opcode: 0x19
            })
        );
        assert_eq!(state.regs.pc(), 0x0040);
    }

    #[test]
    fn run_stops_at_step_limit() {
        let mut state = CoreState::new();
        // BRA 0x0000 loops forever.
        state
            .load_image(0x0000, &[0x10, 0x00, 0x00])
            .expect("image fits");
        let config = CoreConfig {
            max_steps: Some(5),
            ..CoreConfig::default()
        };

        assert_eq!(
            state.run(&config),
            RunOutcome {
                steps: 5,
                stop: StopReason::StepLimit
            }
        );
    }

    #[test]
    fn run_stops_at_first_fault() {
        let mut state = CoreState::new();
        // LOAD ACC, #0x07 ; STORE ACC, #0x00
        state
            .load_image(0x0000, &[0x09, 0x07, 0x01, 0x00])
            .expect("image fits");

        let outcome = state.run(&CoreConfig::default());

        assert_eq!(outcome.steps, 1);
        assert_eq!(
            outcome.stop,
            StopReason::Fault(FaultCode::UnresolvedAddress)
        );
        assert_eq!(state.regs.acc(), 0x07);
    }

    #[test]
    fn fetch_running_off_the_end_faults() {
        let mut state = CoreState::new();
        state.regs.set_pc(0xFFFE);
        state.memory[0xFFFE] = 0x10;

        let outcome = state.run(&CoreConfig::default());

        assert_eq!(outcome.stop, StopReason::Fault(FaultCode::OutOfBounds));
        assert_eq!(state.regs.pc(), 0xFFFE);
    }

    #[test]
    fn traced_run_records_each_boundary() {
        let mut state = CoreState::new();
        // LOAD ACC, #0x05 ; HALT
        state
            .load_image(0x0000, &[0x09, 0x05, 0x19])
            .expect("image fits");
        let mut events = Vec::new();

        let outcome = state.run_traced(&CoreConfig::default(), &mut events);

        assert_eq!(outcome.stop, StopReason::Halted);
        assert_eq!(events.len(), 2);
        match events[0] {
            TraceEvent::InstructionRetired { pc, opcode, regs } => {
                assert_eq!(pc, 0x0000);
                assert_eq!(opcode, 0x08);
                assert_eq!(regs.acc(), 0x05);
                assert_eq!(regs.pc(), 0x0002);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[1], TraceEvent::Halted { pc: 0x0002 });
    }

    #[test]
    fn halt_check_on_last_address_reads_in_bounds() {
        let mut state = CoreState::new();
        state.memory[0xFFFF] = DEFAULT_HALT_OPCODE;
        state.regs.set_pc(0xFFFF);

        assert_eq!(
            state.step(&CoreConfig::default()),
            Ok(StepOutcome::Halted { pc: 0xFFFF })
        );
    }

    proptest! {
        #[test]
        fn step_from_any_pc_returns_an_outcome(pc in any::<u16>(), opcode in any::<u8>(), fill in any::<u8>()) {
            let mut state = CoreState::new();
            state.memory.fill(fill);
            state.memory[usize::from(pc)] = opcode;
            state.regs.set_pc(pc);

            let config = CoreConfig { max_steps: Some(4), ..CoreConfig::default() };
            let outcome = state.run(&config);

            prop_assert!(outcome.steps <= 4);
            if outcome.stop == StopReason::Halted {
                prop_assert_eq!(state.memory[usize::from(state.regs.pc())], DEFAULT_HALT_OPCODE);
            }
        }
    }
}
