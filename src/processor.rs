#![allow(non_snake_case)]

use std::time::{Duration, Instant};

use rand::Rng;

use crate::audio::AudioState;
use crate::dialect::{Dialect, Quirks, Resolution};
use crate::display::Display;
use crate::error::{ChipolataError, ErrorDetail};
use crate::font::Font;
use crate::instruction::Instruction;
use crate::interrupt::Interrupt;
use crate::keystate::KeyState;
use crate::memory::Memory;
use crate::options::Options;
use crate::program::Program;
use crate::stack::Stack;

pub(crate) mod execute;
#[cfg(test)]
mod tests;
#[cfg(test)]
mod timing_tests;

/// The default CHIP-8 font start address within memory.
const DEFAULT_FONT_ADDRESS: u16 = 0x50;
/// The default SUPER-CHIP/MEGACHIP high-resolution font start address within memory.
const DEFAULT_HIGH_RESOLUTION_FONT_ADDRESS: u16 = 0xA0;
/// The number of microseconds that should pass between decrements of the delay and sound
/// timers (60Hz).
const TIMER_DECREMENT_INTERVAL_MICROSECONDS: u128 = 16667;
/// The number of variable registers available.
const VARIABLE_REGISTER_COUNT: usize = 16;
/// The number of RPL ("permanent") registers available on SUPER-CHIP-family dialects.
pub(crate) const RPL_REGISTER_COUNT: usize = 16;
/// A rough approximation of a COSMAC VIP machine-cycle count per emulated CHIP-8 cycle, used
/// to compute historically-variable cycle timing.
pub(crate) const COSMAC_VIP_MACHINE_CYCLES_PER_CYCLE: u64 = 8;

/// An enum used internally to track processor execution status.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessorStatus {
    /// The processor has been instantiated but memory is empty.
    StartingUp,
    /// The processor has been instantiated and font data loaded.
    Initialised,
    /// A program has been loaded into the processor's memory.
    ProgramLoaded,
    /// The program is being executed (the fetch->decode->execute cycle has begun).
    Running,
    /// The processor is stalled waiting for a keypress (`FX0A`).
    WaitingForKeypress,
    /// The interpreter has been asked to exit (SUPER-CHIP `00FD`).
    Completed,
    /// The processor is in an unrecoverable error state, having generated a [ChipolataError].
    Crashed,
}

/// A snapshot of complete Chipolata machine state, returned to hosting applications for
/// rendering, diagnosis, or persistence.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    pub frame_buffer: Display,
    pub status: ProcessorStatus,
    pub stack: Stack,
    pub memory: Memory,
    pub program_counter: u16,
    pub index_register: u16,
    pub variable_registers: [u8; VARIABLE_REGISTER_COUNT],
    pub rpl_registers: [u8; RPL_REGISTER_COUNT],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub cycles: u64,
    pub resolution: Resolution,
    pub dialect: Dialect,
    pub audio: AudioState,
}

/// An abstraction of the CHIP-8 (family) processor, and the core public interface to the
/// Chipolata crate.
///
/// This struct holds representations of all sub-components, and exposes methods through which
/// a program can be loaded to memory and executed one frame at a time, as well as methods for
/// supplying input (keypresses) and reading output (a frame buffer) to/from a hosting
/// application.
pub struct Processor {
    pub(crate) frame_buffer: Display,
    pub(crate) stack: Stack,
    pub(crate) memory: Memory,
    pub(crate) program_counter: u16,
    pub(crate) index_register: u16,
    pub(crate) variable_registers: [u8; VARIABLE_REGISTER_COUNT],
    pub(crate) rpl_registers: [u8; RPL_REGISTER_COUNT],
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) cycles: u64,
    pub(crate) keystate: KeyState,
    pub(crate) audio: AudioState,
    pub(crate) status: ProcessorStatus,
    last_timer_decrement: Instant,
    pub(crate) plane_mask: u8,
    pub(crate) pattern: [u8; 16],
    pub(crate) pattern_pitch: u8,
    pub(crate) font: Font,
    pub(crate) high_resolution_font: Option<Font>,
    program: Program,
    pub(crate) font_start_address: u16,
    pub(crate) high_resolution_font_start_address: u16,
    program_start_address: u16,
    pub(crate) processor_speed_hertz: u64,
    pub(crate) dialect: Dialect,
    pub(crate) quirks: Quirks,
    /// MEGACHIP manual-refresh texture geometry/compositing state, set by `03NN`/`04NN`/
    /// `080N`/`09NN` and consulted by `DXYN`.
    pub(crate) texture_width: usize,
    pub(crate) texture_height: usize,
    pub(crate) texture_opacity: u8,
    pub(crate) texture_collide: u8,
}

impl Processor {
    /// Constructor/builder function that returns a freshly-initialised [Processor] instance
    /// with `program` loaded into memory ready for execution, configured per `options`.
    pub fn initialise_and_load(program: Program, options: Options) -> Result<Processor, ErrorDetail> {
        let dialect = options.dialect;
        let quirks = Quirks::for_dialect(dialect);
        let mut processor = Processor {
            frame_buffer: Display::new(dialect.plane_count(), dialect.default_resolution()),
            stack: Stack::new(dialect),
            memory: Memory::new(dialect),
            program_counter: options.program_start_address,
            index_register: 0,
            variable_registers: [0; VARIABLE_REGISTER_COUNT],
            rpl_registers: [0; RPL_REGISTER_COUNT],
            delay_timer: 0,
            sound_timer: 0,
            cycles: 0,
            keystate: KeyState::new(),
            audio: AudioState::default(),
            status: ProcessorStatus::StartingUp,
            last_timer_decrement: Instant::now(),
            plane_mask: 0x1,
            pattern: [0; 16],
            pattern_pitch: 64,
            font: Font::default_low_resolution(),
            high_resolution_font: if matches!(
                dialect,
                Dialect::SuperChipLegacy | Dialect::XoChip | Dialect::MegaChip
            ) {
                Some(Font::default_high_resolution())
            } else {
                None
            },
            program,
            font_start_address: DEFAULT_FONT_ADDRESS,
            high_resolution_font_start_address: DEFAULT_HIGH_RESOLUTION_FONT_ADDRESS,
            program_start_address: options.program_start_address,
            processor_speed_hertz: options.processor_speed_hertz,
            dialect,
            quirks,
            texture_width: 256,
            texture_height: 256,
            texture_opacity: 0xFF,
            texture_collide: 0,
        };
        processor.load_font()?;
        processor.status = ProcessorStatus::Initialised;
        processor.load_program()?;
        processor.status = ProcessorStatus::ProgramLoaded;
        Ok(processor)
    }

    fn load_font(&mut self) -> Result<(), ErrorDetail> {
        self.memory
            .write_bytes(self.font_start_address, self.font.font_data());
        if let Some(font) = &self.high_resolution_font {
            self.memory
                .write_bytes(self.high_resolution_font_start_address, font.font_data());
        }
        Ok(())
    }

    fn load_program(&mut self) -> Result<(), ErrorDetail> {
        self.memory
            .write_bytes(self.program_start_address, self.program.program_data());
        Ok(())
    }

    /// Returns the duration a single emulated cycle costing `cycles` COSMAC machine-cycles
    /// should take, honouring [Dialect::variable_cycle_timing] where applicable.
    pub(crate) fn calculate_cycle_duration(&self, cosmac_machine_cycles: u64) -> Duration {
        if self.dialect.variable_cycle_timing() {
            Duration::from_micros(
                cosmac_machine_cycles * COSMAC_VIP_MACHINE_CYCLES_PER_CYCLE * 1_000_000
                    / self.processor_speed_hertz,
            )
        } else {
            Duration::from_micros(1_000_000 / self.processor_speed_hertz)
        }
    }

    /// Decrements the delay and sound timers if at least one 60Hz tick has elapsed since they
    /// were last decremented.
    fn decrement_timers(&mut self) {
        if self.last_timer_decrement.elapsed().as_micros() >= TIMER_DECREMENT_INTERVAL_MICROSECONDS
        {
            self.delay_timer = self.delay_timer.saturating_sub(1);
            self.sound_timer = self.sound_timer.saturating_sub(1);
            self.last_timer_decrement = Instant::now();
        }
    }

    /// Fetches, decodes and executes a single instruction, returning the number of COSMAC
    /// machine cycles it cost and any [Interrupt] raised.
    pub fn execute_cycle(&mut self) -> Result<u64, ChipolataError> {
        self.status = ProcessorStatus::Running;
        self.decrement_timers();
        let opcode = self.memory.read_two_bytes(self.program_counter);
        let instruction = match Instruction::decode_from(opcode) {
            Ok(instruction) => instruction,
            Err(inner_error) => return Err(self.crash(inner_error)),
        };
        self.program_counter = self
            .program_counter
            .wrapping_add(instruction.length_bytes());
        match self.dispatch(instruction) {
            Ok((cycles, _interrupt)) => {
                self.cycles += 1;
                Ok(cycles)
            }
            Err(inner_error) => Err(self.crash(inner_error)),
        }
    }

    /// Runs [Processor::execute_cycle] repeatedly until either the current frame's cycle
    /// budget is exhausted or a non-[Interrupt::None] interrupt is raised, whichever comes
    /// first. This is the loop a [TimingWorker](crate::timing::TimingWorker) calls once per
    /// paced frame tick.
    pub fn execute_frame(&mut self) -> Result<Interrupt, ChipolataError> {
        let target_cpf = self.target_cycles_per_frame();
        let target_cosmac_cpf = self.target_cosmac_cycles_per_frame();
        let mut cycles_this_frame: u64 = 0;
        let mut cosmac_cycles_this_frame: u64 = 0;
        loop {
            let opcode = self.memory.read_two_bytes(self.program_counter);
            let instruction = match Instruction::decode_from(opcode) {
                Ok(instruction) => instruction,
                Err(inner_error) => return Err(self.crash(inner_error)),
            };
            self.program_counter = self
                .program_counter
                .wrapping_add(instruction.length_bytes());
            let (cosmac_cycles, interrupt) = match self.dispatch(instruction) {
                Ok(result) => result,
                Err(inner_error) => return Err(self.crash(inner_error)),
            };
            self.cycles += 1;
            cycles_this_frame += 1;
            cosmac_cycles_this_frame += cosmac_cycles;
            self.decrement_timers();
            if interrupt != Interrupt::None {
                return Ok(interrupt);
            }
            if !self.dialect.variable_cycle_timing() && cycles_this_frame >= target_cpf {
                return Ok(Interrupt::None);
            }
            if self.dialect.variable_cycle_timing() && cosmac_cycles_this_frame >= target_cosmac_cpf
            {
                return Ok(Interrupt::None);
            }
        }
    }

    fn target_cycles_per_frame(&self) -> u64 {
        std::cmp::max(1, self.processor_speed_hertz / 60)
    }

    /// The per-opcode COSMAC-cycle-cost budget a variable-timing dialect's frame slice
    /// accumulates against, derived the same way [Processor::calculate_cycle_duration] turns a
    /// cost back into wall-clock duration (so one frame's worth of accumulated cost takes
    /// roughly 1/60s to execute at `processor_speed_hertz`).
    fn target_cosmac_cycles_per_frame(&self) -> u64 {
        std::cmp::max(
            1,
            self.processor_speed_hertz / (60 * COSMAC_VIP_MACHINE_CYCLES_PER_CYCLE),
        )
    }

    fn crash(&mut self, inner_error: ErrorDetail) -> ChipolataError {
        self.status = ProcessorStatus::Crashed;
        ChipolataError::new(self.export_state_snapshot(), inner_error)
    }

    /// Sets the state of the specified key (0x0-0xF) on player one's keypad.
    pub fn set_key_status(&mut self, key: u8, pressed: bool) -> Result<(), ErrorDetail> {
        self.keystate.set_key_status(key, pressed)?;
        if pressed && self.status == ProcessorStatus::WaitingForKeypress {
            self.status = ProcessorStatus::Running;
        }
        Ok(())
    }

    /// Sets the state of the specified key (0x0-0xF) on player two's keypad (CHIP-8X only).
    pub fn set_key_status_player_two(&mut self, key: u8, pressed: bool) -> Result<(), ErrorDetail> {
        self.keystate.set_key_status_player_two(key, pressed)
    }

    /// Exports a complete [StateSnapshot] of current machine state.
    pub fn export_state_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            frame_buffer: self.frame_buffer.clone(),
            status: self.status,
            stack: self.stack.clone(),
            memory: self.memory.clone(),
            program_counter: self.program_counter,
            index_register: self.index_register,
            variable_registers: self.variable_registers,
            rpl_registers: self.rpl_registers,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            cycles: self.cycles,
            resolution: self.frame_buffer.resolution,
            dialect: self.dialect,
            audio: self.audio.clone(),
        }
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_initialise_and_load_sets_program_loaded_status() {
        let processor =
            Processor::initialise_and_load(Program::default(), Options::default()).unwrap();
        assert_eq!(processor.status, ProcessorStatus::ProgramLoaded);
    }

    #[test]
    fn test_font_is_written_to_memory() {
        let processor =
            Processor::initialise_and_load(Program::default(), Options::default()).unwrap();
        assert_eq!(
            processor.memory.read_byte(DEFAULT_FONT_ADDRESS),
            Font::default_low_resolution().font_data()[0]
        );
    }

    #[test]
    fn test_execute_cycle_advances_program_counter() {
        let program = Program::new(vec![0x00, 0xE0]);
        let mut processor = Processor::initialise_and_load(program, Options::default()).unwrap();
        let start_pc = processor.program_counter;
        processor.execute_cycle().unwrap();
        assert_eq!(processor.program_counter, start_pc + 2);
    }

    #[test]
    fn test_unknown_opcode_crashes_processor() {
        let program = Program::new(vec![0x50, 0x02]);
        let mut processor = Processor::initialise_and_load(program, Options::default()).unwrap();
        assert!(processor.execute_cycle().is_err());
        assert_eq!(processor.status, ProcessorStatus::Crashed);
    }
}
