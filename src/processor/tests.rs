use super::*;
use crate::dialect::Dialect;
use crate::program::Program;

fn setup(dialect: Dialect, program_data: Vec<u8>) -> Processor {
    let options = Options::new(720, dialect);
    Processor::initialise_and_load(Program::new(program_data), options).unwrap()
}

fn chip8() -> Dialect {
    Dialect::Chip8 {
        memory_limit_2k: false,
        variable_cycle_timing: false,
    }
}

#[test]
fn test_00e0_clears_display() {
    let mut processor = setup(chip8(), vec![0x00, 0xE0]);
    processor.frame_buffer.draw_byte(0, 0, 0, 0xFF, false);
    processor.execute_cycle().unwrap();
    assert!(!processor.frame_buffer.pixel(0, 0, 0));
}

#[test]
fn test_1nnn_jumps() {
    let mut processor = setup(chip8(), vec![0x12, 0x34]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.program_counter, 0x234);
}

#[test]
fn test_2nnn_and_00ee_round_trip() {
    let mut processor = setup(chip8(), vec![0x22, 0x04, 0x00, 0x00, 0x00, 0xEE]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.program_counter, 0x204);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.program_counter, 0x202);
}

#[test]
fn test_6xnn_sets_register() {
    let mut processor = setup(chip8(), vec![0x60, 0xAB]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.variable_registers[0], 0xAB);
}

#[test]
fn test_8xy4_sets_carry_on_overflow() {
    let mut processor = setup(chip8(), vec![0x80, 0x14]);
    processor.variable_registers[0] = 0xFF;
    processor.variable_registers[1] = 0x02;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.variable_registers[0], 0x01);
    assert_eq!(processor.variable_registers[0xF], 1);
}

#[test]
fn test_8xy6_shift_vx_quirk_toggles_source() {
    let mut schip = setup(Dialect::SuperChipLegacy, vec![0x80, 0x16]);
    schip.variable_registers[0] = 0b0000_0011;
    schip.execute_cycle().unwrap();
    assert_eq!(schip.variable_registers[0], 0b0000_0001);
    assert_eq!(schip.variable_registers[0xF], 1);

    let mut classic = setup(chip8(), vec![0x80, 0x16]);
    classic.variable_registers[1] = 0b0000_0010;
    classic.execute_cycle().unwrap();
    assert_eq!(classic.variable_registers[0], 0b0000_0001);
}

#[test]
fn test_annn_sets_index_register() {
    let mut processor = setup(chip8(), vec![0xA3, 0x00]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.index_register, 0x300);
}

#[test]
fn test_fx33_writes_binary_coded_decimal() {
    let mut processor = setup(chip8(), vec![0xF0, 0x33]);
    processor.variable_registers[0] = 156;
    processor.index_register = 0x300;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.memory.read_byte(0x300), 1);
    assert_eq!(processor.memory.read_byte(0x301), 5);
    assert_eq!(processor.memory.read_byte(0x302), 6);
}

#[test]
fn test_fx55_fx65_round_trip_and_index_advance() {
    let mut processor = setup(chip8(), vec![0xF1, 0x55]);
    processor.variable_registers[0] = 0x11;
    processor.variable_registers[1] = 0x22;
    processor.index_register = 0x300;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.index_register, 0x302);
    assert_eq!(processor.memory.read_byte(0x300), 0x11);
    assert_eq!(processor.memory.read_byte(0x301), 0x22);
}

#[test]
fn test_fx55_idx_reg_no_inc_quirk_leaves_index_unchanged() {
    let mut processor = setup(Dialect::SuperChipLegacy, vec![0xF1, 0x55]);
    processor.index_register = 0x300;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.index_register, 0x300);
}

#[test]
fn test_fx0a_blocks_and_resumes_on_keypress() {
    let mut processor = setup(chip8(), vec![0xF0, 0x0A]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.status, ProcessorStatus::WaitingForKeypress);
    assert_eq!(processor.program_counter, 0x200);
    processor.set_key_status(0x7, true).unwrap();
    assert_eq!(processor.status, ProcessorStatus::Running);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.variable_registers[0], 0x7);
}

#[test]
fn test_00fd_marks_completed() {
    let mut processor = setup(Dialect::SuperChipLegacy, vec![0x00, 0xFD]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.status, ProcessorStatus::Completed);
}

#[test]
fn test_bnnn_vx_relative_on_superchip_legacy() {
    let mut processor = setup(Dialect::SuperChipLegacy, vec![0xB2, 0x00]);
    processor.variable_registers[2] = 0x10;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.program_counter, 0x210);
}

#[test]
fn test_bnnn_v0_relative_on_classic_chip8() {
    let mut processor = setup(chip8(), vec![0xB2, 0x00]);
    processor.variable_registers[0] = 0x10;
    processor.execute_cycle().unwrap();
    assert_eq!(processor.program_counter, 0x210);
}

#[test]
fn test_fn01_xochip_selects_plane_mask() {
    let mut processor = setup(Dialect::XoChip, vec![0xF3, 0x01]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.plane_mask, 0x3);
}

#[test]
fn test_f000_loads_wide_address_and_advances_four_bytes() {
    let mut processor = setup(Dialect::XoChip, vec![0xF0, 0x00, 0x12, 0x34]);
    processor.execute_cycle().unwrap();
    assert_eq!(processor.index_register, 0x1234);
    assert_eq!(processor.program_counter, 0x204);
}

#[test]
fn test_unknown_opcode_produces_chipolata_error_with_snapshot() {
    let mut processor = setup(chip8(), vec![0x50, 0x02]);
    let error = processor.execute_cycle().unwrap_err();
    assert_eq!(error.state_snapshot_dump.status, ProcessorStatus::Crashed);
    assert_eq!(
        error.inner_error,
        ErrorDetail::UnknownInstruction { opcode: 0x5002 }
    );
}

#[test]
fn test_execute_frame_honours_flat_cycle_budget() {
    // A tight loop (jump back to self) run for one frame's slice must return control rather
    // than spinning forever, bounded by the flat cycles-per-frame budget.
    let mut processor = setup(chip8(), vec![0x12, 0x00]);
    let interrupt = processor.execute_frame().unwrap();
    assert_eq!(interrupt, Interrupt::None);
    assert!(processor.cycles > 0);
}
