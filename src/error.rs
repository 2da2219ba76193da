use std::collections::HashMap;

use crate::processor::StateSnapshot;

/// The leaf cause of a failure encountered while decoding or executing an instruction.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ErrorDetail {
    #[error("an unrecognised opcode {opcode:#06X} was decoded")]
    UnknownInstruction { opcode: u16 },
    #[error("opcode {opcode:#06X} is not implemented for the active dialect")]
    UnimplementedInstruction { opcode: u16 },
    #[error("operand(s) out of bounds: {operands:?}")]
    OperandsOutOfBounds { operands: HashMap<String, usize> },
    #[error("attempted to pop from an empty stack")]
    PopEmptyStack,
    #[error("attempted to push to a full stack")]
    PushFullStack,
    #[error("key {key} is not a valid CHIP-8 key")]
    InvalidKey { key: u8 },
    #[error("error handling file {file_path}")]
    FileError { file_path: String },
    #[error("an unknown error occurred")]
    UnknownError,
}

/// A failure together with a dump of machine state captured at the moment of failure.
///
/// Hosting applications can log [ChipolataError::state_snapshot_dump] alongside
/// [ChipolataError::inner_error] to aid diagnosis without needing to separately
/// query the processor after it has already moved to
/// [ProcessorStatus::Crashed](crate::processor::ProcessorStatus::Crashed).
#[derive(Clone, Debug, PartialEq)]
pub struct ChipolataError {
    pub state_snapshot_dump: StateSnapshot,
    pub inner_error: ErrorDetail,
}

impl std::fmt::Display for ChipolataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chipolata crashed at cycle {}: {}",
            self.state_snapshot_dump.cycles, self.inner_error
        )
    }
}

impl std::error::Error for ChipolataError {}

impl ChipolataError {
    pub(crate) fn new(state_snapshot_dump: StateSnapshot, inner_error: ErrorDetail) -> Self {
        ChipolataError {
            state_snapshot_dump,
            inner_error,
        }
    }
}
