use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load program: {0}")]
    LoadError(#[from] LoadError),

    #[error("CPU execution error: {0}")]
    ExecutionError(#[from] ExecutionError),

    #[error("Memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors raised while turning assembly text into a program
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read program file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    #[error("Line {line}: missing operand for {opcode}")]
    MissingOperand { line: usize, opcode: String },

    #[error("Line {line}: malformed operand '{token}'")]
    MalformedOperand { line: usize, token: String },

    #[error("Line {line}: register R{index} out of range")]
    RegisterOutOfRange { line: usize, index: u32 },

    #[error("Line {line}: branch to undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },

    #[error("Line {line}: label '{label}' defined twice")]
    DuplicateLabel { line: usize, label: String },
}

/// Errors related to CPU execution
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Cycle limit reached: {0} cycles")]
    CycleLimitReached(u64),

    #[error("No program loaded")]
    NoProgram,

    #[error("General purpose register R{0} does not exist")]
    RegisterOutOfRange(usize),
}

/// Errors related to memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Memory access error at address {address:#010x}: {kind}")]
    AccessError { address: u32, kind: MemoryErrorKind },
}

/// Specific kinds of memory errors
#[derive(Error, Debug)]
pub enum MemoryErrorKind {
    #[error("Address outside data memory (size {0:#x})")]
    OutOfBounds(usize),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
