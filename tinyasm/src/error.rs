use std::path::PathBuf;

use tiny_expr::ExprError;

#[derive(Debug, thiserror::Error)]
pub enum AsmError {
    /// Recovered from by annotating the listing and moving on.
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("output needs {needed:#X} bytes but the image is capped at {capacity:#X}")]
    Capacity { needed: usize, capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("Value '{0}' not a number")]
    NotANumber(String),
    #[error("Value '{0}' out of range")]
    OutOfRange(String),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error("Unknown: {0}")]
    InvalidInstruction(String),
    #[error("expected {exp} operands, got {got}")]
    InvalidArgCount { exp: usize, got: usize },
    #[error("unknown fuse '{0}'")]
    UnknownFuse(String),
    #[error("r{0} is not a register")]
    Register(i32),
    #[error("r{0} is not one of r16..r31")]
    UpperRegister(i32),
    #[error("r{0} is not one of r24, r26, r28, r30")]
    RegisterPair(i32),
    #[error("bit {0} is not one of 0..7")]
    Bit(i32),
    #[error("I/O address {0} out of range")]
    IoAddress(i32),
    #[error("data address {0} out of range")]
    DataAddress(i32),
    #[error("immediate {0} out of range")]
    Immediate(i32),
    #[error("branch offset {0} out of range")]
    BranchRange(i64),
    #[error("bad addressing mode '{0}'")]
    AddressingMode(String),
    #[error("malformed equate '{0}'")]
    Equate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("record {record}: bad hex digit")]
    Digit { record: usize },
    #[error("record {record}: truncated")]
    Truncated { record: usize },
    #[error("record {record}: checksum mismatch")]
    Checksum { record: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("unknown device type: {0}")]
    Unknown(String),
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
