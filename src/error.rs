use std::io;
use thiserror::Error;

/// Everything that can go wrong while loading or running a CHIP-8 program.
///
/// Only some of these stop the machine; see [`Chip8Error::is_fatal`].
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("stack overflow: CALL at {addr:#05x} nested deeper than 16 levels")]
    StackOverflow { addr: u16 },

    #[error("stack underflow: RET at {addr:#05x} with an empty call stack")]
    StackUnderflow { addr: u16 },

    #[error("address {addr:#06x} is outside memory")]
    OutOfBounds { addr: usize },

    #[error("undefined instruction {word:#06x} at {addr:#05x}")]
    UndefinedOpcode { addr: u16, word: u16 },

    #[error("program is {size} bytes but only {max} fit in memory")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("sound error: {0}")]
    Sound(String),
}

impl Chip8Error {
    /// whether the session can carry on after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Chip8Error::OutOfBounds { .. } | Chip8Error::UndefinedOpcode { .. }
        )
    }
}
