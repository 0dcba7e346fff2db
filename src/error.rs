//! Error types for the VM. `Fault` is what a single instruction can run into;
//! `ExecError` ties a fault to the instruction and address that raised it and
//! is what ends a run. `LoadError` is reported before anything executes.

use std::io;
use thiserror::Error;

/// fatal conditions raised while executing one instruction
#[derive(Debug, Error)]
pub enum Fault {
    #[error("unknown opcode")]
    UnknownOpcode,

    #[error("stack overflow: all {0} frames in use")]
    StackOverflow(usize),

    #[error("stack underflow: return with an empty stack")]
    StackUnderflow,

    #[error("call or jump target {0:#05x} is outside program memory")]
    CallTargetOutOfRange(u16),

    #[error("BCD target {0:#05x} runs past the end of memory")]
    BcdTargetOutOfRange(u16),

    #[error("memory access of {len} byte(s) at {address:#05x} runs past the end of memory")]
    MemoryOutOfRange { address: u16, len: usize },

    #[error("program counter {0:#05x} is past the last instruction slot")]
    PcOutOfRange(u16),

    #[error("display failed: {0}")]
    Render(#[from] io::Error),
}

/// a fault, plus where it happened
#[derive(Debug, Error)]
#[error("{fault} (instruction {word:#06x} at {address:#05x})")]
pub struct ExecError {
    pub address: u16,
    pub word: u16,
    #[source]
    pub fault: Fault,
}

impl ExecError {
    pub fn new(address: u16, word: u16, fault: Fault) -> Self {
        ExecError {
            address,
            word,
            fault,
        }
    }
}

/// reasons a program can't be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("line {line}: expected a single 16-bit hex word, got {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("program is {size} bytes, only {max} bytes fit above the load address")]
    TooLarge { size: usize, max: usize },

    #[error("can't read program: {0}")]
    Io(#[from] io::Error),
}
