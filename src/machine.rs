//! The VM's storage: the register file, the call stack, memory and the
//! framebuffer, plus the two timers. Everything mutable lives in one
//! `Machine`; the only bits handed to other threads are the timers, which
//! are shared through `Arc`.

use crate::display::FrameBuffer;
use crate::error::Fault;
use crate::memory::{Memory, CHIP8_PROGRAM_ADDR};
use crate::nibble::U4;
use crate::timer::Timer;
use std::sync::Arc;

/// how many return addresses the stack holds
pub const CHIP8_STACK_DEPTH: usize = 16;

/// V0-VF plus I and the program counter. VF doubles as the flag register
/// for carry, borrow, shift-out and sprite collision
pub struct Registers {
    v: [u8; 16],
    pub i: u16,
    pub pc: u16,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; 16],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
        }
    }

    pub fn get(&self, reg: U4) -> u8 {
        self.v[reg.index()]
    }

    pub fn set(&mut self, reg: U4, value: u8) {
        self.v[reg.index()] = value;
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.v[U4::F.index()] = flag as u8;
    }

    /// V0-VF as a slice, for comparing whole register files
    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// fixed-depth stack of return addresses. over- and underflow are faults
pub struct Stack {
    frames: [u16; CHIP8_STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            frames: [0; CHIP8_STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        if self.sp == CHIP8_STACK_DEPTH {
            return Err(Fault::StackOverflow(CHIP8_STACK_DEPTH));
        }
        self.frames[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.frames[self.sp])
    }

    /// number of frames in use
    pub fn depth(&self) -> usize {
        self.sp
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

/// all the state of one VM. built fresh for every run; there's no reset
pub struct Machine {
    pub registers: Registers,
    pub stack: Stack,
    pub memory: Memory,
    pub frame: FrameBuffer,
    pub delay_timer: Arc<Timer>,
    pub sound_timer: Arc<Timer>,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            registers: Registers::new(),
            stack: Stack::new(),
            memory: Memory::new(),
            frame: FrameBuffer::new(),
            delay_timer: Arc::new(Timer::new()),
            sound_timer: Arc::new(Timer::new()),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
