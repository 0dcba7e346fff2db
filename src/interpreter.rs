//! # interpreter
//!
//! Fetches, decodes and executes one instruction at a time against a
//! [`Machine`]. The program counter always points at the next instruction:
//! every instruction moves it on by 2 bytes, a taken skip by 4, and jumps,
//! calls and returns set it outright.
//!
//! The interpreter talks to the outside world in three places:
//!  * the `Display`, which is handed the framebuffer after every clear and
//!    every sprite draw (once per instruction, not per row)
//!  * the keypad, read for `SKP`/`SKNP` and blocked on for `LD Vx, K`
//!  * the timers, which the speaker thread also reads
//!
//! A jump to its own address is the usual "I'm done" idiom for these
//! programs; it comes back as `Flow::SelfJump` rather than spinning forever.

use crate::decode::{Instruction, Opcode};
use crate::display::{Display, FrameBuffer};
use crate::error::{ExecError, Fault, LoadError};
use crate::keypad::KeypadReader;
use crate::machine::Machine;
use crate::memory::{Memory, MemoryMap, CHIP8_LAST_INSTRUCTION_ADDR, CHIP8_PROGRAM_ADDR};
use crate::nibble::U4;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// what happened in one step
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// carry on with the next instruction
    Next,
    /// jumped to itself; the program will never do anything else
    SelfJump,
    /// gave up waiting for a key because input has gone away
    Cancelled,
}

/// how the program counter moves after an instruction
enum PcUpdate {
    Next,
    Skip,
    Jump(u16),
    Stay(Flow),
}

impl PcUpdate {
    fn skip_if(cond: bool) -> Self {
        if cond {
            PcUpdate::Skip
        } else {
            PcUpdate::Next
        }
    }
}

pub struct Interpreter<D: Display> {
    machine: Machine,
    display: D,
    keypad: KeypadReader,
    rng: StdRng,
}

impl<D: Display> Interpreter<D> {
    pub fn new(display: D, keypad: KeypadReader) -> Self {
        Self::with_rng(display, keypad, StdRng::from_entropy())
    }

    /// same as `new`, but `RND` produces a repeatable sequence
    pub fn with_seed(display: D, keypad: KeypadReader, seed: u64) -> Self {
        Self::with_rng(display, keypad, StdRng::seed_from_u64(seed))
    }

    fn with_rng(display: D, keypad: KeypadReader, rng: StdRng) -> Self {
        Interpreter {
            machine: Machine::new(),
            display,
            keypad,
            rng,
        }
    }

    /// load a chip8 program at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.machine.memory.load_program(program)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// fetch, decode and execute the instruction at the program counter
    pub fn step(&mut self) -> Result<Flow, ExecError> {
        let pc = self.machine.registers.pc;
        let word = self.fetch(pc).map_err(|fault| ExecError::new(pc, 0, fault))?;
        let instr = Instruction::decode(word)
            .ok_or_else(|| ExecError::new(pc, word, Fault::UnknownOpcode))?;
        trace!("{:03x}: {}", pc, instr);
        self.execute(instr)
            .map_err(|fault| ExecError::new(pc, word, fault))
    }

    fn fetch(&self, pc: u16) -> Result<u16, Fault> {
        if pc > CHIP8_LAST_INSTRUCTION_ADDR {
            return Err(Fault::PcOutOfRange(pc));
        }
        self.machine.memory.get_word(pc)
    }

    fn execute(&mut self, instr: Instruction) -> Result<Flow, Fault> {
        let x = instr.x();
        let y = instr.y();
        let kk = instr.kk();
        let nnn = instr.nnn();
        let pc = self.machine.registers.pc;
        let vx = self.machine.registers.get(x);
        let vy = self.machine.registers.get(y);

        let regs = &mut self.machine.registers;
        let update = match instr.opcode {
            Opcode::Cls => {
                self.machine.frame.clear();
                self.display.draw(&self.machine.frame)?;
                PcUpdate::Next
            }
            Opcode::Ret => PcUpdate::Jump(self.machine.stack.pop()?),
            Opcode::Sys => PcUpdate::Next,
            Opcode::Jp => {
                if nnn == pc {
                    PcUpdate::Stay(Flow::SelfJump)
                } else {
                    PcUpdate::Jump(check_target(nnn)?)
                }
            }
            Opcode::Call => {
                let target = check_target(nnn)?;
                self.machine.stack.push(pc + 2)?;
                PcUpdate::Jump(target)
            }
            Opcode::SeImm => PcUpdate::skip_if(vx == kk),
            Opcode::SneImm => PcUpdate::skip_if(vx != kk),
            Opcode::SeReg => PcUpdate::skip_if(vx == vy),
            Opcode::SneReg => PcUpdate::skip_if(vx != vy),
            Opcode::LdImm => {
                regs.set(x, kk);
                PcUpdate::Next
            }
            Opcode::AddImm => {
                regs.set(x, vx.wrapping_add(kk));
                PcUpdate::Next
            }
            Opcode::LdReg => {
                regs.set(x, vy);
                PcUpdate::Next
            }
            Opcode::Or => {
                regs.set(x, vx | vy);
                PcUpdate::Next
            }
            Opcode::And => {
                regs.set(x, vx & vy);
                PcUpdate::Next
            }
            Opcode::Xor => {
                regs.set(x, vx ^ vy);
                PcUpdate::Next
            }
            Opcode::AddReg => {
                let (sum, carry) = vx.overflowing_add(vy);
                regs.set(x, sum);
                regs.set_flag(carry);
                PcUpdate::Next
            }
            // VF is "no borrow": set when the subtraction didn't wrap,
            // including the equal case
            Opcode::Sub => {
                regs.set_flag(vx >= vy);
                regs.set(x, vx.wrapping_sub(vy));
                PcUpdate::Next
            }
            Opcode::Subn => {
                regs.set_flag(vy >= vx);
                regs.set(x, vy.wrapping_sub(vx));
                PcUpdate::Next
            }
            // the bit shifted out goes to VF before Vx is written back
            Opcode::Shr => {
                regs.set_flag(vx & 0x01 != 0);
                regs.set(x, vx >> 1);
                PcUpdate::Next
            }
            Opcode::Shl => {
                regs.set_flag(vx & 0x80 != 0);
                regs.set(x, vx << 1);
                PcUpdate::Next
            }
            Opcode::LdI => {
                regs.i = nnn;
                PcUpdate::Next
            }
            Opcode::JpV0 => PcUpdate::Jump(regs.get(U4::new(0)) as u16 + nnn),
            Opcode::Rnd => {
                regs.set(x, self.rng.gen::<u8>() & kk);
                PcUpdate::Next
            }
            Opcode::Drw => {
                regs.set_flag(false);
                let sprite = self
                    .machine
                    .memory
                    .get_ro_slice(regs.i, instr.n().index())?;
                if blit(&mut self.machine.frame, sprite, vx, vy) {
                    regs.set_flag(true);
                }
                self.display.draw(&self.machine.frame)?;
                PcUpdate::Next
            }
            Opcode::Skp => PcUpdate::skip_if(self.keypad.is_pressed(U4::new(vx))),
            Opcode::Sknp => PcUpdate::skip_if(!self.keypad.is_pressed(U4::new(vx))),
            Opcode::LdFromDelay => {
                regs.set(x, self.machine.delay_timer.value());
                PcUpdate::Next
            }
            Opcode::LdKey => match self.keypad.wait_for_key() {
                Ok(key) => {
                    regs.set(x, u8::from(key));
                    PcUpdate::Next
                }
                Err(_) => PcUpdate::Stay(Flow::Cancelled),
            },
            Opcode::LdDelay => {
                self.machine.delay_timer.set(vx);
                PcUpdate::Next
            }
            Opcode::LdSound => {
                self.machine.sound_timer.set(vx);
                PcUpdate::Next
            }
            Opcode::AddI => {
                regs.i = regs.i.wrapping_add(vx as u16);
                PcUpdate::Next
            }
            Opcode::LdFont => {
                regs.i = Memory::font_sprite_addr(vx);
                PcUpdate::Next
            }
            Opcode::Bcd => {
                if regs.i > CHIP8_LAST_INSTRUCTION_ADDR - 1 {
                    return Err(Fault::BcdTargetOutOfRange(regs.i));
                }
                // ones digit at the lowest address
                let digits = [vx % 10, (vx / 10) % 10, vx / 100];
                self.machine.memory.write(&digits, regs.i)?;
                PcUpdate::Next
            }
            Opcode::StoreRegs => {
                let len = x.index() + 1;
                let dst = self.machine.memory.get_rw_slice(regs.i, len)?;
                dst.copy_from_slice(&regs.v()[..len]);
                PcUpdate::Next
            }
            Opcode::LoadRegs => {
                let src = self.machine.memory.get_ro_slice(regs.i, x.index() + 1)?;
                for (reg, &byte) in x.up_to().zip(src) {
                    regs.set(reg, byte);
                }
                PcUpdate::Next
            }
        };

        let regs = &mut self.machine.registers;
        match update {
            PcUpdate::Next => regs.pc = pc + 2,
            PcUpdate::Skip => regs.pc = pc + 4,
            PcUpdate::Jump(addr) => regs.pc = addr,
            PcUpdate::Stay(flow) => return Ok(flow),
        }
        Ok(Flow::Next)
    }
}

/// calls and jumps have to land inside program memory, with room for a
/// whole instruction
fn check_target(addr: u16) -> Result<u16, Fault> {
    if !(CHIP8_PROGRAM_ADDR..=CHIP8_LAST_INSTRUCTION_ADDR).contains(&addr) {
        return Err(Fault::CallTargetOutOfRange(addr));
    }
    Ok(addr)
}

/// XOR an 8-pixel-wide sprite into the frame with its top left at (x, y),
/// wrapping at the edges. true if any pixel was switched off
fn blit(frame: &mut FrameBuffer, sprite: &[u8], x: u8, y: u8) -> bool {
    let mut collided = false;
    for (row, &bits) in sprite.iter().enumerate() {
        for col in 0..8 {
            if bits & (0x80 >> col) != 0 {
                collided |= frame.flip(x as usize + col, y as usize + row);
            }
        }
    }
    collided
}
