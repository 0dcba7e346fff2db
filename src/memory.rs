use crate::error::{Fault, LoadError};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents addressable memory. Everything is bounds-checked: running off
/// the end is a fault, never a silent wrap or truncation.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Fault> {
        let bytes = self.get_rw_slice(addr, data.len())?;
        bytes.copy_from_slice(data);
        Ok(())
    }

    /// get one byte
    fn get_byte(&self, addr: u16) -> Result<u8, Fault> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// set one byte
    fn set_byte(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        self.get_rw_slice(addr, 1)?[0] = value;
        Ok(())
    }

    /// get a big-endian two-byte word (instructions)
    fn get_word(&self, addr: u16) -> Result<u16, Fault> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault>;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded; everything below belongs to the interpreter
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the largest program that fits above the load address
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// last address an instruction can start at and still have both bytes in RAM
pub const CHIP8_LAST_INSTRUCTION_ADDR: u16 = CHIP8_RAM_SIZE_BYTES as u16 - 2;

/// where the hex digit sprites live
pub const CHIP8_FONT_ADDR: u16 = 0x0100;

/// each digit sprite is 5 rows of 8 pixels
pub const CHIP8_FONT_SPRITE_BYTES: u16 = 5;

/// 4K of RAM, zeroed apart from the built-in font
pub struct Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Memory {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + len)
            .ok_or(Fault::MemoryOutOfRange { address: addr, len })
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let a = addr as usize;
        self.bytes
            .get(a..a + len)
            .ok_or(Fault::MemoryOutOfRange { address: addr, len })
    }
}

impl Memory {
    /// initialises memory with the font installed
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Memory { bytes }
    }

    /// copy a program in at 0x200. fails without touching memory if it's too big
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// address of the sprite for hex digit `digit`
    pub fn font_sprite_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + CHIP8_FONT_SPRITE_BYTES * (digit % 16) as u16
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
