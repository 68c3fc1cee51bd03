use crate::error::Chip8Error;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Bounds-checked access to emulated memory. Every address comes from the
/// running program, so nothing here is allowed to index blindly.
pub trait MemoryMap {
    /// total addressable bytes
    fn size(&self) -> usize;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Chip8Error>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error>;

    /// write a chunk of bytes; nothing is written unless all of it fits
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Chip8Error> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn get_byte(&self, addr: u16) -> Result<u8, Chip8Error> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// get a big-endian two-byte word (an instruction)
    fn get_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// Defines the CHIP-8 memory map:
///   0x0000-0x01ff  interpreter (font table lives here)
///   0x0200-0x0fff  program
pub struct Memory {
    bytes: Box<[u8; CHIP8_RAM_SIZE_BYTES]>,
}

impl MemoryMap for Memory {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Chip8Error> {
        let range = checked_range(addr, len, self.size())?;
        Ok(&mut self.bytes[range])
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let range = checked_range(addr, len, self.size())?;
        Ok(&self.bytes[range])
    }
}

fn checked_range(addr: u16, len: usize, size: usize) -> Result<std::ops::Range<usize>, Chip8Error> {
    let start = addr as usize;
    let end = start + len;
    if end > size {
        // report the first byte that doesn't exist
        return Err(Chip8Error::OutOfBounds {
            addr: start.max(size),
        });
    }
    Ok(start..end)
}

impl Memory {
    /// zeroed memory with the font baked in
    pub fn new(font: &Font) -> Result<Self, Chip8Error> {
        let mut mm = Memory {
            bytes: Box::new([0u8; CHIP8_RAM_SIZE_BYTES]),
        };
        mm.write(font.glyphs, font.base)?;
        Ok(mm)
    }

    /// copy a CHIP-8 program in at 0x200, returning how many bytes were copied
    pub fn load_program(&mut self, program: &[u8]) -> Result<usize, Chip8Error> {
        let max = self.size() - CHIP8_PROGRAM_ADDR as usize;
        if program.len() > max {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }
        self.write(program, CHIP8_PROGRAM_ADDR)?;
        Ok(program.len())
    }

    /// load a CHIP-8 program of unknown length from a reader
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_program(&buf)
    }
}

/// A hex-digit font: 16 glyphs of `glyph_height` bytes each, copied into
/// memory at `base` when the machine is built.
#[derive(Clone, Copy, Debug)]
pub struct Font {
    pub base: u16,
    pub glyph_height: u16,
    pub glyphs: &'static [u8],
}

impl Font {
    /// Address of the glyph for `digit`. Values past 0xf point beyond the
    /// table; callers bounds-check the result against memory.
    pub fn glyph_addr(&self, digit: u8) -> u16 {
        self.base
            .saturating_add(self.glyph_height.saturating_mul(digit as u16))
    }
}

impl Default for Font {
    fn default() -> Self {
        CHIP8_CONTEMPORARY_FONT
    }
}

pub const CHIP8_CONTEMPORARY_FONT: Font = Font {
    base: 0x050,
    glyph_height: 5,
    glyphs: &CHIP8_CONTEMPORARY_GLYPHS,
};

const CHIP8_CONTEMPORARY_GLYPHS: [u8; 80] = [
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

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Memory {
        Memory::new(&Font::default()).unwrap()
    }

    #[test]
    fn test_memory_zeroed() {
        let m = memory();
        // NB. memory is zeroed from 0x200 because before that we bake in the font
        assert_eq!(m.bytes[0x200..], [0; 0xe00]);
        assert_eq!(m.bytes[..0x50], [0; 0x50]);
    }

    #[test]
    fn test_font_loaded() -> Result<(), Chip8Error> {
        let m = memory();
        let font = Font::default();
        assert_eq!(m.get_ro_slice(font.glyph_addr(0), 5)?, &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(m.get_ro_slice(font.glyph_addr(0xf), 5)?, &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        Ok(())
    }

    #[test]
    fn test_glyph_addr() {
        let font = Font::default();
        assert_eq!(font.glyph_addr(0), 0x50);
        assert_eq!(font.glyph_addr(0xa), 0x50 + 50);
        assert_eq!(font.glyph_addr(0x10), 0xa0);
        assert_eq!(font.glyph_addr(0xff), 0x50 + 5 * 255);
    }

    #[test]
    fn test_write_slice_ok() -> Result<(), Chip8Error> {
        let mut dst = memory();
        dst.write(&[0, 1, 2, 3, 4, 5, 6, 7], 8)?;
        assert_eq!(
            dst.bytes[..16],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
        Ok(())
    }

    #[test]
    fn test_read_word() -> Result<(), Chip8Error> {
        let mut m = memory();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0)?;
        assert_eq!(m.get_word(0x4)?, 0x0405);
        assert_eq!(m.get_byte(0x7)?, 7);
        Ok(())
    }

    #[test]
    fn test_write_past_end_rejected() {
        let mut dst = memory();
        let res = dst.write(&[0xff; 8], 4089);
        assert!(matches!(res, Err(Chip8Error::OutOfBounds { addr: 4096 })));
        // nothing was written
        assert_eq!(dst.bytes[4089..], [0; 7]);
    }

    #[test]
    fn test_word_straddling_end() {
        let m = memory();
        assert!(m.get_word(0xffe).is_ok());
        assert!(matches!(
            m.get_word(0xfff),
            Err(Chip8Error::OutOfBounds { addr: 4096 })
        ));
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut dst = memory();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(dst.load_from(&mut prog)?, 2);
        assert_eq!(dst.get_ro_slice(0x200, 2)?, &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_fills_memory() -> Result<(), Chip8Error> {
        let mut dst = memory();
        assert_eq!(dst.load_program(&[0xaa; 0xe00])?, 0xe00);
        assert_eq!(dst.get_byte(0xfff)?, 0xaa);
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut dst = memory();
        let res = dst.load_program(&[0xaa; 0xe01]);
        assert!(matches!(
            res,
            Err(Chip8Error::ProgramTooLarge { size: 0xe01, max: 0xe00 })
        ));
        assert_eq!(dst.bytes[0x200], 0);
    }
}
