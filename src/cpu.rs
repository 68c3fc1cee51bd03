//! # cpu
//!
//! The CHIP-8 virtual machine proper: 4K of memory, sixteen 8 bit registers
//! V0-VF (VF doubles as the carry/borrow/collision flag), a 12 bit index
//! register I, delay and sound timers, and a sixteen entry call stack.
//!
//! One call to [`Cpu::cycle`] ticks the timers, fetches the word at PC,
//! bumps PC past it and executes it. Because PC has already moved on when an
//! instruction runs, "skip next" is just another `PC += 2`, and "wait for a
//! key" is `PC -= 2` so the same instruction comes round again next cycle.
use crate::error::Chip8Error;
use crate::framebuffer::Framebuffer;
use crate::input::KeyInput;
use crate::instruction::{Instruction, Opcode};
use crate::memory::{Font, Memory, MemoryMap, CHIP8_PROGRAM_ADDR};
use rand::rngs::StdRng;
use rand::Rng;
use std::io;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

/// program counter and addresses live in 12 bits
const ADDR_MASK: u16 = 0x0fff;

/// what happened during a cycle that the host needs to act on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cycle {
    /// the screen changed and should be presented
    pub redraw: bool,
    /// the sound timer is running
    pub buzz: bool,
    /// LD Vx,K found no key and will run again
    pub waiting: bool,
}

enum Flow {
    Next,
    Retry,
}

pub struct Cpu {
    memory: Memory,
    font: Font,
    v: [u8; REGISTER_COUNT],
    i: u16,
    pc: u16,
    sp: usize,
    stack: [u16; STACK_DEPTH],
    delay_timer: u8,
    sound_timer: u8,
    framebuffer: Framebuffer,
    keys: KeyInput,
    rng: StdRng,
}

impl Cpu {
    pub fn new(font: Font, keys: KeyInput, rng: StdRng) -> Result<Self, Chip8Error> {
        Ok(Cpu {
            memory: Memory::new(&font)?,
            font,
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            sp: 0,
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
            framebuffer: Framebuffer::new(),
            keys,
            rng,
        })
    }

    /// copy a program in at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<usize, Chip8Error> {
        self.memory.load_program(program)
    }

    /// load a program of unknown length from a reader
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        self.memory.load_from(reader)
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self, reg: usize) -> Option<u8> {
        self.v.get(reg).copied()
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// current call depth
    pub fn stack_depth(&self) -> usize {
        self.sp
    }

    pub fn memory(&self) -> &impl MemoryMap {
        &self.memory
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn keys(&self) -> &KeyInput {
        &self.keys
    }

    /// Run one fetch/decode/execute cycle.
    ///
    /// Only stack overflow/underflow come back as errors; out-of-range memory
    /// accesses and undefined instructions are logged and the instruction is
    /// skipped.
    pub fn cycle(&mut self) -> Result<Cycle, Chip8Error> {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);

        let addr = self.pc;
        self.pc = addr.wrapping_add(2) & ADDR_MASK;

        let mut waiting = false;
        match self.fetch(addr).and_then(|ins| self.execute(addr, ins)) {
            Ok(Flow::Next) => {}
            Ok(Flow::Retry) => {
                log::debug!("{:#05x} waiting for a key", addr);
                self.pc = addr;
                waiting = true;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e @ Chip8Error::UndefinedOpcode { .. }) => log::debug!("{}; treated as a no-op", e),
            Err(e) => log::warn!("{}; skipped instruction at {:#05x}", e, addr),
        }

        let redraw = self.framebuffer.is_dirty();
        if redraw {
            self.framebuffer.mark_clean();
        }
        Ok(Cycle {
            redraw,
            buzz: self.sound_timer > 0,
            waiting,
        })
    }

    fn fetch(&self, addr: u16) -> Result<Instruction, Chip8Error> {
        let ins = Instruction(self.memory.get_word(addr)?);
        log::trace!("{:#05x} {}", addr, ins);
        Ok(ins)
    }

    fn execute(&mut self, addr: u16, ins: Instruction) -> Result<Flow, Chip8Error> {
        let (x, y) = (ins.x(), ins.y());
        match ins.classify() {
            Opcode::Unknown => {
                return Err(Chip8Error::UndefinedOpcode { addr, word: ins.0 });
            }
            // machine code subroutines don't exist here
            Opcode::Sys => {}
            Opcode::Cls => self.framebuffer.clear(),
            Opcode::Ret => self.pc = self.pop(addr)?,
            Opcode::Jp => self.pc = ins.nnn(),
            Opcode::Call => {
                self.push(self.pc, addr)?;
                self.pc = ins.nnn();
            }
            Opcode::Se => self.skip_if(self.v[x] == ins.kk()),
            Opcode::Sne => self.skip_if(self.v[x] != ins.kk()),
            Opcode::Sre => self.skip_if(self.v[x] == self.v[y]),
            Opcode::Srne => self.skip_if(self.v[x] != self.v[y]),
            Opcode::Ld => self.v[x] = ins.kk(),
            Opcode::Add => self.v[x] = self.v[x].wrapping_add(ins.kk()),
            Opcode::LdVxVy => self.v[x] = self.v[y],
            Opcode::Or => self.v[x] |= self.v[y],
            Opcode::And => self.v[x] &= self.v[y],
            Opcode::Xor => self.v[x] ^= self.v[y],
            // the flag is written last, so it wins when x is VF
            Opcode::AddVxVy => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[0xf] = carry as u8;
            }
            Opcode::Sub => {
                let flag = self.v[x] > self.v[y];
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
                self.v[0xf] = flag as u8;
            }
            Opcode::Subn => {
                let flag = self.v[y] > self.v[x];
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
                self.v[0xf] = flag as u8;
            }
            Opcode::Shr => {
                let flag = self.v[x] & 0x01;
                self.v[x] >>= 1;
                self.v[0xf] = flag;
            }
            Opcode::Shl => {
                let flag = self.v[x] >> 7;
                self.v[x] <<= 1;
                self.v[0xf] = flag;
            }
            Opcode::Ldi => self.i = ins.nnn(),
            Opcode::Jp0 => self.pc = (self.v[0] as u16 + ins.nnn()) & ADDR_MASK,
            Opcode::Rnd => self.v[x] = self.rng.gen::<u8>() & ins.kk(),
            Opcode::Drw => {
                let rows = self.memory.get_ro_slice(self.i, ins.n() as usize)?;
                let collision =
                    self.framebuffer
                        .draw_sprite(rows, self.v[x] as usize, self.v[y] as usize)?;
                self.v[0xf] = collision as u8;
            }
            Opcode::Skp => {
                let key = self.keys.read_key();
                self.skip_if(key == Some(self.v[x]));
            }
            // also skips when nothing was pressed at all
            Opcode::Sknp => {
                let key = self.keys.read_key();
                self.skip_if(key != Some(self.v[x]));
            }
            Opcode::LdVxDt => self.v[x] = self.delay_timer,
            Opcode::LdVxK => match self.keys.read_key() {
                Some(key) => self.v[x] = key,
                None => return Ok(Flow::Retry),
            },
            Opcode::LdDtVx => self.delay_timer = self.v[x],
            Opcode::LdStVx => self.sound_timer = self.v[x],
            Opcode::AddIVx => self.i = self.i.wrapping_add(self.v[x] as u16),
            Opcode::LdF => {
                let glyph = self.font.glyph_addr(self.v[x]);
                self.memory
                    .get_ro_slice(glyph, self.font.glyph_height as usize)?;
                self.i = glyph;
            }
            Opcode::LdB => {
                let value = self.v[x];
                self.memory
                    .write(&[value / 100, (value / 10) % 10, value % 10], self.i)?;
            }
            Opcode::LdIVx => self.memory.write(&self.v[..=x], self.i)?,
            Opcode::LdVxI => {
                let src = self.memory.get_ro_slice(self.i, x + 1)?;
                self.v[..=x].copy_from_slice(src);
            }
        }
        Ok(Flow::Next)
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
        }
    }

    fn push(&mut self, ret: u16, addr: u16) -> Result<(), Chip8Error> {
        if self.sp >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow { addr });
        }
        self.stack[self.sp] = ret;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self, addr: u16) -> Result<u16, Chip8Error> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow { addr });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }
}
