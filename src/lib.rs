//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * the core is the [`cpu::Cpu`]: memory, registers, timers, call stack, and
//!   the [`framebuffer::Framebuffer`] and [`input::KeyInput`] it owns outright
//! * instructions are decoded once into a closed [`instruction::Opcode`] and
//!   matched exhaustively; anything unrecognised is a no-op
//! * one [`cpu::Cpu::cycle`] never blocks; waiting for a key means running the
//!   same instruction again next cycle
//! * abstract display, input and sound so alternatives can plug in; the
//!   defaults are a TUI canvas in-console, crossterm keys and the PC speaker
//! * the interpreter ticks the cpu at a fixed rate (60Hz by default) and
//!   sleeps in between, so timing is right on average, not per instruction
//!
//! Model
//!
//! ```text
//! main
//!  |-- settings (cli)
//!  |-- display, sound
//!  |-- interpreter(settings, display, sound)
//!  |    `-- cpu(font, keys, rng)
//!  |         |-- memory, framebuffer, key input
//!  |         `-- instruction decoder
//!  |-- input thread: keyboard --> key sender --> key input
//!  `-- main loop: tick, present if dirty, beep while sound timer runs
//! ```
pub mod config;
pub mod cpu;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod sound;

pub use error::Chip8Error;
