//! # interpreter
//!
//! Drives the [`Cpu`] at a fixed rate and connects it to the outside world:
//! frames go to a [`Display`] when the screen changed, the sound timer turns a
//! [`Sound`] on and off, and keypresses arrive through a [`KeySender`] from
//! whatever is polling the keyboard (normally another thread).
//!
//! The loop checks a cancellation flag once per tick; a tick that comes due
//! after cancellation is never run. `LD Vx,K` waiting for a key costs one
//! tick per retry, so it never spins faster than the clock.
use crate::config::Settings;
use crate::cpu::{Cpu, Cycle};
use crate::display::Display;
use crate::error::Chip8Error;
use crate::input::{KeyInput, KeySender};
use crate::memory::Font;
use crate::sound::Sound;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// why [`Chip8Interpreter::run`] returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    CycleLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub reason: StopReason,
}

pub struct Chip8Interpreter<'a> {
    cpu: Cpu,
    display: &'a mut dyn Display,
    sound: &'a mut dyn Sound,
    period: Duration,
    max_cycles: Option<u64>,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(
        settings: &Settings,
        display: &'a mut dyn Display,
        sound: &'a mut dyn Sound,
    ) -> Result<Chip8Interpreter<'a>, Chip8Error> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let keys = KeyInput::new(settings.keymap.keymap());
        Ok(Chip8Interpreter {
            cpu: Cpu::new(Font::default(), keys, rng)?,
            display,
            sound,
            period: settings.cycle_period(),
            max_cycles: settings.max_cycles,
        })
    }

    /// load a chip8 program, returning its size
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let len = self.cpu.load_from(reader)?;
        log::info!("loaded {} byte program", len);
        Ok(len)
    }

    /// a handle for delivering keypresses from another thread
    pub fn keys(&self) -> KeySender {
        self.cpu.keys().sender()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// run one cycle and pass its side effects on to the display and sound
    pub fn step(&mut self) -> Result<Cycle, Chip8Error> {
        let cycle = self.cpu.cycle()?;
        if cycle.redraw {
            self.display.draw(self.cpu.framebuffer())?;
        }
        self.sound.set(cycle.buzz)?;
        Ok(cycle)
    }

    /// Tick at the configured rate until `cancel` is set, the cycle limit is
    /// reached, or the program hits a fatal error.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<RunSummary, Chip8Error> {
        log::info!("running at one cycle per {:?}", self.period);
        let mut cycles = 0;
        let stopped = self.tick_until(cancel, &mut cycles);
        let silenced = self.sound.set(false);
        let reason = stopped?;
        silenced?;
        log::info!("stopped after {} cycles: {:?}", cycles, reason);
        Ok(RunSummary { cycles, reason })
    }

    fn tick_until(
        &mut self,
        cancel: &AtomicBool,
        cycles: &mut u64,
    ) -> Result<StopReason, Chip8Error> {
        let mut next_tick = Instant::now();
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok(StopReason::Cancelled);
            }
            if self.max_cycles.map_or(false, |max| *cycles >= max) {
                return Ok(StopReason::CycleLimit);
            }

            self.step()?;
            *cycles += 1;

            // sleep to the next tick, but don't try to catch up if we're late
            next_tick += self.period;
            let now = Instant::now();
            if next_tick > now {
                spin_sleep::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }
    }
}
