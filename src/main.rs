use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chip8_vm::config::{KeymapKind, Settings, DEFAULT_CYCLE_HZ};
use chip8_vm::display::MonoTermDisplay;
use chip8_vm::input::{forward_keys, StdinInput};
use chip8_vm::instruction::disassemble;
use chip8_vm::interpreter::Chip8Interpreter;
use chip8_vm::memory::CHIP8_PROGRAM_ADDR;
use chip8_vm::sound::{Mute, SimpleBeep, Sound};
use chip8_vm::Chip8Error;

const EXIT_READ_FAILED: u8 = 3;
const EXIT_LOAD_FAILED: u8 = 4;
const EXIT_FATAL: u8 = 5;

/// Run a CHIP-8 program in the terminal. Esc or Ctrl-C quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// program file to load at 0x200
    program: PathBuf,

    /// cycles per second
    #[arg(long, default_value_t = DEFAULT_CYCLE_HZ)]
    hz: u32,

    /// how host keys map to the hex keypad
    #[arg(long, value_enum, default_value_t = KeymapKind::Conventional)]
    keymap: KeymapKind,

    /// don't use the PC speaker
    #[arg(long)]
    mute: bool,

    /// seed for RND, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many cycles (0 runs until quit)
    #[arg(long, default_value_t = 0)]
    max_cycles: u64,

    /// print the program's disassembly and exit
    #[arg(long)]
    disassemble: bool,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            program: args.program,
            cycle_hz: args.hz,
            keymap: args.keymap,
            mute: args.mute,
            seed: args.seed,
            max_cycles: (args.max_cycles > 0).then_some(args.max_cycles),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let disassemble_only = args.disassemble;
    let settings = Settings::from(args);

    let program = match fs::read(&settings.program)
        .with_context(|| format!("couldn't read {}", settings.program.display()))
    {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(EXIT_READ_FAILED);
        }
    };

    if disassemble_only {
        print!("{}", disassemble(&program, CHIP8_PROGRAM_ADDR));
        return ExitCode::SUCCESS;
    }

    match emulate(&settings, &program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            match e.downcast_ref::<Chip8Error>() {
                Some(Chip8Error::ProgramTooLarge { .. }) => ExitCode::from(EXIT_LOAD_FAILED),
                _ => ExitCode::from(EXIT_FATAL),
            }
        }
    }
}

fn emulate(settings: &Settings, program: &[u8]) -> anyhow::Result<()> {
    let mut beeper = SimpleBeep::new();
    let mut mute = Mute::new();
    let sound: &mut dyn Sound = if settings.mute { &mut mute } else { &mut beeper };

    // raw mode lasts until the input thread finishes with it
    let input = StdinInput::new(Duration::from_millis(10)).context("couldn't set up keyboard")?;
    let mut display = MonoTermDisplay::new().context("couldn't set up terminal display")?;
    let mut interpreter = Chip8Interpreter::new(settings, &mut display, sound)?;
    interpreter.load_program(&mut &program[..])?;

    let cancel = Arc::new(AtomicBool::new(false));
    let pump = {
        let keys = interpreter.keys();
        let cancel = Arc::clone(&cancel);
        thread::spawn(move || forward_keys(input, keys, &cancel))
    };

    let result = interpreter.run(&cancel);
    cancel.store(true, Ordering::Relaxed);
    let pumped = pump.join();

    let summary = result?;
    log::info!("{:?}", summary);
    match pumped {
        Ok(res) => res.context("keyboard input failed"),
        Err(_) => anyhow::bail!("keyboard input thread panicked"),
    }
}
