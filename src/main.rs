use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chip8_vm::config::{init_logging, Args, Config};
use chip8_vm::display::{MonoTermDisplay, CHIP8_SCREEN_HEIGHT};
use chip8_vm::input::{Poll, TermInput};
use chip8_vm::interpreter::Interpreter;
use chip8_vm::keypad::keypad;
use chip8_vm::loader::read_program;
use chip8_vm::runner::{self, Halt};
use chip8_vm::sound::{Mute, SimpleBeep, Sound, Speaker};
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Print;
use log::{error, info};

/// most keyboard events handled per pass of the driver loop
const POLL_BATCH: usize = 32;

/// how long the driver naps when there was nothing to read
const IDLE_SLEEP: Duration = Duration::from_millis(2);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Outcome {
    /// the program halted and the user dismissed the prompt
    Finished,
    /// the user quit before the program halted
    Quit,
    /// the execution thread died
    Panicked,
}

impl Outcome {
    /// only a run that halted and was acknowledged counts as success
    fn exit_status(self) -> u8 {
        match self {
            Outcome::Finished => 0,
            Outcome::Quit => 1,
            Outcome::Panicked => 2,
        }
    }
}

fn main() -> ExitCode {
    let config: Config = match Args::try_parse() {
        Ok(args) => args.into(),
        Err(e) => {
            // --help and --version end up here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("chip8-vm: can't set up logging: {}", e);
        return ExitCode::from(1);
    }

    let program = match read_program(&config.program, config.format) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("chip8-vm: {}: {}", config.program.display(), e);
            return ExitCode::from(1);
        }
    };

    // the terminal is back to normal by the time `run` returns
    match run(&config, &program) {
        Ok(outcome) => {
            if outcome == Outcome::Panicked {
                eprintln!("chip8-vm: execution thread panicked");
            }
            ExitCode::from(outcome.exit_status())
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("chip8-vm: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(config: &Config, program: &[u8]) -> Result<Outcome, Box<dyn Error>> {
    let (writer, reader) = keypad();
    let mut input = TermInput::new(config.keymap, config.key_hold)?;
    let display = MonoTermDisplay::new()?;

    let mut interpreter = match config.seed {
        Some(seed) => Interpreter::with_seed(display, reader, seed),
        None => Interpreter::new(display, reader),
    };
    interpreter.load_program(program)?;
    info!("loaded {} bytes at 0x200", program.len());

    let sound: Box<dyn Sound + Send> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    let speaker = Speaker::start(sound, interpreter.machine().sound_timer.clone())?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handle = runner::spawn(interpreter, cancel.clone())?;

    while !handle.is_finished() {
        match input.poll_events(&writer, POLL_BATCH)? {
            Poll::Quit => {
                info!("quit requested");
                cancel.store(true, Ordering::Release);
                // lets go of a pending LD Vx, K
                drop(writer);
                speaker.stop();
                // nothing may draw once `input` has put the terminal back
                if handle.join().is_err() {
                    return Ok(Outcome::Panicked);
                }
                return Ok(Outcome::Quit);
            }
            Poll::Idle => spin_sleep::sleep(IDLE_SLEEP),
            Poll::Busy => {}
        }
    }

    speaker.stop();
    match handle.join() {
        Ok(Ok(halt)) => {
            info!("program halted: {:?}", halt);
            prompt(halt)?;
            input.wait_any_key()?;
            Ok(Outcome::Finished)
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Ok(Outcome::Panicked),
    }
}

/// under the screen, so the last frame stays visible
fn prompt(halt: Halt) -> Result<(), io::Error> {
    let message = match halt {
        Halt::SelfJump(addr) => format!("halted at {:#05x}; press any key to exit", addr),
        Halt::Cancelled => "stopped; press any key to exit".to_string(),
    };
    execute!(
        io::stdout(),
        MoveTo(0, CHIP8_SCREEN_HEIGHT as u16 + 2),
        Print(message)
    )
}
