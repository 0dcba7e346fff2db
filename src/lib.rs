//! A CHIP-8 virtual machine that runs in the terminal.
//!
//! ## Design
//!
//! * instructions run as fast as possible; nothing is paced to a clock
//! * timers are wall-clock, worked out when read rather than ticked, so they
//!   stay right however fast or slow the interpreter goes
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * input, execution and sound each get their own thread, and only share
//!   the keypad state and the sound timer
//!
//! Model
//!
//! ```text
//! main (driver thread)
//!  |-- config: args -> Config, logging
//!  |-- loader: file -> program bytes
//!  |-- keypad() -> (writer, reader)
//!  |-- TermInput(writer)                  raw mode, alt screen, key polling
//!  |-- Interpreter(display, reader)       owns the Machine
//!  |    `-- runner::spawn                 "chip8-exec" thread
//!  |         `-- step() until self-jump, cancel or error
//!  |-- Speaker(sound, sound timer)        "chip8-speaker" thread, 60Hz
//!  `-- poll input until quit or the exec thread finishes
//! ```
//!
//! The one place the interpreter blocks is `LD Vx, K`, which asks the input
//! side for the next fresh key press through a zero-capacity
//! [`rendezvous`](rendezvous::rendezvous).

pub mod config;
pub mod decode;
pub mod display;
pub mod error;
pub mod input;
pub mod interpreter;
pub mod keypad;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod nibble;
pub mod rendezvous;
pub mod runner;
pub mod sound;
pub mod timer;
