//! The execution loop: step the interpreter until it halts.
//!
//! There's no pacing; instructions run as fast as they can. Timers are
//! wall-clock based so they don't care, and anything interactive ends up
//! blocked in `LD Vx, K` or polling keys anyway.

use crate::display::Display;
use crate::error::ExecError;
use crate::interpreter::{Flow, Interpreter};
use log::{debug, info};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Halted,
}

/// why a run stopped without an error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// the program jumped to itself at this address
    SelfJump(u16),
    /// told to stop from outside
    Cancelled,
}

/// run until the program halts, `cancel` is set, or an instruction fails.
/// `cancel` is checked between instructions
pub fn run<D: Display>(
    interpreter: &mut Interpreter<D>,
    cancel: &AtomicBool,
) -> Result<Halt, ExecError> {
    let mut state = LoopState::Running;
    let mut halt = Halt::Cancelled;
    let mut steps: u64 = 0;

    while state == LoopState::Running {
        if cancel.load(Ordering::Acquire) {
            break;
        }
        match interpreter.step()? {
            Flow::Next => steps += 1,
            Flow::SelfJump => {
                halt = Halt::SelfJump(interpreter.machine().registers.pc);
                state = LoopState::Halted;
            }
            Flow::Cancelled => state = LoopState::Halted,
        }
    }

    info!("halted after {} instructions: {:?}", steps, halt);
    Ok(halt)
}

/// start `run` on its own thread
pub fn spawn<D>(
    mut interpreter: Interpreter<D>,
    cancel: Arc<AtomicBool>,
) -> io::Result<JoinHandle<Result<Halt, ExecError>>>
where
    D: Display + Send + 'static,
{
    debug!("starting execution thread");
    thread::Builder::new()
        .name("chip8-exec".to_string())
        .spawn(move || run(&mut interpreter, &cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::error::Fault;
    use crate::keypad::keypad;

    fn interpreter(program: &[u8]) -> Interpreter<DummyDisplay> {
        let (_writer, reader) = keypad();
        let mut i = Interpreter::with_seed(DummyDisplay::new(), reader, 0);
        i.load_program(program).unwrap();
        i
    }

    #[test]
    fn test_self_jump_halts() {
        let mut i = interpreter(&[0x12, 0x00]);
        let cancel = AtomicBool::new(false);
        assert_eq!(run(&mut i, &cancel).unwrap(), Halt::SelfJump(0x200));
    }

    #[test]
    fn test_runs_until_self_jump() {
        // LD V1, 5 ; ADD V1, 1 ; JP 0x204
        let mut i = interpreter(&[0x61, 0x05, 0x71, 0x01, 0x12, 0x04]);
        let cancel = AtomicBool::new(false);
        assert_eq!(run(&mut i, &cancel).unwrap(), Halt::SelfJump(0x204));
        assert_eq!(i.machine().registers.v()[1], 6);
    }

    #[test]
    fn test_error_stops_the_loop() {
        // RET with nothing on the stack
        let mut i = interpreter(&[0x60, 0x01, 0x00, 0xee]);
        let cancel = AtomicBool::new(false);
        let e = run(&mut i, &cancel).unwrap_err();
        assert!(matches!(e.fault, Fault::StackUnderflow));
        assert_eq!(e.address, 0x202);
        assert_eq!(e.to_string(), "stack underflow: return with an empty stack (instruction 0x00ee at 0x202)");
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut i = interpreter(&[0x12, 0x00]);
        let cancel = AtomicBool::new(true);
        assert_eq!(run(&mut i, &cancel).unwrap(), Halt::Cancelled);
        assert_eq!(i.machine().registers.pc, 0x200);
    }

    #[test]
    fn test_cancel_a_busy_loop() {
        // JP 0x202 ; JP 0x200, round and round
        let i = interpreter(&[0x12, 0x02, 0x12, 0x00]);
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn(i, cancel.clone()).unwrap();
        thread::sleep(std::time::Duration::from_millis(20));
        cancel.store(true, Ordering::Release);
        assert_eq!(handle.join().unwrap().unwrap(), Halt::Cancelled);
    }

    #[test]
    fn test_key_wait_with_no_input_halts() {
        // the writer half was dropped in `interpreter`
        let mut i = interpreter(&[0xf0, 0x0a]);
        let cancel = AtomicBool::new(false);
        assert_eq!(run(&mut i, &cancel).unwrap(), Halt::Cancelled);
    }

    #[test]
    fn test_quit_releases_a_key_wait() {
        let (writer, reader) = keypad();
        let mut i = Interpreter::with_seed(DummyDisplay::new(), reader, 0);
        // LD V0, K
        i.load_program(&[0xf0, 0x0a]).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn(i, cancel.clone()).unwrap();
        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!handle.is_finished());

        // what the driver does on quit, before it restores the terminal
        cancel.store(true, Ordering::Release);
        drop(writer);
        assert_eq!(handle.join().unwrap().unwrap(), Halt::Cancelled);
    }

    #[test]
    fn test_thread_is_named() {
        let i = interpreter(&[0x12, 0x00]);
        let handle = spawn(i, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(handle.thread().name(), Some("chip8-exec"));
        assert_eq!(handle.join().unwrap().unwrap(), Halt::SelfJump(0x200));
    }
}
