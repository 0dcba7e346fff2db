use crate::timer::Timer;
use beep::beep;
use log::{debug, warn};
use spin_sleep::LoopHelper;
use std::error::Error;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// how often the speaker looks at the sound timer; same rate the timer ticks
const SPEAKER_POLL_HZ: f64 = 60.0;

/// a tone from the pc speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep(SIMPLEBEEP_PITCH)?;
        self.is_beeping = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_beeping {
            beep(0)?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Mute {}

impl Mute {
    pub fn new() -> Self {
        Mute {}
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

/// Plays a tone whenever the sound timer is non-zero.
///
/// Runs on its own thread and only ever reads the timer, sampling it at
/// 60Hz; the interpreter never touches the audio device.
pub struct Speaker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Speaker {
    pub fn start(sound: Box<dyn Sound + Send>, timer: Arc<Timer>) -> Result<Speaker, io::Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("chip8-speaker".to_string())
                .spawn(move || speaker_loop(sound, &timer, &stop))?
        };
        Ok(Speaker { stop, handle })
    }

    /// silence the speaker and wait for its thread to finish
    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);
        if self.handle.join().is_err() {
            warn!("speaker thread panicked");
        }
    }
}

fn speaker_loop(mut sound: Box<dyn Sound + Send>, timer: &Timer, stop: &AtomicBool) {
    let mut loop_helper = LoopHelper::builder().build_with_target_rate(SPEAKER_POLL_HZ);
    let mut on = false;

    while !stop.load(Ordering::Acquire) {
        loop_helper.loop_start();
        let want = timer.value() > 0;
        if want != on {
            debug!("speaker {}", if want { "on" } else { "off" });
            let result = if want { sound.beep() } else { sound.stop() };
            if let Err(e) = result {
                warn!("audio failed: {}", e);
            }
            on = want;
        }
        loop_helper.loop_sleep();
    }

    if on {
        if let Err(e) = sound.stop() {
            warn!("audio failed: {}", e);
        }
    }
}
