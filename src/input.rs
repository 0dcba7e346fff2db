use crate::keypad::KeypadWriter;
use crate::nibble::U4;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// keys 0-9 and a-f map straight onto the hex keypad
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// which keyboard layout drives the keypad
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Keymap {
    /// 1234 / qwer / asdf / zxcv
    #[default]
    Conventional,
    /// 0-9 and a-f
    Literal,
}

impl Keymap {
    fn table(self) -> HashMap<char, U4> {
        let pairs = match self {
            Keymap::Conventional => CHIP8_CONVENTIONAL_KEYMAP,
            Keymap::Literal => CHIP8_LITERAL_KEYMAP,
        };
        pairs.iter().map(|&(c, k)| (c, U4::new(k))).collect()
    }
}

/// what a poll turned up
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Poll {
    /// nothing to read
    Idle,
    /// handled at least one event; there may be more
    Busy,
    /// the user asked to quit
    Quit,
}

/// Turns keyboard events into keypad presses and releases.
///
/// Terminals report a key going down (and auto-repeat while it's held) but
/// never report it coming back up, so a key is released once it's gone
/// `hold` without a press or repeat.
struct KeyTracker {
    keymap: HashMap<char, U4>,
    hold: Duration,
    last_seen: [Option<Instant>; 16],
}

impl KeyTracker {
    fn new(keymap: Keymap, hold: Duration) -> Self {
        KeyTracker {
            keymap: keymap.table(),
            hold,
            last_seen: [None; 16],
        }
    }

    fn handle(&mut self, keypad: &KeypadWriter, event: KeyEvent, now: Instant) -> Poll {
        match event.code {
            KeyCode::Esc => return Poll::Quit,
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Poll::Quit
            }
            KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                Some(&key) => {
                    self.last_seen[key.index()] = Some(now);
                    if keypad.press(key) {
                        debug!("key {} answered a wait", key);
                    }
                }
                None => warn!("can't map {:?} to a keypad key", c),
            },
            other => debug!("ignoring key {:?}", other),
        }
        Poll::Busy
    }

    /// let go of keys that haven't been seen for a while
    fn release_stale(&mut self, keypad: &KeypadWriter, now: Instant) {
        for key in U4::F.up_to() {
            let seen = &mut self.last_seen[key.index()];
            if let Some(at) = *seen {
                if now.saturating_duration_since(at) >= self.hold {
                    keypad.release(key);
                    *seen = None;
                }
            }
        }
    }
}

/// keyboard input from the terminal. owns the terminal modes for the life of
/// the program: raw mode, the alternate screen and a hidden cursor are set
/// up in `new` and put back on drop.
///
/// the keypad writer is lent in on each poll rather than owned, so the
/// driver can drop it (releasing a pending key wait) while the terminal is
/// still set up
pub struct TermInput {
    tracker: KeyTracker,
}

impl TermInput {
    pub fn new(keymap: Keymap, hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(TermInput {
            tracker: KeyTracker::new(keymap, hold),
        })
    }

    /// handle up to `max` waiting events without blocking
    pub fn poll_events(&mut self, keypad: &KeypadWriter, max: usize) -> Result<Poll, io::Error> {
        let mut result = Poll::Idle;
        for _ in 0..max {
            if !poll(Duration::ZERO)? {
                break;
            }
            if let Event::Key(event) = read()? {
                if self.tracker.handle(keypad, event, Instant::now()) == Poll::Quit {
                    return Ok(Poll::Quit);
                }
            }
            result = Poll::Busy;
        }
        self.tracker.release_stale(keypad, Instant::now());
        Ok(result)
    }

    /// block until any key at all is pressed
    pub fn wait_any_key(&mut self) -> Result<(), io::Error> {
        loop {
            if let Event::Key(_) = read()? {
                return Ok(());
            }
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        // best effort; there's nowhere left to report a failure
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::{keypad, KeypadReader};

    fn tracker(keymap: Keymap) -> (KeyTracker, KeypadWriter, KeypadReader) {
        let (writer, reader) = keypad();
        (
            KeyTracker::new(keymap, Duration::from_millis(150)),
            writer,
            reader,
        )
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_conventional_layout() {
        let table = Keymap::Conventional.table();
        assert_eq!(table.len(), 16);
        assert_eq!(table[&'x'], U4::new(0x0));
        assert_eq!(table[&'4'], U4::new(0xc));
        assert_eq!(table[&'v'], U4::new(0xf));
    }

    #[test]
    fn test_literal_layout() {
        let table = Keymap::Literal.table();
        assert_eq!(table.len(), 16);
        assert_eq!(table[&'0'], U4::new(0x0));
        assert_eq!(table[&'a'], U4::new(0xa));
        assert_eq!(table[&'f'], U4::new(0xf));
    }

    #[test]
    fn test_press_sets_key() {
        let (mut t, w, reader) = tracker(Keymap::Conventional);
        assert_eq!(t.handle(&w, key('w'), Instant::now()), Poll::Busy);
        assert!(reader.is_pressed(U4::new(5)));
        assert!(!reader.is_pressed(U4::new(0)));
    }

    #[test]
    fn test_shifted_letters_still_map() {
        let (mut t, w, reader) = tracker(Keymap::Literal);
        t.handle(&w, key('B'), Instant::now());
        assert!(reader.is_pressed(U4::new(0xb)));
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let (mut t, w, reader) = tracker(Keymap::Conventional);
        assert_eq!(t.handle(&w, key('p'), Instant::now()), Poll::Busy);
        for k in U4::F.up_to() {
            assert!(!reader.is_pressed(k));
        }
    }

    #[test]
    fn test_quit_keys() {
        let (mut t, w, _reader) = tracker(Keymap::Literal);
        let now = Instant::now();
        assert_eq!(
            t.handle(&w, KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now),
            Poll::Quit
        );
        assert_eq!(
            t.handle(&w, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now),
            Poll::Quit
        );
        // plain c is keypad C in this layout
        assert_eq!(t.handle(&w, key('c'), now), Poll::Busy);
    }

    #[test]
    fn test_key_released_after_hold() {
        let (mut t, w, reader) = tracker(Keymap::Conventional);
        let now = Instant::now();
        t.handle(&w, key('s'), now);
        t.release_stale(&w, now + Duration::from_millis(100));
        assert!(reader.is_pressed(U4::new(8)));
        t.release_stale(&w, now + Duration::from_millis(150));
        assert!(!reader.is_pressed(U4::new(8)));
    }

    #[test]
    fn test_repeat_keeps_key_down() {
        let (mut t, w, reader) = tracker(Keymap::Conventional);
        let now = Instant::now();
        t.handle(&w, key('s'), now);
        t.handle(&w, key('s'), now + Duration::from_millis(100));
        t.release_stale(&w, now + Duration::from_millis(200));
        assert!(reader.is_pressed(U4::new(8)));
        t.release_stale(&w, now + Duration::from_millis(250));
        assert!(!reader.is_pressed(U4::new(8)));
    }

    #[test]
    #[ignore]
    // NB. needs a real terminal
    fn test_term_input_setup() -> Result<(), io::Error> {
        let (writer, _reader) = keypad();
        let mut input = TermInput::new(Keymap::Conventional, Duration::from_millis(150))?;
        input.poll_events(&writer, 16)?;
        Ok(())
    }
}
