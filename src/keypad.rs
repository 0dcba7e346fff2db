use crate::nibble::U4;
use crate::rendezvous::{rendezvous, Closed, Requester, Responder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// state of the 16-key hex keypad. each key is its own atomic flag: keys
/// are only ever updated one at a time, never jointly
#[derive(Default)]
struct Keys([AtomicBool; 16]);

/// the input side: records presses and releases, and answers a pending
/// wait-for-key
pub struct KeypadWriter {
    keys: Arc<Keys>,
    next_key: Responder<U4>,
}

/// the interpreter side: reads key state, and can block for the next press
pub struct KeypadReader {
    keys: Arc<Keys>,
    next_key: Requester<U4>,
}

/// a connected writer/reader pair sharing one keypad
pub fn keypad() -> (KeypadWriter, KeypadReader) {
    let keys = Arc::new(Keys::default());
    let (next_key, requests) = rendezvous();
    (
        KeypadWriter {
            keys: keys.clone(),
            next_key,
        },
        KeypadReader {
            keys,
            next_key: requests,
        },
    )
}

impl KeypadWriter {
    /// mark `key` as down. a fresh press (not a repeat of a key that's
    /// already down) is also offered to anyone waiting for a key; returns
    /// whether it was taken
    pub fn press(&self, key: U4) -> bool {
        let was_down = self.keys.0[key.index()].swap(true, Ordering::AcqRel);
        if was_down {
            return false;
        }
        self.next_key.send_if_requested(key)
    }

    pub fn release(&self, key: U4) {
        self.keys.0[key.index()].store(false, Ordering::Release);
    }
}

impl KeypadReader {
    pub fn is_pressed(&self, key: U4) -> bool {
        self.keys.0[key.index()].load(Ordering::Acquire)
    }

    /// block until the next fresh key press
    pub fn wait_for_key(&self) -> Result<U4, Closed> {
        self.next_key.request()
    }
}
