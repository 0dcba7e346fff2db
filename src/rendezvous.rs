//! Single-slot request/response handoff.
//!
//! One side asks for "the next value" and blocks; the other side offers
//! values whenever it has them, and they only go anywhere if somebody is
//! already asking. Built on a zero-capacity channel: `recv` is the pending
//! request, and `try_send` only succeeds while a receiver is parked in it,
//! so nothing is ever buffered and nothing handed over can be overwritten.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use thiserror::Error;

/// the responding half went away, so a request can never be answered
#[derive(Debug, Error, PartialEq, Eq)]
#[error("rendezvous closed")]
pub struct Closed;

/// the blocking side
pub struct Requester<T> {
    rx: Receiver<T>,
}

/// the delivering side
pub struct Responder<T> {
    tx: Sender<T>,
}

pub fn rendezvous<T>() -> (Responder<T>, Requester<T>) {
    let (tx, rx) = channel::bounded(0);
    (Responder { tx }, Requester { rx })
}

impl<T> Requester<T> {
    /// block until a value is delivered. only one request should be in
    /// flight at a time
    pub fn request(&self) -> Result<T, Closed> {
        self.rx.recv().map_err(|_| Closed)
    }
}

impl<T> Responder<T> {
    /// hand `value` to a waiting request; returns whether anyone took it.
    /// with nobody waiting the value is dropped
    pub fn send_if_requested(&self, value: T) -> bool {
        match self.tx.try_send(value) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
