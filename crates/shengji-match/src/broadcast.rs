//! Multi-consumer fan-out with one outbound channel per subscriber.
//!
//! Every subscriber sees every update in publish order, followed by exactly
//! one [`Envelope::Closed`] once the broadcaster is closed.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Update(T),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("broadcaster is closed")]
    Closed,
}

#[derive(Debug)]
pub struct Broadcaster<T> {
    inner: Mutex<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    subscribers: Vec<UnboundedSender<Envelope<T>>>,
    closed: bool,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// A subscriber joining after close receives only the sentinel.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        if inner.closed {
            let _ = sender.send(Envelope::Closed);
        } else {
            inner.subscribers.push(sender);
        }
        Subscription {
            receiver,
            finished: false,
        }
    }

    /// Sends `update` to every live subscriber and returns how many got it.
    /// Subscribers whose receiving side is gone are dropped.
    pub fn publish(&self, update: T) -> Result<usize, BroadcastError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(BroadcastError::Closed);
        }
        let before = inner.subscribers.len();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(Envelope::Update(update.clone())).is_ok());
        let delivered = inner.subscribers.len();
        if delivered < before {
            warn!(dropped = before - delivered, "dropped disconnected subscribers");
        }
        Ok(delivered)
    }

    /// Sends the sentinel to every subscriber. Returns `false` if already
    /// closed.
    pub fn close(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.closed = true;
        for subscriber in inner.subscribers.drain(..) {
            let _ = subscriber.send(Envelope::Closed);
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Subscription<T> {
    receiver: UnboundedReceiver<Envelope<T>>,
    finished: bool,
}

impl<T> Subscription<T> {
    /// Next update, or `None` once the stream has closed.
    pub async fn recv(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        let envelope = self.receiver.recv().await;
        self.unwrap_envelope(envelope)
    }

    /// Blocking form of [`Subscription::recv`] for callers outside an async
    /// runtime.
    pub fn blocking_recv(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        let envelope = self.receiver.blocking_recv();
        self.unwrap_envelope(envelope)
    }

    /// Whatever is already queued, without waiting. The sentinel is returned
    /// once; after it the subscription yields nothing.
    pub fn try_recv(&mut self) -> Option<Envelope<T>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(Envelope::Update(update)) => Some(Envelope::Update(update)),
            Ok(Envelope::Closed) | Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Envelope::Closed)
            }
            Err(TryRecvError::Empty) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn unwrap_envelope(&mut self, envelope: Option<Envelope<T>>) -> Option<T> {
        match envelope {
            Some(Envelope::Update(update)) => Some(update),
            Some(Envelope::Closed) | None => {
                self.finished = true;
                None
            }
        }
    }
}
