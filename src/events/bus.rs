// src/events/bus.rs

//! Bounded, closable event stream with many producers and one consumer.
//!
//! Each producer runs on its own named thread and pushes through a
//! `BusSender`. Closing the bus raises a shared flag, runs the producers' stop
//! hooks, drops the receiving end so senders blocked on a full queue wake up
//! with an error, and finally joins every producer thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::input::InputEvent;

/// Returned by `BusSender::send` once the bus no longer accepts events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event bus is closed")]
pub struct BusClosed;

/// Producer handle onto the bus.
#[derive(Debug, Clone)]
pub struct BusSender {
    tx: SyncSender<InputEvent>,
    closed: Arc<AtomicBool>,
}

impl BusSender {
    /// Blocks while the queue is full. Fails once the bus is closed, including
    /// when the close happens while blocked.
    pub fn send(&self, event: InputEvent) -> Result<(), BusClosed> {
        if self.is_closed() {
            return Err(BusClosed);
        }
        self.tx.send(event).map_err(|_| BusClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

type StopHook = Box<dyn FnOnce() + Send>;

struct Producer {
    name: String,
    handle: Option<JoinHandle<()>>,
    stop: Option<StopHook>,
}

pub struct EventBus {
    tx: Option<SyncSender<InputEvent>>,
    rx: Option<Receiver<InputEvent>>,
    closed: Arc<AtomicBool>,
    producers: Vec<Producer>,
}

impl EventBus {
    /// A bus queueing at most `capacity` undelivered events (at least one).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        debug!("EventBus: created with capacity {}.", capacity.max(1));
        EventBus {
            tx: Some(tx),
            rx: Some(rx),
            closed: Arc::new(AtomicBool::new(false)),
            producers: Vec::new(),
        }
    }

    /// A sender for producers that are not threads owned by the bus.
    ///
    /// `recv` only reports the end of the stream once every sender is gone.
    pub fn sender(&self) -> Option<BusSender> {
        self.tx.as_ref().map(|tx| BusSender {
            tx: tx.clone(),
            closed: Arc::clone(&self.closed),
        })
    }

    /// Runs `body` on a new thread named `name`. The body should return once
    /// a send fails or `BusSender::is_closed` turns true.
    pub fn spawn_producer<F>(&mut self, name: &str, body: F) -> anyhow::Result<()>
    where
        F: FnOnce(BusSender) -> anyhow::Result<()> + Send + 'static,
    {
        self.spawn(name, body, None)
    }

    /// Like `spawn_producer`, for bodies that block on something other than
    /// the bus. `stop` is called on close, before the thread is joined, and
    /// must unblock the body.
    pub fn spawn_producer_with_stop<F, S>(
        &mut self,
        name: &str,
        body: F,
        stop: S,
    ) -> anyhow::Result<()>
    where
        F: FnOnce(BusSender) -> anyhow::Result<()> + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        self.spawn(name, body, Some(Box::new(stop)))
    }

    fn spawn<F>(&mut self, name: &str, body: F, stop: Option<StopHook>) -> anyhow::Result<()>
    where
        F: FnOnce(BusSender) -> anyhow::Result<()> + Send + 'static,
    {
        let sender = self
            .sender()
            .with_context(|| {
                format!(
                    "EventBus: cannot start '{}' once the bus is receiving or closed",
                    name
                )
            })?;

        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Err(e) = body(sender) {
                    error!("EventBus: producer '{}' failed: {:#}", thread_name, e);
                }
                debug!("EventBus: producer '{}' exited.", thread_name);
            })
            .with_context(|| format!("Failed to spawn producer thread '{}'", name))?;

        info!("EventBus: producer '{}' started.", name);
        self.producers.push(Producer {
            name: name.to_string(),
            handle: Some(handle),
            stop,
        });
        Ok(())
    }

    /// Next event, blocking. `None` once the bus is closed or every producer
    /// has exited and the queue is drained.
    pub fn recv(&mut self) -> Option<InputEvent> {
        // Only producers keep the stream alive from here on.
        self.tx = None;
        let event = self.rx.as_ref()?.recv().ok();
        if let Some(ref event) = event {
            trace!("EventBus: delivering {:?}", event);
        }
        event
    }

    /// Like `recv`, giving up after `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<InputEvent, RecvTimeoutError> {
        self.tx = None;
        match self.rx.as_ref() {
            Some(rx) => rx.recv_timeout(timeout),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops every producer and waits for their threads. Idempotent.
    pub fn close(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(
                "EventBus: closing, stopping {} producers.",
                self.producers.len()
            );
        }

        for producer in &mut self.producers {
            if let Some(stop) = producer.stop.take() {
                trace!("EventBus: running stop hook of '{}'.", producer.name);
                stop();
            }
        }

        self.tx = None;
        self.rx = None;

        for mut producer in self.producers.drain(..) {
            if let Some(handle) = producer.handle.take() {
                if handle.join().is_err() {
                    warn!("EventBus: producer '{}' panicked.", producer.name);
                }
            }
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.close();
    }
}
