//! Lifecycle event stream.
//!
//! A service can hand out an [`EventStream`] of [`ServiceEvent`]s describing
//! what happened to its adapters. Emission never blocks: when the channel is
//! full or nobody listens, the event is dropped.

use std::fmt;
use std::pin::Pin;

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::adapter::Method;

/// Type alias for a boxed async stream of events.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Why an adapter configuration was not activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The adapter is not configured for the current environment.
    Environment,
    /// The adapter cannot run in headless mode.
    Headless,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Environment => f.write_str("environment"),
            SkipReason::Headless => f.write_str("headless"),
        }
    }
}

/// Something that happened to an adapter owned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A new adapter instance was constructed.
    AdapterActivated { adapter: String },
    /// Re-activation found the adapter already running and kept it.
    AdapterReused { adapter: String },
    /// A configured adapter was not activated.
    AdapterSkipped { adapter: String, reason: SkipReason },
    /// Re-activation left the adapter out; it has been destroyed.
    AdapterDropped { adapter: String },
    /// The adapter was destroyed at teardown.
    AdapterDestroyed { adapter: String },
    /// A call was delivered to the adapter.
    Dispatched { method: Method, adapter: String },
}

/// A sender for events in an async stream.
#[derive(Debug)]
pub struct EventSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> EventSender<T> {
    /// Create a new event sender from an mpsc sender.
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Try to send an event without waiting.
    ///
    /// Returns `Err(event)` if the channel is full or closed.
    pub fn try_send(&self, event: T) -> Result<(), T> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(v) => v,
            mpsc::error::TrySendError::Closed(v) => v,
        })
    }

    /// Check if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Builder for creating event streams.
pub struct StreamBuilder<T> {
    buffer_size: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Send + 'static> StreamBuilder<T> {
    /// Default channel capacity.
    pub const DEFAULT_BUFFER_SIZE: usize = 100;

    pub fn new() -> Self {
        Self {
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            _marker: std::marker::PhantomData,
        }
    }

    /// Set the buffer size for the underlying channel.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Build the stream and sender.
    pub fn build(self) -> (EventSender<T>, EventStream<T>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let sender = EventSender::new(tx);
        let stream: EventStream<T> = Box::pin(ReceiverStream::new(rx));
        (sender, stream)
    }
}

impl<T: Send + 'static> Default for StreamBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
