// Delivery module - Access to device log history and live subscriptions

pub mod client;
pub mod protocol;

use crate::error::DeliveryError;
use crate::logs::LogLine;
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use client::SocketDelivery;
pub use protocol::{DeliveryCommand, DeviceId, Frame, RemoteError, RemoteErrorKind, Reply, Request};

/// Lazy, finite, ordered log backlog of a device
///
/// Nothing is requested from the service until the stream is first polled.
/// The stream is single-pass; replaying the backlog again needs a new call to
/// [`LogDelivery::history`].
pub type HistoryStream = BoxStream<'static, std::result::Result<LogLine, DeliveryError>>;

/// Event delivered on an open live subscription
#[derive(Debug)]
pub enum SubscriptionEvent {
    /// A new log line was produced
    Line(LogLine),
    /// The subscription failed; no further events follow
    Error(DeliveryError),
}

/// Handle to an open live log subscription
///
/// Events arrive over a single ordered channel. Dropping the handle releases
/// the subscription and stops any background reader.
pub struct Subscription {
    receiver: mpsc::Receiver<SubscriptionEvent>,
    task_handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a channel fed by some other owner
    pub fn new(receiver: mpsc::Receiver<SubscriptionEvent>) -> Self {
        Self {
            receiver,
            task_handle: None,
        }
    }

    /// Wrap a channel fed by a background task owned by this subscription
    pub fn with_task(receiver: mpsc::Receiver<SubscriptionEvent>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task_handle: Some(task),
        }
    }

    /// Receive the next subscription event
    ///
    /// # Returns
    /// * `Some(SubscriptionEvent)` - Next event
    /// * `None` - The producing side went away
    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task_handle.take() {
            task.abort();
        }
    }
}

/// Source of device logs
#[async_trait]
pub trait LogDelivery: Send + Sync {
    /// Request the full stored log backlog of a device
    fn history(&self, device: &DeviceId) -> HistoryStream;

    /// Open a live subscription for new log lines of a device
    async fn subscribe(&self, device: &DeviceId) -> std::result::Result<Subscription, DeliveryError>;
}
