// Socket client for the local log delivery service

use crate::config::Config;
use crate::delivery::{
    DeliveryCommand, DeviceId, Frame, HistoryStream, LogDelivery, Reply, Request, Subscription,
    SubscriptionEvent,
};
use crate::error::DeliveryError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::debug;

type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

/// Default socket path of the delivery service
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/devlogs.sock";

/// Default capacity of the live subscription event channel
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 256;

/// Longest reply line accepted from the service, newline excluded
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Log delivery over newline-delimited JSON on a Unix socket
///
/// Every history replay and every subscription uses its own connection.
pub struct SocketDelivery {
    socket_path: PathBuf,
    subscription_buffer: usize,
    max_frame_bytes: usize,
    request_id: AtomicU64,
}

impl SocketDelivery {
    /// Create a client for the default socket path
    pub fn new() -> Self {
        Self::with_socket_path(DEFAULT_SOCKET_PATH)
    }

    /// Create a client for a custom socket path
    pub fn with_socket_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
            max_frame_bytes: MAX_FRAME_BYTES,
            request_id: AtomicU64::new(1),
        }
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_socket_path(&config.socket_path)
            .with_subscription_buffer(config.subscription_buffer)
    }

    pub fn with_subscription_buffer(mut self, capacity: usize) -> Self {
        self.subscription_buffer = capacity.max(1);
        self
    }

    /// Limit the size of a single reply line
    pub fn with_max_frame_bytes(mut self, limit: usize) -> Self {
        self.max_frame_bytes = limit.max(1);
        self
    }

    /// Get the socket path being used
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn next_request(&self, command: DeliveryCommand) -> Request {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        Request::new(id, command)
    }
}

impl Default for SocketDelivery {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads reply frames belonging to one request
struct FrameReader {
    request_id: u64,
    max_frame_bytes: usize,
    reader: BufReader<UnixStream>,
}

impl FrameReader {
    fn new(stream: UnixStream, request_id: u64, max_frame_bytes: usize) -> Self {
        Self {
            request_id,
            max_frame_bytes,
            reader: BufReader::new(stream),
        }
    }

    /// Connect, send the request and prepare to read its replies
    async fn open(
        socket_path: &Path,
        request: &Request,
        max_frame_bytes: usize,
    ) -> DeliveryResult<Self> {
        let mut stream = connect(socket_path).await?;

        let request_json = serde_json::to_string(request).map_err(|e| {
            DeliveryError::Protocol(format!("Failed to serialize request: {}", e))
        })?;

        stream.write_all(request_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        debug!(
            "Sent request {} to {}: {:?}",
            request.id,
            socket_path.display(),
            request.command
        );

        Ok(Self::new(stream, request.id, max_frame_bytes))
    }

    /// Read one reply line of at most `max_frame_bytes`, `None` on end of connection
    async fn next_line(&mut self) -> DeliveryResult<Option<String>> {
        let mut buf = Vec::new();
        let limit = (self.max_frame_bytes as u64).saturating_add(1);
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if read == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if buf.len() > self.max_frame_bytes {
            return Err(DeliveryError::Protocol(format!(
                "reply frame exceeds {} bytes",
                self.max_frame_bytes
            )));
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|e| DeliveryError::Protocol(format!("reply frame is not UTF-8: {}", e)))
    }

    /// Read the next frame, `None` on end of connection
    async fn next_frame(&mut self) -> DeliveryResult<Option<Frame>> {
        loop {
            let Some(line) = self.next_line().await? else {
                return Ok(None);
            };

            if line.trim().is_empty() {
                continue;
            }

            let reply: Reply = serde_json::from_str(&line).map_err(|e| {
                DeliveryError::Protocol(format!("Failed to deserialize reply: {}", e))
            })?;

            if reply.id != self.request_id {
                return Err(DeliveryError::Protocol(format!(
                    "Reply ID mismatch: expected {}, got {}",
                    self.request_id, reply.id
                )));
            }

            return Ok(Some(reply.frame));
        }
    }
}

/// Establish a connection to the delivery service socket
async fn connect(socket_path: &Path) -> DeliveryResult<UnixStream> {
    if !socket_path.exists() {
        return Err(DeliveryError::Connection(format!(
            "no delivery service socket at {}",
            socket_path.display()
        )));
    }

    UnixStream::connect(socket_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::ConnectionRefused
            || e.kind() == std::io::ErrorKind::NotFound
        {
            DeliveryError::Connection(format!("{}: {}", socket_path.display(), e))
        } else {
            DeliveryError::Io(e)
        }
    })
}

enum HistoryState {
    Pending {
        socket_path: PathBuf,
        request: Request,
        max_frame_bytes: usize,
    },
    Open(FrameReader),
    Done,
}

#[async_trait]
impl LogDelivery for SocketDelivery {
    fn history(&self, device: &DeviceId) -> HistoryStream {
        let request = self.next_request(DeliveryCommand::History {
            device: device.clone(),
        });
        let initial = HistoryState::Pending {
            socket_path: self.socket_path.clone(),
            request,
            max_frame_bytes: self.max_frame_bytes,
        };

        stream::unfold(initial, |state| async move {
            let mut reader = match state {
                HistoryState::Done => return None,
                HistoryState::Open(reader) => reader,
                HistoryState::Pending {
                    socket_path,
                    request,
                    max_frame_bytes,
                } => match FrameReader::open(&socket_path, &request, max_frame_bytes).await {
                    Ok(reader) => reader,
                    Err(e) => return Some((Err(e), HistoryState::Done)),
                },
            };

            match reader.next_frame().await {
                Ok(Some(Frame::Line(line))) => Some((Ok(line), HistoryState::Open(reader))),
                Ok(Some(Frame::End)) => None,
                Ok(Some(Frame::Error(err))) => Some((Err(err.into()), HistoryState::Done)),
                Ok(Some(other)) => Some((
                    Err(DeliveryError::Protocol(format!(
                        "unexpected {} frame in history reply",
                        other.name()
                    ))),
                    HistoryState::Done,
                )),
                Ok(None) => Some((
                    Err(DeliveryError::Protocol(
                        "history reply ended before end marker".to_string(),
                    )),
                    HistoryState::Done,
                )),
                Err(e) => Some((Err(e), HistoryState::Done)),
            }
        })
        .boxed()
    }

    async fn subscribe(&self, device: &DeviceId) -> DeliveryResult<Subscription> {
        let request = self.next_request(DeliveryCommand::Subscribe {
            device: device.clone(),
        });
        let mut reader =
            FrameReader::open(&self.socket_path, &request, self.max_frame_bytes).await?;

        match reader.next_frame().await? {
            Some(Frame::Subscribed) => {}
            Some(Frame::Error(err)) => return Err(err.into()),
            Some(other) => {
                return Err(DeliveryError::Protocol(format!(
                    "expected subscription acknowledgement, got {} frame",
                    other.name()
                )))
            }
            None => return Err(DeliveryError::Closed),
        }

        debug!("Live subscription open for device {}", device);

        let (tx, rx) = mpsc::channel(self.subscription_buffer);

        let task_handle = tokio::spawn(async move {
            loop {
                let event = match reader.next_frame().await {
                    Ok(Some(Frame::Line(line))) => SubscriptionEvent::Line(line),
                    Ok(Some(Frame::Error(err))) => SubscriptionEvent::Error(err.into()),
                    Ok(Some(other)) => SubscriptionEvent::Error(DeliveryError::Protocol(format!(
                        "unexpected {} frame on live subscription",
                        other.name()
                    ))),
                    Ok(None) => SubscriptionEvent::Error(DeliveryError::Closed),
                    Err(e) => SubscriptionEvent::Error(e),
                };

                let terminal = matches!(event, SubscriptionEvent::Error(_));
                if tx.send(event).await.is_err() {
                    // Receiver dropped, exit
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        Ok(Subscription::with_task(rx, task_handle))
    }
}
