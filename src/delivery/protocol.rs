// Wire protocol spoken with the local log delivery service

use crate::error::{DeliveryError, LogsError, Result};
use crate::logs::LogLine;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of the device whose logs are requested
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id, rejecting empty or whitespace-only input
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(LogsError::InvalidDeviceId(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = LogsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commands understood by the delivery service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryCommand {
    /// Replay the stored log backlog, then end the stream
    History { device: DeviceId },
    /// Open a live subscription for new log lines
    Subscribe { device: DeviceId },
}

/// Request message from client to delivery service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub command: DeliveryCommand,
}

impl Request {
    pub fn new(id: u64, command: DeliveryCommand) -> Self {
        Self { id, command }
    }
}

/// Classification of an error reported by the delivery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    NotFound,
    Unauthorized,
    #[default]
    Other,
}

/// Error payload sent by the delivery service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl From<RemoteError> for DeliveryError {
    fn from(err: RemoteError) -> Self {
        match err.kind {
            RemoteErrorKind::NotFound => DeliveryError::NotFound(err.message),
            RemoteErrorKind::Unauthorized => DeliveryError::Unauthorized(err.message),
            RemoteErrorKind::Other => DeliveryError::Remote(err.message),
        }
    }
}

/// One newline-delimited frame of a delivery service reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// A log line (history or live)
    Line(LogLine),
    /// History backlog exhausted
    End,
    /// Live subscription is open
    Subscribed,
    /// Request failed; no further frames follow
    Error(RemoteError),
}

impl Frame {
    /// Short name of the frame, used in protocol error messages
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Line(_) => "line",
            Frame::End => "end",
            Frame::Subscribed => "subscribed",
            Frame::Error(_) => "error",
        }
    }
}

/// Frame tagged with the id of the request it answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub frame: Frame,
}

impl Reply {
    pub fn new(id: u64, frame: Frame) -> Self {
        Self { id, frame }
    }
}
