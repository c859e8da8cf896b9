// Session - Replays device log history and optionally follows live logs

use crate::delivery::{DeviceId, LogDelivery, Subscription, SubscriptionEvent};
use crate::error::{DeliveryError, LogsError, Result};
use crate::logs::LineRenderer;
use futures::StreamExt;
use std::io::Write;
use tracing::{debug, info};

/// Lifecycle of a session
///
/// `Init -> Replaying -> (Terminated | TailPending) -> Tailing -> Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Replaying,
    TailPending,
    Tailing,
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Init => write!(f, "init"),
            SessionState::Replaying => write!(f, "replaying"),
            SessionState::TailPending => write!(f, "tail-pending"),
            SessionState::Tailing => write!(f, "tailing"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// Hook used to end the process once a history-only session completes
///
/// The delivery transport may keep connections alive after a history query,
/// so a finished session ends the process explicitly instead of waiting for
/// the runtime to drain.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

/// Terminates the current process
pub struct ForcedExit;

impl ProcessExit for ForcedExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// One invocation of the log client for a single device
pub struct Session<D, W, X>
where
    D: LogDelivery,
    W: Write,
    X: ProcessExit,
{
    device: DeviceId,
    tail: bool,
    delivery: D,
    renderer: LineRenderer<W>,
    exit: X,
    state: SessionState,
    status: SessionStatus,
}

impl<D, W, X> Session<D, W, X>
where
    D: LogDelivery,
    W: Write,
    X: ProcessExit,
{
    pub fn new(device: DeviceId, tail: bool, delivery: D, renderer: LineRenderer<W>, exit: X) -> Self {
        Self {
            device,
            tail,
            delivery,
            renderer,
            exit,
            state: SessionState::Init,
            status: SessionStatus::Running,
        }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Number of lines rendered so far, history and live combined
    pub fn rendered(&self) -> u64 {
        self.renderer.rendered()
    }

    /// Run the session to its terminal state
    ///
    /// Without tailing, a successful replay ends the process through the exit
    /// hook with code 0; if the hook returns, `Completed` is returned. With
    /// tailing, the call only returns once the live subscription fails.
    /// Any failure is returned as an error for the caller to report.
    pub async fn run(&mut self) -> Result<SessionStatus> {
        if self.state != SessionState::Init {
            return Err(LogsError::SessionAlreadyRun);
        }

        self.transition(SessionState::Replaying);
        if let Err(e) = self.replay_history().await {
            return Err(self.fail(e));
        }

        if !self.tail {
            if let Err(e) = self.renderer.flush() {
                return Err(self.fail(e));
            }
            self.finish(SessionStatus::Completed);
            info!("History for {} complete, exiting", self.device);
            self.exit.exit(0);
            return Ok(SessionStatus::Completed);
        }

        self.transition(SessionState::TailPending);
        let subscription = match self.delivery.subscribe(&self.device).await {
            Ok(subscription) => subscription,
            Err(e) => return Err(self.fail(LogsError::Subscribe(e))),
        };

        self.transition(SessionState::Tailing);
        let err = self.follow(subscription).await;
        Err(self.fail(err))
    }

    /// Render every history line, one at a time, in delivery order
    async fn replay_history(&mut self) -> Result<()> {
        let mut history = self.delivery.history(&self.device);
        let mut replayed = 0u64;

        while let Some(item) = history.next().await {
            let line = item.map_err(LogsError::History)?;
            self.renderer.print(&line)?;
            replayed += 1;
        }

        debug!("Replayed {} history lines for {}", replayed, self.device);
        Ok(())
    }

    /// Render live lines until the subscription fails
    async fn follow(&mut self, mut subscription: Subscription) -> LogsError {
        loop {
            match subscription.next().await {
                Some(SubscriptionEvent::Line(line)) => {
                    if let Err(e) = self.renderer.print(&line) {
                        return e;
                    }
                }
                Some(SubscriptionEvent::Error(e)) => return LogsError::Subscription(e),
                None => return LogsError::Subscription(DeliveryError::Closed),
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {}: {} -> {}", self.device, self.state, next);
        self.state = next;
    }

    fn finish(&mut self, status: SessionStatus) {
        self.transition(SessionState::Terminated);
        self.status = status;
    }

    fn fail(&mut self, err: LogsError) -> LogsError {
        debug!("Session {} failed while {}: {}", self.device, self.state, err);
        self.finish(SessionStatus::Failed);
        err
    }
}
