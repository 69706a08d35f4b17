use std::sync::{Arc, Mutex};
use std::time::Duration;

use baflink_proto::{Encoding, Message};
use baflink_transport::SerialLink;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::MonitorError;
use crate::status::LinkStatus;

/// Poll scheduling knobs.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between poll ticks.
    pub interval: Duration,
    /// How many times to re-check the connection before a start attempt
    /// gives up.
    pub connect_retries: u32,
    /// Delay between connect-wait checks.
    pub retry_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            connect_retries: 90,
            retry_interval: Duration::from_millis(100),
        }
    }
}

/// Everything a poll task needs to run on its own.
pub(crate) struct PollContext {
    pub link: Arc<dyn SerialLink>,
    pub status: watch::Receiver<LinkStatus>,
    pub sent_tx: watch::Sender<Message>,
    pub request: Message,
    pub encoding: Encoding,
}

enum Phase {
    Idle,
    /// A start call is waiting for the link to connect.
    Starting(CancellationToken),
    Running {
        token: CancellationToken,
        handle: JoinHandle<()>,
    },
}

/// At-most-one cancellable periodic poll task.
pub(crate) struct Poller {
    phase: Mutex<Phase>,
}

impl Poller {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn is_active(&self) -> bool {
        match &*self.phase.lock().expect("poller phase") {
            Phase::Idle => false,
            Phase::Starting(_) => true,
            Phase::Running { handle, .. } => !handle.is_finished(),
        }
    }

    /// Start polling. A duplicate call while a task is active (or another
    /// start is in flight) succeeds without starting a second loop.
    ///
    /// Waits, bounded by `config.connect_retries`, for the status stream to
    /// report `Connected` before the loop is spawned; running out of budget
    /// fails the call and leaves the poller idle.
    pub async fn start(&self, ctx: PollContext, config: &PollConfig) -> Result<(), MonitorError> {
        let token = {
            let mut phase = self.phase.lock().expect("poller phase");
            match &*phase {
                Phase::Starting(_) => {
                    debug!("polling already starting");
                    return Ok(());
                }
                Phase::Running { handle, .. } if !handle.is_finished() => {
                    debug!("polling already active");
                    return Ok(());
                }
                _ => {
                    let token = CancellationToken::new();
                    *phase = Phase::Starting(token.clone());
                    token
                }
            }
        };

        let mut attempts = 0u32;
        loop {
            if token.is_cancelled() {
                // Stopped before the loop ever ran.
                self.set_idle();
                return Ok(());
            }
            if ctx.status.borrow().is_connected() {
                break;
            }
            if attempts >= config.connect_retries {
                warn!(attempts, "gave up waiting for connection");
                self.set_idle();
                return Err(MonitorError::ConnectWaitTimeout { attempts });
            }
            attempts += 1;
            tokio::time::sleep(config.retry_interval).await;
        }

        let interval = config.interval;
        let handle = tokio::spawn(poll_loop(ctx, interval, token.clone()));
        *self.phase.lock().expect("poller phase") = Phase::Running { token, handle };
        Ok(())
    }

    /// Cancel the active task, if any. Idempotent; after this returns no
    /// further sends are issued beyond one already-dispatched tick.
    pub fn stop(&self) {
        let mut phase = self.phase.lock().expect("poller phase");
        match std::mem::replace(&mut *phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Starting(token) => {
                info!("stopping polling before it started");
                token.cancel();
            }
            Phase::Running { token, .. } => {
                info!("stopping polling");
                token.cancel();
            }
        }
    }

    fn set_idle(&self) {
        *self.phase.lock().expect("poller phase") = Phase::Idle;
    }
}

async fn poll_loop(ctx: PollContext, interval: Duration, token: CancellationToken) {
    debug!(?interval, request = ctx.request.kind_name(), "polling started");
    let bytes = ctx.request.to_bytes(ctx.encoding);
    loop {
        if token.is_cancelled() {
            break;
        }
        if ctx.status.borrow().is_connected() {
            match ctx.link.send(&bytes) {
                Ok(()) => {
                    trace!(frame = %hex::encode(&bytes), "poll tick sent");
                    ctx.sent_tx.send_replace(ctx.request.clone());
                }
                Err(err) => warn!(%err, "poll tick failed to send"),
            }
        } else {
            debug!("poll tick skipped, device not connected");
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    info!("polling stopped");
}
