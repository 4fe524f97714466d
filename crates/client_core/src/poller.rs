use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::protocol::RobotStatus;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::client::StatusSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct PollerShared {
    status: watch::Sender<RobotStatus>,
    alive: AtomicBool,
}

/// Keeps a live connection/battery snapshot for the header display.
///
/// Polls once right away and then on every interval tick. Fetch failures
/// never reach the caller; they degrade the snapshot to "Disconnected".
pub struct StatusPoller {
    shared: Arc<PollerShared>,
    timer: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn spawn(source: Arc<dyn StatusSource>) -> Self {
        Self::spawn_with_interval(source, DEFAULT_POLL_INTERVAL)
    }

    pub fn spawn_with_interval(source: Arc<dyn StatusSource>, interval: Duration) -> Self {
        let (status, _) = watch::channel(RobotStatus::connecting());
        let shared = Arc::new(PollerShared {
            status,
            alive: AtomicBool::new(true),
        });

        let timer_shared = Arc::clone(&shared);
        let interval = interval.max(MIN_POLL_INTERVAL);
        let timer = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !timer_shared.alive.load(Ordering::Acquire) {
                    break;
                }
                // Each fetch runs on its own so a slow robot never delays the
                // next tick; whichever result lands last wins.
                let source = Arc::clone(&source);
                let shared = Arc::clone(&timer_shared);
                tokio::spawn(async move {
                    poll_once(source.as_ref(), &shared).await;
                });
            }
        });

        Self {
            shared,
            timer: Some(timer),
        }
    }

    pub fn current(&self) -> RobotStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RobotStatus> {
        self.shared.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Cancels the timer. Fetches already in flight run to completion but
    /// their results are dropped.
    pub fn stop(&mut self) {
        // Flipped under the channel's write lock so no publish can straddle it.
        self.shared.status.send_if_modified(|_| {
            self.shared.alive.store(false, Ordering::Release);
            false
        });
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("status poller stopped");
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_once(source: &dyn StatusSource, shared: &PollerShared) {
    let next = match source.fetch_status().await {
        Ok(status) => status,
        Err(err) => {
            warn!("robot status poll failed: {err}");
            RobotStatus::disconnected()
        }
    };

    // Subscribers only wake when the snapshot actually changes.
    shared.status.send_if_modified(|current| {
        if !shared.alive.load(Ordering::Acquire) {
            debug!("discarding status result that arrived after teardown");
            return false;
        }
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
