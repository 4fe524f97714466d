use super::*;
use std::sync::{atomic::AtomicUsize, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{oneshot, Notify};

use crate::error::RequestError;

const WAIT: Duration = Duration::from_secs(5);

fn unavailable() -> RequestError {
    RequestError::Http {
        status: 503,
        status_text: "Service Unavailable".to_string(),
        url: "http://robot.local:5001/api/status".to_string(),
        body: String::new(),
    }
}

fn healthy() -> RobotStatus {
    RobotStatus {
        connected: true,
        battery: Some(87),
        status: "ok".to_string(),
        extra: Default::default(),
    }
}

/// Fails for the first `failures` calls, then reports `healthy()`.
struct ScriptedStatus {
    failures: usize,
    calls: AtomicUsize,
}

impl ScriptedStatus {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedStatus {
    async fn fetch_status(&self) -> Result<RobotStatus, RequestError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(unavailable())
        } else {
            Ok(healthy())
        }
    }
}

/// Holds every fetch until the gate opens.
struct GatedStatus {
    gate: Notify,
    started: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait]
impl StatusSource for GatedStatus {
    async fn fetch_status(&self) -> Result<RobotStatus, RequestError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(healthy())
    }
}

type PendingFetch = oneshot::Sender<Result<RobotStatus, RequestError>>;

/// Parks every fetch until the test hands it an answer, in any order.
#[derive(Default)]
struct HeldStatus {
    pending: Mutex<Vec<Option<PendingFetch>>>,
}

impl HeldStatus {
    fn started(&self) -> usize {
        self.pending.lock().expect("pending lock").len()
    }

    fn answer(&self, fetch: usize, result: Result<RobotStatus, RequestError>) {
        let reply = self.pending.lock().expect("pending lock")[fetch]
            .take()
            .expect("fetch answered twice");
        let _ = reply.send(result);
    }
}

#[async_trait]
impl StatusSource for HeldStatus {
    async fn fetch_status(&self) -> Result<RobotStatus, RequestError> {
        let (reply, answer) = oneshot::channel();
        self.pending.lock().expect("pending lock").push(Some(reply));
        answer.await.unwrap_or_else(|_| Err(unavailable()))
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    time::timeout(WAIT, async {
        while !condition() {
            time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn starts_with_connecting_placeholder() {
    let source = ScriptedStatus::new(0);
    let poller = StatusPoller::spawn(source);
    assert_eq!(poller.current(), RobotStatus::connecting());
    assert!(poller.is_running());
}

#[tokio::test]
async fn successful_poll_exposes_response_verbatim() {
    let source = ScriptedStatus::new(0);
    let poller = StatusPoller::spawn(source.clone());
    let mut rx = poller.subscribe();

    let status = time::timeout(WAIT, rx.wait_for(|status| status.connected))
        .await
        .expect("timely poll")
        .expect("poller alive")
        .clone();

    assert_eq!(status, healthy());
    assert_eq!(
        serde_json::to_value(&status).expect("encode"),
        json!({ "connected": true, "battery": 87, "status": "ok" })
    );
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn failed_poll_degrades_to_disconnected() {
    let source = ScriptedStatus::new(usize::MAX);
    let poller = StatusPoller::spawn(source);
    let mut rx = poller.subscribe();

    let status = time::timeout(WAIT, rx.wait_for(|status| status.status != "Connecting..."))
        .await
        .expect("timely poll")
        .expect("poller alive")
        .clone();

    assert_eq!(status, RobotStatus::disconnected());
    assert_eq!(status.battery, None);
    assert!(!status.connected);
}

#[tokio::test]
async fn keeps_polling_and_recovers_after_failures() {
    let source = ScriptedStatus::new(2);
    let poller = StatusPoller::spawn_with_interval(source.clone(), Duration::from_millis(20));
    let mut rx = poller.subscribe();

    let status = time::timeout(WAIT, rx.wait_for(|status| status.connected))
        .await
        .expect("timely recovery")
        .expect("poller alive")
        .clone();

    assert_eq!(status, healthy());
    assert!(source.calls() >= 3);
}

#[tokio::test]
async fn stop_discards_results_still_in_flight() {
    let source = Arc::new(GatedStatus {
        gate: Notify::new(),
        started: AtomicUsize::new(0),
        finished: AtomicUsize::new(0),
    });
    let mut poller = StatusPoller::spawn(source.clone());
    let rx = poller.subscribe();

    wait_until(|| source.started.load(Ordering::SeqCst) == 1).await;
    poller.stop();
    assert!(!poller.is_running());

    source.gate.notify_one();
    wait_until(|| source.finished.load(Ordering::SeqCst) == 1).await;
    time::sleep(Duration::from_millis(20)).await;

    assert_eq!(*rx.borrow(), RobotStatus::connecting());
    assert_eq!(poller.current(), RobotStatus::connecting());
}

#[tokio::test]
async fn dropping_the_poller_stops_the_timer() {
    let source = ScriptedStatus::new(0);
    let poller = StatusPoller::spawn_with_interval(source.clone(), Duration::from_millis(10));

    wait_until(|| source.calls() >= 2).await;
    drop(poller);
    time::sleep(Duration::from_millis(20)).await;
    let calls_after_drop = source.calls();

    time::sleep(Duration::from_millis(60)).await;
    assert_eq!(source.calls(), calls_after_drop);
}

#[tokio::test]
async fn overlapping_fetches_keep_whichever_resolves_last() {
    let source = Arc::new(HeldStatus::default());
    let poller = StatusPoller::spawn_with_interval(source.clone(), Duration::from_millis(10));
    let mut rx = poller.subscribe();

    wait_until(|| source.started() >= 2).await;

    // The second tick's fetch answers first.
    source.answer(1, Ok(healthy()));
    time::timeout(WAIT, rx.wait_for(|status| status.connected))
        .await
        .expect("timely success")
        .expect("poller alive");

    // The first tick's fetch lands late with a failure and wins.
    source.answer(0, Err(unavailable()));
    let status = time::timeout(WAIT, rx.wait_for(|status| !status.connected))
        .await
        .expect("timely failure")
        .expect("poller alive")
        .clone();

    assert_eq!(status, RobotStatus::disconnected());
    assert_eq!(poller.current(), RobotStatus::disconnected());
}

#[tokio::test]
async fn identical_results_do_not_wake_subscribers() {
    let source = ScriptedStatus::new(0);
    let poller = StatusPoller::spawn_with_interval(source.clone(), Duration::from_millis(10));
    let mut rx = poller.subscribe();

    time::timeout(WAIT, rx.wait_for(|status| status.connected))
        .await
        .expect("timely poll")
        .expect("poller alive");

    let calls_seen = source.calls();
    wait_until(|| source.calls() >= calls_seen + 3).await;
    time::sleep(Duration::from_millis(20)).await;

    assert!(!rx.has_changed().expect("poller alive"));
    assert_eq!(poller.current(), healthy());
}
