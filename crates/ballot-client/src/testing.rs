//! # Test Doubles
//!
//! Deterministic implementations of the outbound ports, available to this
//! crate's tests and, with the `test-utils` feature, to other crates.

use async_trait::async_trait;
use connectivity_bus::NetworkHealth;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::domain::{
    DeliveryFailure, DeliveryReceipt, IncidentKind, IncidentReport, KVStoreError, Screen,
    Timestamp, VoteChoice, VotingToken,
};
use crate::ports::{HealthProbe, IncidentSink, KeyValueStore, TerminalView, TimeSource, VoteGateway};

// =============================================================================
// CLOCKS
// =============================================================================

/// Time source that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    /// Start at `millis` since the epoch.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Jump to an absolute instant.
    pub fn set_millis(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move forward.
    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move forward by a `Duration`.
    pub fn advance(&self, by: Duration) {
        self.advance_millis(by.as_millis() as u64);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Time source following tokio's clock, so paused-time tests see the same
/// elapsed time as the watchdog's interval.
#[derive(Debug)]
pub struct TokioClock {
    base: Timestamp,
    start: tokio::time::Instant,
}

impl TokioClock {
    /// Start at `base_millis`. Must be created inside a runtime with time enabled.
    pub fn new(base_millis: u64) -> Self {
        Self {
            base: Timestamp::from_millis(base_millis),
            start: tokio::time::Instant::now(),
        }
    }
}

impl TimeSource for TokioClock {
    fn now(&self) -> Timestamp {
        self.base.plus_millis(self.start.elapsed().as_millis() as u64)
    }
}

// =============================================================================
// VOTE GATEWAY
// =============================================================================

/// Vote endpoint replaying queued results, then a fallback.
pub struct ScriptedVoteGateway {
    script: Mutex<VecDeque<Result<DeliveryReceipt, DeliveryFailure>>>,
    fallback: Mutex<Result<DeliveryReceipt, DeliveryFailure>>,
    calls: Mutex<Vec<(String, VoteChoice)>>,
    held: AtomicBool,
    gate: Semaphore,
}

impl Default for ScriptedVoteGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedVoteGateway {
    /// Accepts every vote with HTTP 200.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(DeliveryReceipt { status: 200 })),
            calls: Mutex::new(Vec::new()),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    /// Fails every vote with a transport error until told otherwise.
    pub fn offline() -> Self {
        let gateway = Self::new();
        gateway.set_offline();
        gateway
    }

    /// Queue one result ahead of the fallback.
    pub fn push(&self, result: Result<DeliveryReceipt, DeliveryFailure>) {
        self.script.lock().push_back(result);
    }

    /// Queue one rejection with `status`.
    pub fn push_rejection(&self, status: u16, body: &str) {
        self.push(Err(DeliveryFailure::Rejected {
            status,
            body: body.to_string(),
        }));
    }

    /// Fallback: transport failure.
    pub fn set_offline(&self) {
        *self.fallback.lock() = Err(DeliveryFailure::Transport("network unreachable".to_string()));
    }

    /// Fallback: HTTP 200.
    pub fn set_online(&self) {
        *self.fallback.lock() = Ok(DeliveryReceipt { status: 200 });
    }

    /// Make subsequent calls wait until `release`.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let held calls complete.
    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.add_permits(1024);
    }

    /// Choices received, in order.
    pub fn delivered_choices(&self) -> Vec<VoteChoice> {
        self.calls.lock().iter().map(|(_, c)| *c).collect()
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Tokens received, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl VoteGateway for ScriptedVoteGateway {
    async fn submit_vote(
        &self,
        token: &VotingToken,
        choice: VoteChoice,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        self.calls.lock().push((token.as_str().to_string(), choice));
        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().clone())
    }
}

// =============================================================================
// HEALTH PROBE
// =============================================================================

/// Liveness probe replaying queued results, then a fallback.
pub struct ScriptedHealthProbe {
    script: Mutex<VecDeque<bool>>,
    reachable: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedHealthProbe {
    /// Probe answering `reachable` until scripted otherwise.
    pub fn new(reachable: bool) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            reachable: AtomicBool::new(reachable),
            calls: AtomicUsize::new(0),
        }
    }

    /// Change the fallback answer.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Queue results ahead of the fallback.
    pub fn push_results(&self, results: &[bool]) {
        self.script.lock().extend(results.iter().copied());
    }

    /// Number of probes issued.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedHealthProbe {
    async fn probe(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.reachable.load(Ordering::SeqCst))
    }
}

// =============================================================================
// INCIDENT SINK
// =============================================================================

/// Incident endpoint recording every report it is handed.
#[derive(Default)]
pub struct RecordingIncidentSink {
    reports: Mutex<Vec<IncidentReport>>,
    failure: Mutex<Option<DeliveryFailure>>,
}

impl RecordingIncidentSink {
    /// Sink accepting every report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent send.
    pub fn fail_with(&self, failure: DeliveryFailure) {
        *self.failure.lock() = Some(failure);
    }

    /// Every report handed to the sink, delivered or not.
    pub fn reports(&self) -> Vec<IncidentReport> {
        self.reports.lock().clone()
    }

    /// Kinds of every report, in order.
    pub fn kinds(&self) -> Vec<IncidentKind> {
        self.reports.lock().iter().map(|r| r.kind).collect()
    }

    /// Number of sends attempted.
    pub fn attempts(&self) -> usize {
        self.reports.lock().len()
    }
}

#[async_trait]
impl IncidentSink for RecordingIncidentSink {
    async fn send(&self, report: &IncidentReport) -> Result<(), DeliveryFailure> {
        self.reports.lock().push(report.clone());
        match self.failure.lock().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// Terminal view recording everything rendered.
#[derive(Default)]
pub struct RecordingView {
    screens: Mutex<Vec<Screen>>,
    health: Mutex<Vec<NetworkHealth>>,
}

impl RecordingView {
    /// Empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent screen.
    pub fn last_screen(&self) -> Option<Screen> {
        self.screens.lock().last().cloned()
    }

    /// All screens, in order.
    pub fn screens(&self) -> Vec<Screen> {
        self.screens.lock().clone()
    }

    /// All health indicator updates, in order.
    pub fn health_updates(&self) -> Vec<NetworkHealth> {
        self.health.lock().clone()
    }
}

impl TerminalView for RecordingView {
    fn render(&self, screen: &Screen) {
        self.screens.lock().push(screen.clone());
    }

    fn render_health(&self, health: NetworkHealth) {
        self.health.lock().push(health);
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Store whose writes always fail, e.g. a full or read-only disk.
#[derive(Default)]
pub struct FailingKVStore;

impl KeyValueStore for FailingKVStore {
    fn get(&self, _key: &str) -> Result<Option<String>, KVStoreError> {
        Ok(None)
    }

    fn put(&mut self, _key: &str, _value: &str) -> Result<(), KVStoreError> {
        Err(KVStoreError::IOError {
            message: "no space left on device".to_string(),
        })
    }

    fn delete(&mut self, _key: &str) -> Result<(), KVStoreError> {
        Err(KVStoreError::IOError {
            message: "no space left on device".to_string(),
        })
    }
}
