//! # Terminal Session
//!
//! Explicit context object owning everything one voting terminal needs:
//! the connectivity bus, watchdog, reporter and submission machine. Built at
//! start-up, torn down on shutdown.
//!
//! ## Background tasks
//!
//! | Task | Subscription | Reacts to |
//! |------|--------------|-----------|
//! | watchdog | `Platform` | tick, `Offline`, `Online` |
//! | resume | `All` | `Online`, `HealthChanged { Down -> Healthy }` |

use async_trait::async_trait;
use connectivity_bus::{
    ConnectivityEvent, EventFilter, EventTopic, InMemoryConnectivityBus, NetworkHealth, Subscription,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio::task::JoinHandle;

use crate::application::pending_store::PendingVoteStore;
use crate::application::reporter::{IncidentReporter, ReporterStats};
use crate::application::submission::SubmissionMachine;
use crate::application::watchdog::NetworkWatchdog;
use crate::config::TerminalConfig;
use crate::domain::{
    BallotError, HealthSnapshot, PendingVote, SubmissionState, SubmitOutcome, VoteChoice,
    VotingToken,
};
use crate::ports::{
    BallotTerminalApi, HealthProbe, IncidentSink, KeyValueStore, TerminalView, TimeSource,
    VoteGateway,
};

/// Port implementations a session is built from.
pub struct SessionDeps {
    /// Vote endpoint.
    pub gateway: Arc<dyn VoteGateway>,
    /// Liveness endpoint.
    pub probe: Arc<dyn HealthProbe>,
    /// Incident endpoint.
    pub incidents: Arc<dyn IncidentSink>,
    /// Durable storage for the pending vote.
    pub store: Box<dyn KeyValueStore>,
    /// Clock.
    pub clock: Arc<dyn TimeSource>,
    /// Terminal UI.
    pub view: Arc<dyn TerminalView>,
}

#[cfg(feature = "http")]
impl SessionDeps {
    /// Production wiring: reqwest transport, file-backed store, system clock.
    pub fn production(
        config: &TerminalConfig,
        view: Arc<dyn TerminalView>,
    ) -> Result<Self, BallotError> {
        let http = Arc::new(crate::adapters::HttpTerminalClient::new(config)?);
        let store = crate::adapters::FileBackedKVStore::open(config.pending_file())?;
        tracing::info!(path = %store.path().display(), "[bt] pending-vote store opened");
        Ok(Self {
            gateway: http.clone(),
            probe: http.clone(),
            incidents: http,
            store: Box::new(store),
            clock: Arc::new(crate::adapters::SystemTimeSource),
            view,
        })
    }
}

/// One voting terminal.
pub struct TerminalSession {
    config: TerminalConfig,
    token: VotingToken,
    bus: Arc<InMemoryConnectivityBus>,
    machine: Arc<SubmissionMachine>,
    watchdog: Arc<NetworkWatchdog>,
    reporter: Arc<IncidentReporter>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl TerminalSession {
    /// Build a session and reconstruct any pending vote.
    ///
    /// Renders the resume affordance if a pending record exists.
    pub fn new(
        config: TerminalConfig,
        token: VotingToken,
        deps: SessionDeps,
    ) -> Result<Self, BallotError> {
        config.validate()?;

        let SessionDeps {
            gateway,
            probe,
            incidents,
            store,
            clock,
            view,
        } = deps;

        let bus = Arc::new(InMemoryConnectivityBus::new());
        let reporter = Arc::new(IncidentReporter::new(
            incidents,
            clock.clone(),
            token.fingerprint(),
            config.incident_cooldown_ms,
            config.cooldown_scope,
        ));
        let watchdog = Arc::new(NetworkWatchdog::new(
            probe,
            clock.clone(),
            bus.clone(),
            reporter.clone(),
            view.clone(),
            config.probe_interval(),
            config.outage_threshold_ms,
        ));
        let pending_store = PendingVoteStore::new(&token, store, clock);
        let machine = Arc::new(SubmissionMachine::new(
            token.clone(),
            gateway,
            pending_store,
            reporter.clone(),
            view.clone(),
            config.pending_choice_policy,
        ));

        machine.restore();
        view.render_health(NetworkHealth::Healthy);

        let (shutdown_tx, _) = watch::channel(false);

        tracing::info!(
            token_fp = %token.fingerprint(),
            base_url = %config.base_url,
            "[bt] 🖥️ terminal session created"
        );

        Ok(Self {
            config,
            token,
            bus,
            machine,
            watchdog,
            reporter,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Spawn the watchdog and resume tasks.
    ///
    /// Subscriptions are taken before spawning so no event emitted after
    /// `start` returns is missed.
    pub fn start(&self) -> Result<(), BallotError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BallotError::AlreadyStarted);
        }

        let platform = self.bus.subscribe(EventFilter::topics(vec![EventTopic::Platform]));
        let all = self.bus.subscribe(EventFilter::all());

        let watchdog = tokio::spawn(
            self.watchdog
                .clone()
                .run(platform, self.shutdown_tx.subscribe()),
        );
        let resume = tokio::spawn(resume_loop(
            self.machine.clone(),
            all,
            self.shutdown_tx.subscribe(),
            self.config.resume_on_recovery,
            self.config.probe_interval(),
        ));

        self.tasks.lock().extend([watchdog, resume]);
        tracing::info!(
            probe_interval_ms = self.config.probe_interval_ms,
            "[bt] 🚀 terminal session started"
        );
        Ok(())
    }

    /// Signal background tasks to stop and wait for them.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "[bt] background task ended abnormally");
            }
        }
        tracing::info!("[bt] 🛑 terminal session stopped");
    }

    /// Connectivity bus, for additional subscribers.
    pub fn bus(&self) -> Arc<InMemoryConnectivityBus> {
        self.bus.clone()
    }

    /// Session configuration.
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Token fingerprint shown in status output.
    pub fn token_fingerprint(&self) -> String {
        self.token.fingerprint()
    }

    /// Incident dispatch counters.
    pub fn reporter_stats(&self) -> ReporterStats {
        self.reporter.stats()
    }

    /// Run one out-of-cycle probe.
    pub async fn probe_now(&self) -> NetworkHealth {
        self.watchdog.probe_now().await
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

#[async_trait]
impl BallotTerminalApi for TerminalSession {
    async fn vote(&self, choice: VoteChoice) -> Result<SubmitOutcome, BallotError> {
        self.machine.submit(choice).await
    }

    async fn retry(&self) -> Result<SubmitOutcome, BallotError> {
        self.machine.retry().await
    }

    fn notify_online(&self) {
        tracing::info!("[bt] platform online");
        self.bus.emit(ConnectivityEvent::Online);
    }

    fn notify_offline(&self) {
        tracing::info!("[bt] platform offline");
        self.bus.emit(ConnectivityEvent::Offline);
    }

    fn state(&self) -> SubmissionState {
        self.machine.state()
    }

    fn pending(&self) -> Option<PendingVote> {
        self.machine.pending()
    }

    fn health(&self) -> HealthSnapshot {
        self.watchdog.snapshot()
    }
}

/// Retry the pending vote whenever connectivity comes back.
///
/// An `Online` signal usually makes the watchdog leave `down` within the
/// same probe cycle. That recovery is the same reconnect, so a
/// `HealthChanged` arriving within one probe interval of an `Online`-driven
/// retry is not retried again.
async fn resume_loop(
    machine: Arc<SubmissionMachine>,
    mut events: Subscription,
    mut shutdown: watch::Receiver<bool>,
    resume_on_recovery: bool,
    probe_interval: Duration,
) {
    let mut online_retry_until: Option<Instant> = None;
    loop {
        let event = tokio::select! {
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        let trigger = match event {
            ConnectivityEvent::Online => true,
            ConnectivityEvent::HealthChanged { .. } if resume_on_recovery && event.is_reconnect() => {
                match online_retry_until.take() {
                    Some(until) if Instant::now() <= until => {
                        tracing::debug!("[bt] recovery follows online signal, already retried");
                        false
                    }
                    _ => true,
                }
            }
            ConnectivityEvent::HealthChanged { .. } | ConnectivityEvent::Offline => false,
        };
        if !trigger {
            continue;
        }

        let has_pending = matches!(machine.state(), SubmissionState::FailedPending { .. })
            || (matches!(machine.state(), SubmissionState::Idle) && machine.pending().is_some());
        if !has_pending {
            continue;
        }

        tracing::info!(trigger = event.name(), "[bt] 🔁 connectivity back, retrying pending vote");
        match machine.retry().await {
            Ok(outcome) => tracing::debug!(?outcome, "[bt] automatic retry finished"),
            Err(e) => tracing::debug!(error = %e, "[bt] automatic retry skipped"),
        }
        if matches!(event, ConnectivityEvent::Online) {
            online_retry_until = Some(Instant::now() + probe_interval);
        }
    }
}
