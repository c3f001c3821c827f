//! Vote-Terminal: unattended voting terminal runtime.
//!
//! Reads commands from stdin, renders the ballot screen on stdout and logs
//! to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use ballot_client::{
    BallotTerminalApi, SessionDeps, SubmissionState, SubmitOutcome, TerminalConfig,
    TerminalSession, VotingToken,
};
use terminal_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use vote_terminal::{Command, ConsoleView, HELP};

/// Vote-Terminal: offline-resilient voting terminal
#[derive(Parser, Debug)]
#[command(name = "vote-terminal")]
#[command(about = "Single-shot ballot terminal with offline retry and network watchdog")]
struct Args {
    /// Server origin (overrides BT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Voting token for this terminal
    #[arg(long, env = "BT_TOKEN")]
    token: String,

    /// Directory holding the pending-vote file (overrides BT_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Watchdog probe interval in milliseconds
    #[arg(long)]
    probe_interval_ms: Option<u64>,

    /// Terminal identifier used in log lines
    #[arg(long)]
    terminal_id: Option<String>,

    /// Log filter (overrides BT_LOG_LEVEL / RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

type Console = ConsoleView<std::io::Stdout>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &args.log_level {
        telemetry.log_level = level.clone();
    }
    if args.json_logs {
        telemetry.json_logs = true;
    }
    if let Some(id) = &args.terminal_id {
        telemetry = telemetry.with_terminal_id(id.clone());
    }
    let _telemetry = init_telemetry(telemetry).context("failed to initialise telemetry")?;

    let mut config = TerminalConfig::from_env().context("invalid BT_* configuration")?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(interval) = args.probe_interval_ms {
        config.probe_interval_ms = interval;
    }
    config.validate().context("invalid terminal configuration")?;

    let token = VotingToken::new(args.token).context("invalid voting token")?;
    let view = Arc::new(Console::stdout());
    let deps = SessionDeps::production(&config, view.clone())
        .with_context(|| format!("failed to open store in {}", config.data_dir.display()))?;
    let session = Arc::new(TerminalSession::new(config, token, deps)?);
    session.start()?;
    view.line("Type 'help' for commands.");

    // Network-bound commands run here so stdin and ctrl-c stay responsive.
    let mut in_flight: JoinSet<()> = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(&session, &view, &mut in_flight, command),
                    Ok(None) => {}
                    Err(message) => view.line(&message),
                }
            }
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = done {
                    tracing::warn!(error = %e, "[bt] command task failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[bt] interrupt received");
                break;
            }
        }
    }

    if !in_flight.is_empty() {
        tracing::warn!(tasks = in_flight.len(), "[bt] exiting with requests still in flight");
    }
    in_flight.abort_all();
    session.shutdown().await;
    Ok(())
}

fn execute(
    session: &Arc<TerminalSession>,
    view: &Arc<Console>,
    in_flight: &mut JoinSet<()>,
    command: Command,
) {
    if command.waits_on_network() {
        in_flight.spawn(run_network_command(
            Arc::clone(session),
            Arc::clone(view),
            command,
        ));
        return;
    }
    match command {
        Command::Online => session.notify_online(),
        Command::Offline => session.notify_offline(),
        Command::Status => view.line(&status_text(session)),
        Command::Metrics => match encode_metrics() {
            Ok(text) => view.line(text.trim_end()),
            Err(e) => view.line(&format!("metrics unavailable: {}", e)),
        },
        Command::Help => view.line(HELP),
        Command::Vote(_) | Command::Retry | Command::Probe | Command::Quit => {}
    }
}

async fn run_network_command(session: Arc<TerminalSession>, view: Arc<Console>, command: Command) {
    match command {
        Command::Vote(choice) => report_outcome(&view, session.vote(choice).await),
        Command::Retry => report_outcome(&view, session.retry().await),
        Command::Probe => {
            let health = session.probe_now().await;
            view.line(&format!("probe: {}", health));
        }
        _ => {}
    }
}

fn report_outcome(view: &Console, outcome: Result<SubmitOutcome, ballot_client::BallotError>) {
    match outcome {
        // The screen already shows the result.
        Ok(SubmitOutcome::Confirmed { .. }) | Ok(SubmitOutcome::Pending { .. }) => {}
        Ok(SubmitOutcome::Discarded) => view.line("(stale result ignored)"),
        Err(e) => view.line(&format!("! {}", e)),
    }
}

fn status_text(session: &TerminalSession) -> String {
    let state = match session.state() {
        SubmissionState::Idle => "idle".to_string(),
        SubmissionState::Submitting { choice, attempt } => {
            format!("submitting {} (attempt {})", choice, attempt)
        }
        SubmissionState::FailedPending { choice, failure } => {
            format!("failed-pending {} ({})", choice, failure)
        }
        SubmissionState::Confirmed { choice } => format!("confirmed {}", choice),
    };
    let pending = match session.pending() {
        Some(record) => format!("{} at {}", record.choice, record.captured_at.as_millis()),
        None => "none".to_string(),
    };
    let health = session.health();
    let stats = session.reporter_stats();
    let bus = session.bus();
    let signals = bus.stats();

    format!(
        "token:     {}\nstate:     {}\npending:   {}\nnetwork:   {} ({} consecutive failures)\nincidents: {} sent, {} suppressed\nsignals:   {} online, {} offline, {} transitions, {} listeners",
        session.token_fingerprint(),
        state,
        pending,
        health.state,
        health.consecutive_failures,
        stats.dispatched,
        stats.suppressed,
        signals.online,
        signals.offline,
        signals.health_changes,
        bus.subscriber_count()
    )
}
