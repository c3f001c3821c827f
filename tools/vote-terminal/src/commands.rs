//! Terminal command parsing.

use ballot_client::VoteChoice;

/// Usage text printed by `help`.
pub const HELP: &str = "\
Commands:
  for | against | abstain   cast a vote (also: pour, contre, abstention)
  retry                     resend the pending vote
  online | offline          simulate platform connectivity signals
  probe                     run a liveness probe now
  status                    show submission and network state
  metrics                   print Prometheus metrics
  help                      show this text
  quit                      stop the terminal";

/// One line of input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// A vote button.
    Vote(VoteChoice),
    /// The retry affordance.
    Retry,
    /// Platform `online` signal.
    Online,
    /// Platform `offline` signal.
    Offline,
    /// Out-of-cycle probe.
    Probe,
    /// Print state.
    Status,
    /// Print metrics.
    Metrics,
    /// Print usage.
    Help,
    /// Exit.
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let word = line.trim().to_lowercase();
        let command = match word.as_str() {
            "" => return Ok(None),
            "retry" | "réessayer" | "r" => Self::Retry,
            "online" => Self::Online,
            "offline" => Self::Offline,
            "probe" => Self::Probe,
            "status" | "s" => Self::Status,
            "metrics" => Self::Metrics,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => match other.parse::<VoteChoice>() {
                Ok(choice) => Self::Vote(choice),
                Err(_) => return Err(format!("unknown command '{}', type 'help'", other)),
            },
        };
        Ok(Some(command))
    }

    /// Whether the command waits on the server and must not hold up input.
    pub fn waits_on_network(&self) -> bool {
        matches!(self, Self::Vote(_) | Self::Retry | Self::Probe)
    }
}
