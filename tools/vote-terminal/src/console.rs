//! Console rendering of the terminal screen.

use ballot_client::{NetworkHealth, Screen, TerminalView, VoteChoice};
use parking_lot::Mutex;
use std::io::Write;

/// `TerminalView` writing plain text to any writer (stdout in production).
pub struct ConsoleView<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleView<std::io::Stdout> {
    /// View on stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleView<W> {
    /// View on `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the view, returning the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Write a free-form line (status, metrics, errors).
    pub fn line(&self, text: &str) {
        let mut out = self.out.lock();
        // A closed stdout only loses display output.
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }
}

/// Button row for a screen.
pub fn buttons(screen: &Screen) -> String {
    VoteChoice::ALL
        .iter()
        .map(|choice| {
            if screen.buttons_enabled {
                format!("[ {} ]", choice.label())
            } else {
                format!("( {} )", choice.label())
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn health_marker(health: NetworkHealth) -> &'static str {
    match health {
        NetworkHealth::Healthy => "●",
        NetworkHealth::Degraded => "◐",
        NetworkHealth::Down => "○",
    }
}

impl<W: Write + Send> TerminalView for ConsoleView<W> {
    fn render(&self, screen: &Screen) {
        let mut text = format!("{}\n» {}", buttons(screen), screen.message);
        if let Some(choice) = screen.retry_choice {
            text.push_str(&format!("\n[ Réessayer : {} ]  (retry)", choice.label()));
        }
        self.line(&text);
    }

    fn render_health(&self, health: NetworkHealth) {
        self.line(&format!("{} réseau: {}", health_marker(health), health));
    }
}
