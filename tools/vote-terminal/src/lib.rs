//! Vote-Terminal: line-driven runtime for an unattended voting terminal.
//!
//! Wraps a `TerminalSession` with the reqwest transport and a file-backed
//! pending-vote store, renders every state change on stdout and reads voter
//! and operator commands from stdin.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ● réseau: healthy                           │
//! │  [ Pour ]  [ Contre ]  [ Abstention ]        │
//! │  » Choisissez votre vote                     │
//! └──────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod console;

pub use commands::{Command, HELP};
pub use console::ConsoleView;
