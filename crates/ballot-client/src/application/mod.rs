//! # Application Layer
//!
//! Services orchestrating one terminal session: durable pending-vote
//! storage, incident reporting, the network watchdog and the submission
//! state machine, wired together by `TerminalSession`.

pub mod pending_store;
pub mod reporter;
pub mod session;
pub mod submission;
pub mod watchdog;

pub use pending_store::PendingVoteStore;
pub use reporter::{IncidentReporter, ReporterStats};
pub use session::{SessionDeps, TerminalSession};
pub use submission::SubmissionMachine;
pub use watchdog::NetworkWatchdog;
