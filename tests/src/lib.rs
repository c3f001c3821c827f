//! # Ballot Terminal Test Suite
//!
//! Cross-crate scenarios driving a full `TerminalSession` through the
//! connectivity bus with scripted transports.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mod.rs        # TerminalRig fixture and wait helpers
//!     ├── scenarios.rs  # Vote delivery, restart and retry flows
//!     └── watchdog.rs   # Outage detection and incident rate limiting
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bt-tests
//! cargo test -p bt-tests integration::watchdog::
//! ```

pub mod integration;
