//! # Adapters
//!
//! Production implementations of the outbound ports.

#[cfg(feature = "http")]
pub mod http;
pub mod storage;
pub mod time;

#[cfg(feature = "http")]
pub use http::HttpTerminalClient;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
pub use time::SystemTimeSource;
