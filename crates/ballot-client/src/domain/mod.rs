//! # Domain Module
//!
//! Core domain types for ballot submission: tokens, choices, pending records,
//! incidents, the submission state and the connectivity health tracker.

pub mod entities;
pub mod errors;
pub mod health;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use health::*;
pub use invariants::*;
pub use value_objects::*;
