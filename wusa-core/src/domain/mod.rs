//! Core domain types
//!
//! The runner record is shared between the registry (for persistence), the
//! lifecycle engine (for container naming) and the CLI (for display).

pub mod runner;
