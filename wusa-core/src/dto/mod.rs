//! Data Transfer Objects for the GitHub API
//!
//! These mirror the JSON bodies of the endpoints wusa talks to. They are
//! converted into domain types before they reach the lifecycle engine.

pub mod auth;
pub mod runner;
