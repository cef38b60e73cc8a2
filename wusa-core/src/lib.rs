//! Wusa Core
//!
//! Core types shared by the wusa crates.
//!
//! This crate contains:
//! - Domain types: the runner record and its status
//! - DTOs: payloads exchanged with the GitHub REST and OAuth endpoints

pub mod domain;
pub mod dto;
