//! CourtWatch library - court availability watcher
//!
//! This module exports internal components for integration testing.

pub mod availability;
pub mod booking;
pub mod cli;
pub mod config;
pub mod notify;
pub mod orchestrator;
pub mod policy;
pub mod publish;
pub mod redact;
pub mod scheduler;
pub mod slots;
pub mod state;
