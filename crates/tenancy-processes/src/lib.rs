//! Workflow engine for long-running tenancy processes.
//!
//! A process (sole-to-joint transfer, change of name) is a finite state machine whose
//! transitions may be gated by business rules evaluated against collaborator systems. The
//! engine computes transitions as pure values; persistence goes through an optimistic
//! concurrency gate so that concurrent writers never silently overwrite each other.

pub mod config;
pub mod error;
pub mod processes;
pub mod telemetry;
