//! Structured logging for the control plane.
//!
//! Security-relevant *events* go to the audit sink; everything else
//! (navigation warnings, audit-write failures, session timeouts) goes
//! through the logger here.

pub mod logger;

pub use logger::{Logger, Severity};
