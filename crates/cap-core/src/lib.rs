//! capcalc core library
//!
//! This library backs the `capcalc` binary:
//! - Exit codes for CLI operations
//! - Label file reading and writing
//! - Structured logging
//! - Report rendering and result tables
//! - The per-file batch driver for state statistics
//!
//! The binary entry point is in `main.rs`.

pub mod batch;
pub mod exit_codes;
pub mod labels;
pub mod logging;
pub mod output;
