//! Agentloom Test - Shared test fixtures for the Agentloom runtime.
//!
//! This crate provides a scripted [`Oracle`](agentloom_runtime::Oracle)
//! implementation and content-block builders usable across crates as a
//! dev-dependency. Add it to `[dev-dependencies]` and build a
//! [`TurnScheduler`](agentloom_runtime::TurnScheduler) against
//! `FakeOracle` instead of a real LLM backend.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod oracle;

pub use fixtures::*;
pub use oracle::FakeOracle;
