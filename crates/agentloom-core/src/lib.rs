//! Agentloom Core - shared message/data model and token estimation.
//!
//! This crate provides:
//! - The message record and content-block types stored by the history store
//! - Pin records (persistent text blocks that bypass compaction)
//! - File edit and tool execution event records
//! - The token meter used to estimate prompt size before every LLM call

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod message;
pub mod pin;
pub mod tool_event;
pub mod token_meter;

pub use error::{CoreError, CoreResult};
pub use message::{ContentBlock, Kind, MessageRecord, Role};
pub use pin::Pin;
pub use token_meter::{TokenMeasurement, TokenMeter};
pub use tool_event::ToolExecutionEvent;
