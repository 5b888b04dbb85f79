//! Agentloom Context - the session facade (C6) and prompt packer (C7).
//!
//! `ContextSession` owns the token meter, history store, pin manager and
//! compaction engine, and is the only thing the turn scheduler talks to
//! when it needs to append a message or pack a prompt.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod packer;
pub mod session;
pub mod settings;

pub use error::{ContextError, ContextResult};
pub use packer::{PackedPrompt, PromptPacker};
pub use session::{ContextSession, SessionStatus};
pub use settings::ContextSettings;
