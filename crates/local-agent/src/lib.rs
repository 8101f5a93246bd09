//! An out-of-the-box agent that runs against a local Ollama server.
//!
//! The crate assembles the built-in tools into a [`Session`] and carries the
//! pieces shared by the demo programs: the prompt suite, the worked
//! scenarios and a few terminal helpers. The programs themselves live in
//! `src/bin` and require the `cli` feature.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod console;
#[cfg(feature = "cli")]
pub mod demo;
pub mod scenarios;
mod session;
pub mod suite;
pub mod tools;

pub use session::{SYSTEM_PROMPT, Session, SessionBuilder, TOOL_INDICATORS};

/// Re-exports of [`local_agent_core`] crate.
pub mod core {
    pub use local_agent_core::*;
}
