//! Provider-neutral types for talking to a language model.
//!
//! Everything the agent loop knows about a model goes through the traits
//! and types in this crate: a request is a list of role-tagged messages
//! plus the tools the model may call, and a response is a stream of
//! events (text deltas, tool calls, completion).
//!
//! Types in this crate don't define any behavior. Concrete providers
//! (for example the Ollama HTTP provider) live in their own crates and
//! implement [`ModelProvider`] and [`ModelResponse`].

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
