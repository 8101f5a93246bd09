//! Core logic: the bounded tool-augmented agent loop, tool dispatch, and
//! the ReAct and specialist runners built on a type-erased model client.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
mod react;
mod specialist;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentEvent, AgentOutcome, BUDGET_EXHAUSTED_MESSAGE,
    DEFAULT_MAX_ITERATIONS, Termination,
};
pub use model_client::{ModelClient, ModelClientResponse};
pub use react::ReActRunner;
pub use specialist::{GENERIC_ASSISTANT_PROMPT, SpecialistTeam};
