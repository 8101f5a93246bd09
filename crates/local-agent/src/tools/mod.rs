//! The built-in tools that models can use.

mod calculate;
mod docker;
mod docs;
mod memory;
mod time;

pub use calculate::{CalculateTool, Number, evaluate};
pub use docker::DockerStatusTool;
pub use docs::{DOCUMENTATION, SearchDocumentationTool, search};
pub use memory::{MemoryStore, WriteMemoryTool};
pub use time::{CurrentTimeTool, TIME_FORMAT};
