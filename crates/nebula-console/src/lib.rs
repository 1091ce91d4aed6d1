//! Interactive console for Nebula Graph.
//!
//! The binary in `main.rs` wires these pieces together; they are exposed as a
//! library so the session loop can be driven from tests with scripted input
//! and a fake executor.

pub mod completion;
pub mod input;
pub mod render;
pub mod repl;

pub use input::{InputSource, InteractiveInput, ReadEvent, ScriptInput};
pub use repl::{PromptConfig, PromptStyle, SessionLoop, SessionState, CONSOLE_LABEL};
