//! The agent loop for seomagic.
//!
//! One user message runs as a bounded cycle:
//!
//! 1. **Append** the user turn to the conversation store
//! 2. **Call the model** with the aligned history window and the tool catalog
//! 3. **If tools are requested**: run them concurrently, append one combined
//!    tool-result turn, and call the model again
//! 4. **Otherwise**: store and return the final answer
//!
//! The cycle stops with an error after `max_iterations` model calls.

pub mod loop_runner;
pub mod window;

pub use loop_runner::{AgentLoop, ChatOutcome, ToolCallRecord};
pub use window::model_window;
