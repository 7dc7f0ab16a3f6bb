//! Answer generation
//!
//! Components:
//! - Prompt: query + fragments -> prompt text
//! - Generator: retrieval, prompt and model wired together

pub mod generator;
pub mod prompt;

pub use generator::{build_prompt, ResponseGenerator};
pub use prompt::{format_prompt, ANSWER_MARKER};
