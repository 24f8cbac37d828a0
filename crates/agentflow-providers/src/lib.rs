//! Chat-model adapter trait, plus a reference OpenAI-compatible binding.

pub mod openai_compat;
pub mod traits;

pub use openai_compat::{OpenAiCompatProvider, RetryPolicy};
pub use traits::{ChatModel, Settings, ToolChoice};
