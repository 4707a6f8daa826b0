//! LLM provider abstraction and backend implementations.

pub mod any;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{EmbedFn, EmbedFuture, LlmProvider, Message, Role};
