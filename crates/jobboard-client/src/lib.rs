//! Jobboard Client - HTTP clients for external APIs
//!
//! - [`openai`] - OpenAI-compatible chat completions, used to write
//!   descriptions when an admin leaves them out.

pub mod openai;

pub use openai::OpenAiClient;
