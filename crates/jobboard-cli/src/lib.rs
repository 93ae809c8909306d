//! jobboard CLI - serves the API and runs maintenance tasks.

pub mod config;

pub use config::{Command, Config};
