// Public modules
pub mod chat;
pub mod cli;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod forward;
pub mod observability;
pub mod render;
pub mod types;

// Re-exports
pub use client::Ollama;
pub use client_logger::{ClientLogger, JsonLinesLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
