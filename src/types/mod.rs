// Public modules
pub mod chat_chunk;
pub mod chat_request;
pub mod generate;
pub mod message;
pub mod model_list_response;
pub mod version_response;

// Re-exports
pub use chat_chunk::{ChatChunk, ChunkMessage};
pub use chat_request::ChatRequest;
pub use generate::{GenerateChunk, GenerateRequest};
pub use message::{Message, MessageRole};
pub use model_list_response::{ModelInfo, ModelListResponse};
pub use version_response::VersionResponse;
