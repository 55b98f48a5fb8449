// Public modules
pub mod chat;
pub mod chat_delta;
pub mod chat_request;
pub mod chat_response;
pub mod compare_request;
pub mod models_response;
pub mod stream_record;
pub mod token;
pub mod user;

// Re-exports
pub use chat::{Chat, ChatMessage, TokenUsage};
pub use chat_delta::{ChatDelta, DeltaContent, DeltaMessage};
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use compare_request::CompareRequest;
pub use models_response::ModelsResponse;
pub use stream_record::{RecordMessage, StreamRecord};
pub use token::Token;
pub use user::{NewUser, User};
