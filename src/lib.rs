// Public modules
pub mod client;
pub mod client_logger;
pub mod config;
pub mod error;
pub mod history;
pub mod ndjson;
pub mod observability;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports
pub use client::Ragline;
pub use client_logger::ClientLogger;
pub use config::{ChatArgs, ClientConfig};
pub use error::{Error, Result};
pub use history::ChatHistory;
pub use session::Session;
pub use types::*;
