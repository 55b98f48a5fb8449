//! Logging trait for ragline client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to
//! capture the traffic passing through a [`Ragline`](crate::Ragline)
//! client: complete responses and individual streamed deltas.

use crate::types::{ChatDelta, ChatResponse};

/// A trait for logging ragline client operations.
///
/// # Example
///
/// ```rust,ignore
/// use std::io::Write;
/// use std::sync::Mutex;
/// use ragline::{ChatDelta, ChatResponse, ClientLogger};
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_response(&self, response: &ChatResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "response: {}", serde_json::to_string(response).unwrap()).unwrap();
///     }
///
///     fn log_delta(&self, delta: &ChatDelta) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "delta: {}", serde_json::to_string(delta).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a complete reply from a non-streaming chat or compare call.
    fn log_response(&self, response: &ChatResponse);

    /// Log one delta yielded by a streaming chat or compare call.
    ///
    /// Called once per yielded [`ChatDelta`], including the final citations
    /// delta. Lines the stream consumer skipped are never logged here.
    fn log_delta(&self, delta: &ChatDelta);
}
