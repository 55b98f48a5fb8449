//! Local chat history persistence.
//!
//! Conversations are stored in a versioned JSON file. The store is a plain
//! in-memory collection; callers decide when to save.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::types::Chat;

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    version: u8,
    chats: Vec<Chat>,
}

/// A collection of stored conversations.
#[derive(Clone, Debug, Default)]
pub struct ChatHistory {
    chats: Vec<Chat>,
}

impl ChatHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a history file, returning an empty history when the file does
    /// not exist yet.
    pub fn open_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(err) => return Err(Error::io("failed to open history file", err)),
        };
        let reader = BufReader::new(file);
        let contents: HistoryFile = from_reader(reader)
            .map_err(|err| Error::serialization("failed to parse history file", Some(Box::new(err))))?;
        Ok(Self {
            chats: contents.chats,
        })
    }

    /// Saves the history to the given path, creating or replacing the file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create history file", err))?;
        let writer = BufWriter::new(file);
        let contents = HistoryFile {
            version: 1,
            chats: self.chats.clone(),
        };
        to_writer_pretty(writer, &contents)
            .map_err(|err| Error::serialization("failed to serialize history", Some(Box::new(err))))
    }

    /// Inserts a chat, replacing any stored chat with the same id.
    pub fn upsert(&mut self, chat: Chat) {
        match self.chats.iter_mut().find(|stored| stored.id == chat.id) {
            Some(stored) => *stored = chat,
            None => self.chats.push(chat),
        }
    }

    /// Returns the chat with the given id.
    pub fn get(&self, id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == id)
    }

    /// Removes the chat with the given id, returning true when one existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.chats.len();
        self.chats.retain(|chat| chat.id != id);
        self.chats.len() != before
    }

    /// Iterates over stored chats in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Chat> {
        self.chats.iter()
    }

    /// Returns the number of stored chats.
    pub fn len(&self) -> usize {
        self.chats.len()
    }

    /// Returns true when no chats are stored.
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ragline-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_is_empty_history() {
        let history = ChatHistory::open_or_default(scratch_path("missing")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn save_and_reload() {
        let path = scratch_path("roundtrip");
        let mut history = ChatHistory::new();
        let mut chat = Chat::new("c-1").with_title("sampled values");
        chat.push(ChatMessage::User {
            content: "what is SV?".to_string(),
        });
        history.upsert(chat);
        history.save_to(&path).unwrap();

        let reloaded = ChatHistory::open_or_default(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        let chat = reloaded.get("c-1").unwrap();
        assert_eq!(chat.title.as_deref(), Some("sampled values"));
        assert_eq!(chat.conversation.len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut history = ChatHistory::new();
        history.upsert(Chat::new("c-1"));
        history.upsert(Chat::new("c-2"));
        history.upsert(Chat::new("c-1").with_title("renamed"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.get("c-1").unwrap().title.as_deref(), Some("renamed"));
    }

    #[test]
    fn remove_by_id() {
        let mut history = ChatHistory::new();
        history.upsert(Chat::new("c-1"));
        assert!(history.remove("c-1"));
        assert!(!history.remove("c-1"));
        assert!(history.is_empty());
    }
}
