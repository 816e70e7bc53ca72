use crate::session::ChatSession;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Metadata for a chat session (used for listing)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMetadata {
    pub id: String,
    pub name: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub message_count: usize,
    #[serde(default)]
    pub card_count: usize,
}

impl ChatMetadata {
    fn for_session(session: &ChatSession) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            message_count: session.messages.len(),
            card_count: session.card_count(),
        }
    }
}

#[derive(Clone)]
pub struct FileSessionPersistence {
    root_dir: PathBuf,
}

impl FileSessionPersistence {
    pub fn new() -> Self {
        let root_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agri-assistant");
        info!("Storing sessions in: {:?}", root_dir);
        Self { root_dir }
    }

    pub fn with_root(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    fn ensure_chats_dir(&self) -> Result<PathBuf> {
        let chats_dir = self.root_dir.join("sessions");
        if !chats_dir.exists() {
            std::fs::create_dir_all(&chats_dir).with_context(|| {
                format!("Failed to create sessions directory {}", chats_dir.display())
            })?;
        }
        Ok(chats_dir)
    }

    fn chat_file_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        let chats_dir = self.ensure_chats_dir()?;
        Ok(chats_dir.join(format!("{session_id}.json")))
    }

    fn metadata_file_path(&self) -> Result<PathBuf> {
        let chats_dir = self.ensure_chats_dir()?;
        Ok(chats_dir.join("metadata.json"))
    }

    fn read_metadata(&self) -> Result<Vec<ChatMetadata>> {
        let metadata_path = self.metadata_file_path()?;
        if !metadata_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&metadata_path)?;
        match serde_json::from_str::<Vec<ChatMetadata>>(&content) {
            Ok(list) => Ok(list),
            Err(e) => {
                warn!(
                    "Failed to deserialize chat metadata, will rebuild from sessions: {}",
                    e
                );
                self.rebuild_metadata_from_sessions()
            }
        }
    }

    fn write_metadata(&self, metadata_list: &[ChatMetadata]) -> Result<()> {
        let metadata_json = serde_json::to_string_pretty(metadata_list)?;
        std::fs::write(self.metadata_file_path()?, metadata_json)?;
        Ok(())
    }

    pub fn save_chat_session(&mut self, session: &ChatSession) -> Result<()> {
        let session_path = self.chat_file_path(&session.id)?;
        debug!("Saving chat session to {}", session_path.display());
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&session_path, json)
            .with_context(|| format!("Failed to write {}", session_path.display()))?;

        let mut metadata_list = self.read_metadata()?;
        let new_metadata = ChatMetadata::for_session(session);
        if let Some(existing) = metadata_list.iter_mut().find(|m| m.id == session.id) {
            *existing = new_metadata;
        } else {
            metadata_list.push(new_metadata);
        }
        self.write_metadata(&metadata_list)
    }

    pub fn load_chat_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let session_path = self.chat_file_path(session_id)?;
        if !session_path.exists() {
            return Ok(None);
        }

        debug!("Loading chat session from {}", session_path.display());
        let json = std::fs::read_to_string(&session_path)?;
        let session = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", session_path.display()))?;
        Ok(Some(session))
    }

    /// All sessions, newest first
    pub fn list_chat_sessions(&self) -> Result<Vec<ChatMetadata>> {
        let mut metadata_list = self.read_metadata()?;
        metadata_list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(metadata_list)
    }

    pub fn delete_chat_session(&mut self, session_id: &str) -> Result<()> {
        let session_path = self.chat_file_path(session_id)?;
        if session_path.exists() {
            debug!("Deleting chat session file {}", session_path.display());
            std::fs::remove_file(session_path)?;
        }

        let mut metadata_list = self.read_metadata()?;
        metadata_list.retain(|m| m.id != session_id);
        self.write_metadata(&metadata_list)
    }

    fn rebuild_metadata_from_sessions(&self) -> Result<Vec<ChatMetadata>> {
        let chats_dir = self.ensure_chats_dir()?;
        let mut metadata_list = Vec::new();

        for entry in std::fs::read_dir(&chats_dir)? {
            let path = entry?.path();
            let Some(session_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json")
                || session_id == "metadata"
            {
                continue;
            }

            match self.load_chat_session(session_id) {
                Ok(Some(session)) => metadata_list.push(ChatMetadata::for_session(&session)),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable session {}: {}", path.display(), e),
            }
        }

        self.write_metadata(&metadata_list)?;
        Ok(metadata_list)
    }
}

impl Default for FileSessionPersistence {
    fn default() -> Self {
        Self::new()
    }
}

/// Session ids become file names, so only `[A-Za-z0-9_-]` is allowed
fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        anyhow::bail!("Invalid session id: {session_id:?}");
    }
    Ok(())
}

pub fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let random_part: u16 = rand::random();

    format!("chat_{timestamp:x}_{random_part:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::Extractor;
    use std::sync::Arc;
    use std::time::Duration;

    fn session_with_reply(id: &str) -> ChatSession {
        let mut session = ChatSession::new_empty(id.to_string(), format!("Chat {id}"));
        session.add_user_message("Thời tiết Đà Lạt?", vec![]);
        session.begin_assistant_turn(Arc::new(Extractor::default()));
        session.apply_delta("Dạ @@<STATUS>{\"status\":\"ok\"}</STATUS>");
        session.complete_turn();
        session
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut persistence = FileSessionPersistence::with_root(temp_dir.path().to_path_buf());

        let session = session_with_reply("chat_a");
        persistence.save_chat_session(&session)?;

        let loaded = persistence.load_chat_session("chat_a")?.unwrap();
        assert_eq!(loaded.messages, session.messages);
        assert_eq!(loaded.name, "Chat chat_a");

        assert!(persistence.load_chat_session("missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_list_is_newest_first_and_updates_in_place() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut persistence = FileSessionPersistence::with_root(temp_dir.path().to_path_buf());

        let mut older = session_with_reply("chat_old");
        older.updated_at -= Duration::from_secs(60);
        persistence.save_chat_session(&older)?;
        let newer = session_with_reply("chat_new");
        persistence.save_chat_session(&newer)?;

        // Saving again replaces the entry instead of adding one
        persistence.save_chat_session(&older)?;

        let list = persistence.list_chat_sessions()?;
        let ids: Vec<_> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["chat_new", "chat_old"]);
        assert_eq!(list[0].message_count, 2);
        assert_eq!(list[0].card_count, 1);
        Ok(())
    }

    #[test]
    fn test_delete_session() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut persistence = FileSessionPersistence::with_root(temp_dir.path().to_path_buf());

        persistence.save_chat_session(&session_with_reply("chat_a"))?;
        persistence.save_chat_session(&session_with_reply("chat_b"))?;
        persistence.delete_chat_session("chat_a")?;

        assert!(persistence.load_chat_session("chat_a")?.is_none());
        let list = persistence.list_chat_sessions()?;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "chat_b");
        Ok(())
    }

    #[test]
    fn test_corrupt_metadata_is_rebuilt() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut persistence = FileSessionPersistence::with_root(temp_dir.path().to_path_buf());

        persistence.save_chat_session(&session_with_reply("chat_a"))?;
        std::fs::write(persistence.metadata_file_path()?, "not json")?;

        let list = persistence.list_chat_sessions()?;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "chat_a");
        Ok(())
    }

    #[test]
    fn test_generated_ids_have_prefix() {
        let id = generate_session_id();
        assert!(id.starts_with("chat_"));
        assert!(validate_session_id(&id).is_ok());
    }

    #[test]
    fn test_ids_cannot_escape_the_store() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let victim = temp_dir.path().join("victim.json");
        std::fs::write(&victim, "{}")?;
        let mut persistence = FileSessionPersistence::with_root(temp_dir.path().join("store"));

        for id in ["../../victim", "../victim", "a/b", "a\\b", "..", ""] {
            assert!(persistence.delete_chat_session(id).is_err(), "{id:?} accepted");
            assert!(persistence.load_chat_session(id).is_err(), "{id:?} accepted");
        }
        assert!(victim.exists());
        Ok(())
    }
}
