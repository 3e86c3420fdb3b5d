//! Session persistence: one JSON file per session, or an in-memory map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::session::{Session, SessionStatus};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError>;
    async fn load_by_issue(&self, issue_id: &str) -> Result<Option<Session>, StoreError>;
    async fn list(&self) -> Result<Vec<Session>, StoreError>;
    async fn list_active(&self) -> Result<Vec<Session>, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    async fn update_status(&self, id: &str, status: SessionStatus) -> Result<Session, StoreError>;
    async fn cleanup_old_sessions(&self, max_age_days: i64) -> Result<usize, StoreError>;
}

fn most_recently_active<'a>(sessions: impl Iterator<Item = &'a Session>, issue_id: &str) -> Option<Session> {
    sessions
        .filter(|s| s.issue_id == issue_id)
        .max_by(|a, b| {
            // Prefer an active session over a terminal one; among equals,
            // the most recently started wins.
            a.is_active()
                .cmp(&b.is_active())
                .then(a.started_at.cmp(&b.started_at))
        })
        .cloned()
}

/// File-backed store: one `<id>.json` per session under `dir`.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<Session>, StoreError> {
        self.ensure_dir().await?;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut sessions = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Session>(&contents) {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session file"),
            }
        }

        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(self.path_for(&session.id), json).await?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn load_by_issue(&self, issue_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.read_all().await?;
        Ok(most_recently_active(sessions.iter(), issue_id))
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        self.read_all().await
    }

    async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.read_all().await?.into_iter().filter(|s| s.is_active()).collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn update_status(&self, id: &str, status: SessionStatus) -> Result<Session, StoreError> {
        let mut session = self.load(id).await?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        session.status = status;
        session.last_activity_at = Utc::now();
        if status.is_terminal() {
            session.completed_at = Some(Utc::now());
        }
        self.save(&session).await?;
        Ok(session)
    }

    async fn cleanup_old_sessions(&self, max_age_days: i64) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
        let sessions = self.read_all().await?;
        let mut deleted = 0;

        for session in sessions {
            if !session.status.is_terminal() {
                continue;
            }
            let reference = session.completed_at.unwrap_or(session.last_activity_at);
            if reference < cutoff {
                self.delete(&session.id).await?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

/// In-memory store for tests and ephemeral/non-durable operation.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions.write().await.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn load_by_issue(&self, issue_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(most_recently_active(sessions.values(), issue_id))
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }

    async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions.read().await.values().filter(|s| s.is_active()).cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn update_status(&self, id: &str, status: SessionStatus) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        session.status = status;
        session.last_activity_at = Utc::now();
        if status.is_terminal() {
            session.completed_at = Some(Utc::now());
        }
        Ok(session.clone())
    }

    async fn cleanup_old_sessions(&self, max_age_days: i64) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
        let mut sessions = self.sessions.write().await;
        let to_delete: Vec<String> = sessions
            .values()
            .filter(|s| s.status.is_terminal())
            .filter(|s| s.completed_at.unwrap_or(s.last_activity_at) < cutoff)
            .map(|s| s.id.clone())
            .collect();

        for id in &to_delete {
            sessions.remove(id);
        }

        Ok(to_delete.len())
    }
}

fn path_exists(path: &Path) -> bool {
    path.exists()
}
