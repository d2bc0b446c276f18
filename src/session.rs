//! Durable session state: bearer tokens plus the last-known current user.
//!
//! Lives in `session.json` under the `.taskdeck` directory so a login
//! survives across invocations. Every mutation writes through to disk
//! immediately; `clear` removes the file. The store is owned by `main`
//! and passed explicitly to whatever needs it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Loads the session from `<dir>/session.json`. A missing or
    /// unreadable file yields an empty (logged-out) session.
    pub fn open(dir: &Path) -> SessionStore {
        let path = dir.join("session.json");
        let session = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        SessionStore { path, session }
    }

    pub fn token(&self) -> Option<&str> {
        self.session.access.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    pub fn set_tokens(&mut self, access: String, refresh: String) -> Result<()> {
        self.session.access = Some(access);
        self.session.refresh = Some(refresh);
        self.save()
    }

    pub fn set_user(&mut self, user: User) -> Result<()> {
        self.session.user = Some(user);
        self.save()
    }

    /// Forgets everything. Used on logout and whenever the backend says
    /// the token is no longer valid.
    pub fn clear(&mut self) -> Result<()> {
        self.session = Session::default();
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.session)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user() -> User {
        User {
            id: Some(1),
            username: "kim".to_string(),
            full_name: "Kim R".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_open_without_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path());
        assert!(store.token().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_tokens_and_user_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut store = SessionStore::open(dir.path());
            store
                .set_tokens("acc-1".to_string(), "ref-1".to_string())
                .unwrap();
            store.set_user(user()).unwrap();
        }
        let store = SessionStore::open(dir.path());
        assert_eq!(store.token(), Some("acc-1"));
        assert_eq!(store.user().unwrap().username, "kim");
    }

    #[test]
    fn test_clear_removes_file_and_state() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::open(dir.path());
        store
            .set_tokens("acc".to_string(), "ref".to_string())
            .unwrap();
        store.clear().unwrap();
        assert!(store.token().is_none());
        assert!(!dir.path().join("session.json").exists());

        let reopened = SessionStore::open(dir.path());
        assert!(reopened.token().is_none());
    }

    #[test]
    fn test_corrupt_file_treated_as_logged_out() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("session.json"), "not json").unwrap();
        let store = SessionStore::open(dir.path());
        assert!(store.token().is_none());
    }
}
