use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bookclub_kernel::settings::SessionSettings;

use crate::error::Result;

/// Opaque bearer token issued by the book service on login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Keep tokens out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Persistent home of the single admin token.
///
/// At most one token is held; `save` replaces any previous one.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionToken>>;

    fn save(&self, token: &SessionToken) -> Result<()>;

    /// Remove the token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

/// Token kept in a file on disk, surviving between runs.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(settings.token_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::new(token)))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &SessionToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, token.as_str())?;
        tracing::debug!(path = %self.path.display(), "session token stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "session token removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionToken>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, token: &SessionToken) -> Result<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("admin_token"));

        assert!(store.load().unwrap().is_none());

        store.save(&SessionToken::new("first")).unwrap();
        store.save(&SessionToken::new("second")).unwrap();
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("second")));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn blank_token_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin_token");
        std::fs::write(&path, "  \n").unwrap();

        assert!(FileSessionStore::new(path).load().unwrap().is_none());
    }

    #[test]
    fn memory_store_holds_one_token() {
        let store = MemorySessionStore::new();
        store.save(&SessionToken::new("a")).unwrap();
        store.save(&SessionToken::new("b")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().as_str(), "b");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let token = SessionToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "SessionToken(..)");
        assert_eq!(token.bearer(), "Bearer secret-value");
    }
}
