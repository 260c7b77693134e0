//! Credential storage for the authenticated session.
//!
//! Tokens live in one of two tiers: a session-scoped file under the OS temp
//! directory (gone once the machine cleans its temp storage) and a durable
//! file under `.cache/` that survives restarts. The tier is chosen by the
//! "remember me" flag at login time; bootstrap checks the session tier first.

use std::fs;
use std::path::PathBuf;
use anyhow::Result;

const DURABLE_TOKEN_FILE: &str = ".cache/token";
const SESSION_TOKEN_FILE: &str = "cadence-session-token";

#[derive(Clone, Debug)]
pub struct TokenStore {
    session_path: PathBuf,
    durable_path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            session_path: std::env::temp_dir().join(SESSION_TOKEN_FILE),
            durable_path: PathBuf::from(DURABLE_TOKEN_FILE),
        }
    }

    /// Construct a store over explicit file paths. Used by tests.
    pub fn with_paths(session_path: PathBuf, durable_path: PathBuf) -> Self {
        Self {
            session_path,
            durable_path,
        }
    }

    /// Load the stored token, checking the session tier before the durable one.
    pub fn load(&self) -> Option<String> {
        for path in [&self.session_path, &self.durable_path] {
            if let Ok(contents) = fs::read_to_string(path) {
                let token = contents.trim();
                if !token.is_empty() {
                    tracing::debug!(path = %path.display(), "Found stored token");
                    return Some(token.to_string());
                }
            }
        }
        None
    }

    /// Persist a token to the tier selected by `remember`.
    pub fn save(&self, token: &str, remember: bool) -> Result<()> {
        let path = if remember {
            if let Some(parent) = self.durable_path.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            &self.durable_path
        } else {
            &self.session_path
        };
        fs::write(path, token)?;
        tracing::debug!(path = %path.display(), remember, "Saved token");
        Ok(())
    }

    /// Rewrite the tier that currently holds a token (session tier taking
    /// precedence), so a refreshed token keeps the persistence the user chose
    /// at login. Falls back to the session tier when neither holds one.
    pub fn update(&self, token: &str) -> Result<()> {
        let remember = !self.session_path.exists() && self.durable_path.exists();
        self.save(token, remember)
    }

    /// Remove the token from both tiers. Never fails; a missing file is fine.
    pub fn clear(&self) {
        for path in [&self.session_path, &self.durable_path] {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to clear token");
                }
            }
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TokenStore {
        TokenStore::with_paths(
            dir.path().join("session-token"),
            dir.path().join("cache").join("token"),
        )
    }

    #[test]
    fn load_returns_none_when_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().is_none());
    }

    #[test]
    fn save_without_remember_uses_session_tier() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("tok-123", false).unwrap();

        assert_eq!(store.load().as_deref(), Some("tok-123"));
        assert!(dir.path().join("session-token").exists());
        assert!(!dir.path().join("cache").join("token").exists());
    }

    #[test]
    fn save_with_remember_uses_durable_tier() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("tok-456", true).unwrap();

        assert_eq!(store.load().as_deref(), Some("tok-456"));
        assert!(dir.path().join("cache").join("token").exists());
    }

    #[test]
    fn session_tier_takes_precedence_on_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("durable", true).unwrap();
        store.save("session", false).unwrap();

        assert_eq!(store.load().as_deref(), Some("session"));
    }

    #[test]
    fn update_keeps_the_durable_tier() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("old", true).unwrap();
        store.update("new").unwrap();

        assert_eq!(store.load().as_deref(), Some("new"));
        assert!(dir.path().join("cache").join("token").exists());
        assert!(!dir.path().join("session-token").exists());
    }

    #[test]
    fn clear_removes_both_tiers() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("a", true).unwrap();
        store.save("b", false).unwrap();
        store.clear();

        assert!(store.load().is_none());
    }
}
