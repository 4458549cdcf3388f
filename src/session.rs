//! Bearer token persistence

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifetime of a stored login
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(token: String, email: Option<String>) -> Self {
        Self {
            token,
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
            email,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session, `None` when absent, expired or unreadable
    pub fn load(&self) -> Option<Session> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read session file {:?}: {}", self.path, e);
                return None;
            }
        };

        let session: Session = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring malformed session file {:?}: {}", self.path, e);
                return None;
            }
        };

        if session.is_expired(Utc::now()) {
            debug!("Stored session expired at {}", session.expires_at);
            return None;
        }

        Some(session)
    }

    pub fn token(&self) -> Option<String> {
        self.load().map(|session| session.token)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        write_private(&self.path, content.as_bytes())
            .map_err(|e| Error::Session(format!("Failed to write {:?}: {}", self.path, e)))?;
        info!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Remove the stored session; a missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed session file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write a file readable only by its owner. A new file is created with mode
/// 0600; an existing one is narrowed to 0600 before it is truncated.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    if path.exists() {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, content)
}
