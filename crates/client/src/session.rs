//! On-disk session artifact.
//!
//! A successful login yields a long-lived token. Storing it lets the next
//! process start skip the password and MFA exchange entirely.

use crate::error::MonarchResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Reads and writes the cached session token inside a cache directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the cached token, if any.
    pub fn load(&self) -> MonarchResult<Option<String>> {
        if !self.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let session: SessionFile = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), "Loaded session token");
        Ok(Some(session.token))
    }

    /// Persist a token, replacing any previous one.
    pub fn save(&self, token: &str) -> MonarchResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string(&SessionFile {
            token: token.to_string(),
        })?;
        write_private(&self.path, body.as_bytes())?;

        debug!(path = %self.path.display(), "Saved session token");
        Ok(())
    }

    /// Remove the cached token. Missing files are not an error.
    pub fn clear(&self) -> MonarchResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `contents` so the file is never readable by other users.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by an older write.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}
