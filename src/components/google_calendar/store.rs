use super::token::Credential;
use crate::error::{auth_error, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed storage for the calendar credential
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted credential, `None` when nothing was stored yet
    pub fn load(&self) -> AppResult<Option<Credential>> {
        if !self.path.exists() {
            debug!("No credential stored at {}", self.path.display());
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            auth_error(&format!(
                "Failed to read credential from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let credential: Credential = serde_json::from_str(&json).map_err(|e| {
            auth_error(&format!(
                "Failed to parse credential from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(credential))
    }

    /// Overwrite the stored credential
    pub fn save(&self, credential: &Credential) -> AppResult<()> {
        let json = serde_json::to_string_pretty(credential)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, json)?;

        // The file holds OAuth tokens, keep it owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!("Credential saved to {}", self.path.display());
        Ok(())
    }
}
