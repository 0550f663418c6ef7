//! Client-side storage of the session token.
//!
//! Uses the OS keyring when it is available and falls back to a file only
//! readable by the current user.

use crate::error::{CrmError, Result};
use keyring::Entry;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SERVICE_NAME: &str = "crm-insight";
const SESSION_KEY: &str = "session";

/// File name of the fallback token file inside the config directory.
pub const SESSION_FILE: &str = "session";

/// Where the token is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenBackend {
    Keyring,
    File,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: TokenBackend,
    file_path: PathBuf,
}

impl TokenStore {
    /// Probes the keyring; the fallback file lives in `config_dir`.
    pub fn new(config_dir: &Path) -> Self {
        let backend = if Self::probe_keyring() {
            TokenBackend::Keyring
        } else {
            warn!("OS keyring unavailable, storing the session token in a file");
            TokenBackend::File
        };
        Self {
            backend,
            file_path: config_dir.join(SESSION_FILE),
        }
    }

    /// A store that never touches the keyring.
    pub fn file_only(file_path: PathBuf) -> Self {
        Self {
            backend: TokenBackend::File,
            file_path,
        }
    }

    fn probe_keyring() -> bool {
        let test_entry = match Entry::new(SERVICE_NAME, "__probe__") {
            Ok(e) => e,
            Err(_) => return false,
        };

        match test_entry.set_password("test") {
            Ok(()) => {
                let _ = test_entry.delete_credential();
                true
            }
            Err(_) => false,
        }
    }

    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, SESSION_KEY)
            .map_err(|e| CrmError::persistence(format!("Failed to access keyring: {e}")))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        debug!(token = %mask_token(token), backend = ?self.backend, "Saving session token");
        match self.backend {
            TokenBackend::Keyring => Self::entry()?
                .set_password(token)
                .map_err(|e| CrmError::persistence(format!("Failed to store session: {e}"))),
            TokenBackend::File => self.write_file(token),
        }
    }

    pub fn load(&self) -> Result<Option<String>> {
        match self.backend {
            TokenBackend::Keyring => match Self::entry()?.get_password() {
                Ok(token) => Ok(Some(token)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(CrmError::persistence(format!(
                    "Failed to retrieve session: {e}"
                ))),
            },
            TokenBackend::File => match fs::read_to_string(&self.file_path) {
                Ok(content) => {
                    let token = content.trim();
                    Ok((!token.is_empty()).then(|| token.to_string()))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CrmError::persistence(format!(
                    "Failed to read session file {}: {e}",
                    self.file_path.display()
                ))),
            },
        }
    }

    /// Removes the token. Missing tokens are not an error.
    pub fn clear(&self) -> Result<()> {
        match self.backend {
            TokenBackend::Keyring => match Self::entry()?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => {
                    warn!("Failed to delete session from keyring: {e}");
                    Ok(())
                }
            },
            TokenBackend::File => match fs::remove_file(&self.file_path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CrmError::persistence(format!(
                    "Failed to remove session file: {e}"
                ))),
            },
        }
    }

    fn write_file(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CrmError::persistence(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.file_path)
            .map_err(|e| CrmError::persistence(format!("Failed to write session file: {e}")))?;
        file.write_all(token.as_bytes())
            .map_err(|e| CrmError::persistence(format!("Failed to write session file: {e}")))
    }
}

/// Shows only the last 4 characters of a token.
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= 4 {
        "*".repeat(len)
    } else {
        let tail: String = token.chars().skip(len - 4).collect();
        format!("****...{tail}")
    }
}
