//! Credential storage module
//!
//! This module keeps the TMDB API key in a single-line text file, by default
//! next to the running executable. A missing or unreadable key file simply
//! means no key is stored; the user is then asked for one.

use crate::atomic_file::write_atomically;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// File name of the key file
pub const KEY_FILE_NAME: &str = "api_key.txt";

/// Errors that can occur during credential storage operations
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Neither the executable's directory nor a config directory is known
    #[error("Failed to determine a location for the API key file")]
    LocationNotFound,

    /// Failed to create the directory holding the key file
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the key file
    #[error("Failed to write API key file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An API key.
///
/// Immutable once created and cheap to clone, so it can be shared by every
/// in-flight fetch. The `Debug` output never shows the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Creates a credential from raw input, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing but whitespace is left.
    pub fn new(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(Arc::from(key)))
        }
    }

    /// The key itself, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of a credential when none is stored yet
pub trait CredentialPrompt {
    /// Asks for a key. `None` means the user gave none.
    fn ask(&self) -> Option<String>;
}

/// Asks for the key on the terminal
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn ask(&self) -> Option<String> {
        dialoguer::Input::<String>::new()
            .with_prompt("Please enter your TMDB API key")
            .interact_text()
            .map_err(|e| warn!("Could not read API key from terminal: {e}"))
            .ok()
    }
}

/// File-backed storage for a single API key
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Opens the store at its default location
    ///
    /// The key file lives next to the running executable. If the executable's
    /// location cannot be determined, the per-user config directory is used.
    pub fn open_default() -> Result<Self, CredentialError> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        let dir = match exe_dir {
            Some(dir) => dir,
            None => directories::ProjectDirs::from("org", "episode-lister", "episode_lister")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or(CredentialError::LocationNotFound)?,
        };

        Ok(Self::at(dir.join(KEY_FILE_NAME)))
    }

    /// Opens the store backed by the given file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the key file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored key from the first line of the key file
    ///
    /// A missing, unreadable or blank file yields `None`.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            info!("API key file not found: {}", self.path.display());
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error reading API key file {}: {e}", self.path.display());
                return None;
            }
        };

        let credential = content.lines().next().and_then(Credential::new);
        if credential.is_some() {
            info!("API key loaded from {}", self.path.display());
        } else {
            warn!("API key file {} is empty", self.path.display());
        }
        credential
    }

    /// Stores the key as the sole line of the key file
    pub fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CredentialError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        write_atomically(&self.path, &format!("{}\n", credential.expose())).map_err(|e| {
            CredentialError::WriteFailed {
                path: self.path.clone(),
                source: e,
            }
        })?;

        info!("API key saved to {}", self.path.display());
        Ok(())
    }

    /// Returns the stored key, or asks for one and tries to store it
    ///
    /// A failure to store the new key is logged and otherwise ignored: the
    /// key remains usable for this session.
    pub fn obtain<P: CredentialPrompt + ?Sized>(&self, prompt: &P) -> Option<Credential> {
        if let Some(credential) = self.load() {
            return Some(credential);
        }

        info!("Requesting API key from user");
        let Some(credential) = prompt.ask().as_deref().and_then(Credential::new) else {
            info!("No API key entered");
            return None;
        };

        if let Err(e) = self.save(&credential) {
            warn!("Error saving API key, using it for this session only: {e}");
        }

        Some(credential)
    }
}
