//! Credential loading.
//!
//! The API key lives in a dotenv-style file under the user's home directory:
//!
//! ```text
//! # ~/.config/imagegen/credentials (chmod 600)
//! OPENROUTER_API_KEY=sk-or-...
//! ```
//!
//! Permissions are not checked; the file is only read.

use crate::error::{ImageGenError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

/// Name of the credential assignment, and of the environment variable it is
/// exported as.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Returns `~/.config/imagegen/credentials`.
pub fn default_credential_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".config").join("imagegen").join("credentials"))
        .ok_or_else(|| ImageGenError::Config("could not determine home directory".into()))
}

/// API key loaded from the credential file.
#[derive(Debug, Clone)]
pub struct Credential {
    api_key: SecretString,
    source: PathBuf,
}

impl Credential {
    /// Loads the credential from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(default_credential_path()?)
    }

    /// Loads the credential from `path`.
    ///
    /// Fails with [`ImageGenError::Config`] naming the path when the file is
    /// missing, has no `OPENROUTER_API_KEY` assignment, or assigns an empty
    /// value.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(|e| read_error(path, e))?;

        for item in iter {
            let (key, value) = item.map_err(|e| read_error(path, e))?;
            if key != API_KEY_VAR {
                continue;
            }
            let value = value.trim();
            if value.is_empty() {
                return Err(missing_key(path));
            }
            tracing::debug!(path = %path.display(), "loaded credential");
            return Ok(Self {
                api_key: SecretString::from(value.to_owned()),
                source: path.to_path_buf(),
            });
        }

        Err(missing_key(path))
    }

    /// The API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The file the key was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Sets `OPENROUTER_API_KEY` in the process environment, where
    /// [`ImageClientBuilder::build`](crate::ImageClientBuilder::build) finds it.
    ///
    /// Call before starting any threads (including a multi-threaded async
    /// runtime); changing the environment races with concurrent reads.
    pub fn export(&self) {
        std::env::set_var(API_KEY_VAR, self.api_key.expose_secret());
    }
}

fn missing_key(path: &Path) -> ImageGenError {
    ImageGenError::Config(format!(
        "{API_KEY_VAR} not set; add `{API_KEY_VAR}=<key>` to {}",
        path.display()
    ))
}

// Parse errors carry the offending line, which may hold the key itself.
fn read_error(path: &Path, err: dotenvy::Error) -> ImageGenError {
    match err {
        dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            ImageGenError::Config(format!(
                "credential file not found; create {} containing `{API_KEY_VAR}=<key>`",
                path.display()
            ))
        }
        dotenvy::Error::Io(io) => {
            ImageGenError::Config(format!("failed to read {}: {io}", path.display()))
        }
        dotenvy::Error::LineParse(_, index) => ImageGenError::Config(format!(
            "malformed credential file {} (at offset {index})",
            path.display()
        )),
        _ => ImageGenError::Config(format!("failed to parse {}", path.display())),
    }
}
