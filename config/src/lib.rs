//! Configuration for Resilience Rituals.
//!
//! The config file lives at `~/.resilience/config.toml`. Every section is
//! optional:
//!
//! ```toml
//! [storage]
//! database = "${HOME}/.resilience/rituals.db"
//!
//! [session]
//! user_id = "did:privy:abc"
//! farcaster_id = "1234"
//!
//! [share]
//! clipboard = true
//! ```
//!
//! String paths support `${VAR}` expansion. The `[session]` table is
//! written by `login` and removed by `logout`; edits go through
//! `toml_edit` so comments and formatting survive.

mod persist;

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_DIR: &str = ".resilience";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "rituals.db";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ResilienceConfig {
    pub storage: Option<StorageConfig>,
    pub session: Option<SessionConfig>,
    pub share: Option<ShareConfig>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Database file. `${VAR}` references are expanded.
    pub database: Option<String>,
}

/// The signed-in identity, as handed over by the identity provider.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    pub farcaster_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShareConfig {
    #[serde(default = "default_true")]
    pub clipboard: bool,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self { clipboard: true }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to edit config at {}: {source}", path.display())]
    Edit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
    #[error("failed to write config at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::Edit { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}

/// Replace every `${VAR}` with the variable's value. Unset variables expand
/// to nothing; an unclosed `${` is kept as written.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end + 1..];
    }
    out.push_str(rest);
    out
}

/// `~/.resilience`, where config, database and logs live by default.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[must_use]
pub fn default_database_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(DATABASE_FILE))
}

impl ResilienceConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from `path`. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// The configured database path with `${VAR}` expanded.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|storage| storage.database.as_deref())
            .map(expand_env_vars)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
    }

    #[must_use]
    pub fn session_user(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.user_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    #[must_use]
    pub fn session_farcaster_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.farcaster_id.as_deref())
    }

    #[must_use]
    pub fn clipboard_enabled(&self) -> bool {
        self.share.as_ref().is_none_or(|share| share.clipboard)
    }
}

/// Record the signed-in user in the `[session]` table of the config at `path`.
pub fn persist_session(
    path: &Path,
    user_id: &str,
    farcaster_id: Option<&str>,
) -> Result<(), ConfigError> {
    edit_document(path, |doc| {
        if !doc.contains_key("session") {
            doc["session"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        doc["session"]["user_id"] = toml_edit::value(user_id);
        match farcaster_id {
            Some(id) => doc["session"]["farcaster_id"] = toml_edit::value(id),
            None => {
                if let Some(session) = doc["session"].as_table_like_mut() {
                    session.remove("farcaster_id");
                }
            }
        }
    })
}

/// Remove the `[session]` table from the config at `path`.
pub fn clear_session(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    edit_document(path, |doc| {
        doc.remove("session");
    })
}

fn edit_document(
    path: &Path,
    edit: impl FnOnce(&mut toml_edit::DocumentMut),
) -> Result<(), ConfigError> {
    let content = if path.exists() {
        fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|source| ConfigError::Edit {
            path: path.to_path_buf(),
            source,
        })?;
    edit(&mut doc);

    persist::atomic_write(path, doc.to_string().as_bytes()).map_err(|source| {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::debug!(path = %path.display(), "Persisted config");
    Ok(())
}
