//! The skill settings store shared with the host.
//!
//! Settings live in a JSON object on disk. Only `sshd` and `airplay` are interpreted;
//! every other key is carried through untouched when the file is rewritten.

mod watcher;

pub use watcher::*;

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;
use tokio::fs;

use crate::services::Service;

/// Contents of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSettings {
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub sshd: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub airplay: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The web settings page sends checkbox values either as booleans or as `"true"`/`"false"`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(ref s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(ref s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    })
}

impl SkillSettings {
    /// Persisted state of `service`; an absent flag reads as disabled.
    #[must_use]
    pub fn flag(&self, service: Service) -> bool {
        match service {
            Service::Ssh => self.sshd,
            Service::AirPlay => self.airplay,
        }
        .unwrap_or(false)
    }

    pub const fn set_flag(&mut self, service: Service, enabled: bool) {
        match service {
            Service::Ssh => self.sshd = Some(enabled),
            Service::AirPlay => self.airplay = Some(enabled),
        }
    }

    /// Parses a settings object as carried in bus payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, ThisError)]
pub enum SettingsError {
    #[error("failed to read settings at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings at {path:?} are empty")]
    Empty { path: PathBuf },
    #[error("failed to write settings at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings; a missing or empty file yields default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<SkillSettings, SettingsError> {
        match self.load_written().await {
            Err(SettingsError::Empty { .. }) => Ok(SkillSettings::default()),
            res => res,
        }
    }

    /// Reads the settings as last written by the host.
    ///
    /// A missing file yields default settings. An empty file is an error: the host
    /// truncates before writing, so an empty file is a write in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, unreadable or unparsable.
    pub async fn load_written(&self) -> Result<SkillSettings, SettingsError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SkillSettings::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Err(SettingsError::Empty {
                path: self.path.clone(),
            });
        }
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the settings through a temporary file renamed over the store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub async fn save(&self, settings: &SkillSettings) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(settings)?;
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await.map_err(write_err)?;
        fs::rename(&tmp, &self.path).await.map_err(write_err)
    }

    /// Loads the settings, sets one flag and writes them back.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub async fn persist_flag(&self, service: Service, enabled: bool) -> Result<(), SettingsError> {
        let mut settings = self.load().await?;
        settings.set_flag(service, enabled);
        self.save(&settings).await
    }
}
