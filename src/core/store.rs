use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::document::ConfigDocument;

/// Environment variable overriding the config location.
pub const CONFIG_ENV: &str = "QUICKLAUNCH_CONFIG";

/// Folder under the per-user data directory holding `config.json`.
const APP_DIR: &str = "AppLauncher";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read config file at {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse {}: {source}. Check JSON syntax.", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write config file at {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes the launcher document at one fixed path.
///
/// The path is chosen once at start-up and handed to every owner of a
/// document copy, so tests can point a store at a temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the config location: explicit argument, then
    /// `$QUICKLAUNCH_CONFIG`, then the per-user data directory.
    pub fn locate(explicit: Option<PathBuf>) -> Self {
        let path = explicit
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(Self::default_path);
        Self::new(path)
    }

    /// `<data dir>/AppLauncher/config.json`, or under `$HOME` when the
    /// platform has no data directory.
    pub fn default_path() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
        });
        base.join(APP_DIR).join(CONFIG_FILE)
    }

    /// The template shipped with the binary: `config.json` next to the
    /// executable, else `data/config.json` under the working directory.
    pub fn bundled_template() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)))
            .filter(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from("data").join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed a first-run config by copying `template` into place.
    ///
    /// Does nothing when a config already exists or the template is
    /// missing. Returns whether a copy was made.
    pub fn bootstrap(&self, template: &Path) -> io::Result<bool> {
        if self.path.exists() || !template.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(template, &self.path)?;
        info!(
            template = %template.display(),
            path = %self.path.display(),
            "seeded config from template"
        );
        Ok(true)
    }

    /// Load the document, falling back to the built-in default when the
    /// file is missing or unreadable. Never fails and never writes.
    pub fn load(&self) -> ConfigDocument {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no config file, using defaults");
            return ConfigDocument::builtin_default();
        }
        match self.load_with_validation() {
            Ok(doc) => doc,
            Err(e) => {
                warn!("{}. Using defaults.", e);
                ConfigDocument::builtin_default()
            }
        }
    }

    /// Load the document, reporting why it could not be used.
    pub fn load_with_validation(&self) -> Result<ConfigDocument, StoreError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with `doc` as 4-space indented JSON.
    ///
    /// The write is a plain overwrite, not an atomic replace.
    pub fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        let contents = to_pretty_json(doc)?;
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(&self.path, contents).map_err(write_err)?;
        info!(path = %self.path.display(), entries = doc.apps.len(), "saved config");
        Ok(())
    }
}

fn to_pretty_json(doc: &ConfigDocument) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
