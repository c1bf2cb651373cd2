//! Neo4j connection settings stored as YAML in the user's config directory.
//!
//! On first run the file does not exist yet: the user is asked for each value
//! (an empty answer takes the default) and the answers are written back so
//! later runs start without prompting.

use scangraph_core::ConnectionConfig;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/scangraph/neo4j_config.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to create config directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to read answer: {0}")]
    Prompt(io::Error),
}

/// Whether the config came from disk or was just created interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Loaded,
    Created,
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn load(path: &Path) -> Result<ConnectionConfig, ConfigError> {
    let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&yaml).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `config` to `path`, creating the parent directory. Both are private
/// to the current user on Unix.
pub fn save(path: &Path, config: &ConnectionConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        create_private_dir(dir).map_err(|source| ConfigError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    write_private_file(path, yaml.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a config from answers returned by `ask`, which receives the prompt
/// text. Answers are trimmed; blank answers take the default.
pub fn prompt_for_config<F>(mut ask: F) -> Result<ConnectionConfig, ConfigError>
where
    F: FnMut(&str) -> io::Result<String>,
{
    let defaults = ConnectionConfig::default();
    let mut answer = |label: &str, default: String| -> Result<String, ConfigError> {
        let raw = ask(&format!("Enter Neo4j {} [default {}]:", label, default))
            .map_err(ConfigError::Prompt)?;
        let trimmed = raw.trim();
        Ok(if trimmed.is_empty() {
            default
        } else {
            trimmed.to_string()
        })
    };

    Ok(ConnectionConfig {
        uri: answer("URI", defaults.uri)?,
        username: answer("Username", defaults.username)?,
        password: answer("Password", defaults.password)?,
    })
}

/// Read the config at `path`, or prompt for one and save it if the file is
/// missing.
pub fn load_or_create<F>(path: &Path, ask: F) -> Result<(ConnectionConfig, ConfigSource), ConfigError>
where
    F: FnMut(&str) -> io::Result<String>,
{
    if path.exists() {
        return Ok((load(path)?, ConfigSource::Loaded));
    }

    let config = prompt_for_config(ask)?;
    save(path, &config)?;
    Ok((config, ConfigSource::Created))
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)
}
