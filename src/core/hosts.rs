/// Persisted host list
///
/// One host per line in `~/.config/server-check/hosts.txt`. Blank lines are
/// skipped on load; every mutation rewrites the whole file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::HostListError;
use crate::utils::{config_dir, ensure_private_dir, HOSTS_FILE};

#[derive(Debug, Clone)]
pub struct HostList {
    path: PathBuf,
    hosts: Vec<String>,
}

impl HostList {
    /// Default location, creating the config directory if needed
    pub fn default_path() -> Result<PathBuf, HostListError> {
        let dir = config_dir().map_err(|e| HostListError::Location(e.to_string()))?;
        ensure_private_dir(&dir).map_err(|e| HostListError::Location(format!("{:#}", e)))?;
        Ok(dir.join(HOSTS_FILE))
    }

    pub fn load_default() -> Result<Self, HostListError> {
        Self::load(Self::default_path()?)
    }

    /// Load the list from `path`. A missing file is an empty list.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HostListError> {
        let path = path.as_ref().to_path_buf();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(HostListError::Io { path, source }),
        };

        let hosts = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        debug!(path = %path.display(), count = hosts.len(), "Loaded host list");
        Ok(Self { path, hosts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }

    /// Append a host and persist. Exact duplicates are rejected.
    pub fn add(&mut self, host: &str) -> Result<(), HostListError> {
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(HostListError::Invalid(host.to_string()));
        }
        if self.contains(host) {
            return Err(HostListError::Duplicate(host.to_string()));
        }

        self.hosts.push(host.to_string());
        if let Err(e) = self.save() {
            self.hosts.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove an exact match and persist
    pub fn remove(&mut self, host: &str) -> Result<(), HostListError> {
        let index = self
            .hosts
            .iter()
            .position(|h| h == host)
            .ok_or_else(|| HostListError::NotFound(host.to_string()))?;

        let removed = self.hosts.remove(index);
        if let Err(e) = self.save() {
            self.hosts.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Rewrite the whole file from the in-memory list
    pub fn save(&self) -> Result<(), HostListError> {
        let mut content = self.hosts.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(|source| HostListError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
