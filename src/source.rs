//! Source of truth
//!
//! The authoritative data behind the cache. A [`Source`] produces a value
//! together with the resources the value was derived from; the cache watches
//! those resources to invalidate the entry when they change.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SourceError;
use crate::watcher::ResourceId;

/// A fetched value plus the resources it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    pub value: V,
    pub dependencies: Vec<ResourceId>,
}

impl<V> Fetched<V> {
    pub fn new(value: V, dependencies: Vec<ResourceId>) -> Self {
        Self {
            value,
            dependencies,
        }
    }
}

// == Source Trait ==
/// Authoritative producer of values.
pub trait Source {
    type Value;

    fn fetch(&self, identifier: &str) -> Result<Fetched<Self::Value>, SourceError>;
}

// == User Directory ==
/// One record of the users file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub user_code: String,
    pub user_name: String,
}

/// JSON users file mapping user names to user codes.
///
/// Every fetch re-reads and re-parses the file, which is exactly the cost
/// the cache saves.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    path: PathBuf,
}

impl UserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records from the file.
    pub fn users(&self) -> Result<Vec<UserRecord>, SourceError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resource id under which the file is watched.
    pub fn resource_id(&self) -> ResourceId {
        fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .to_string_lossy()
            .into_owned()
    }
}

impl Source for UserDirectory {
    type Value = String;

    /// Looks up the user code for the user named `identifier`.
    fn fetch(&self, identifier: &str) -> Result<Fetched<String>, SourceError> {
        let code = self
            .users()?
            .into_iter()
            .find(|user| user.user_name == identifier)
            .map(|user| user.user_code)
            .ok_or_else(|| SourceError::NotFound(identifier.to_string()))?;
        Ok(Fetched::new(code, vec![self.resource_id()]))
    }
}
