//! Configuration file support for biogit.
//!
//! The on-disk format is INI with optional quoted subsections:
//!
//! ```ini
//! [user]
//!     name = Jane Doe
//! [remote "origin"]
//!     url = localhost:9418/project
//! ```
//!
//! Externally keys are flat and dot-separated: `user.name`,
//! `remote.origin.url`. The middle segment, when present, is the subsection.

mod parse;

use std::fs;
use std::path::{Path, PathBuf};

pub use parse::parse_document;

/// Errors from config operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed config at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid config key {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One `[section]` or `[section "subsection"]` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub subsection: Option<String>,
    pub entries: Vec<(String, String)>,
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: Vec<Section>,
    path: Option<PathBuf>,
}

impl Config {
    /// An empty config not bound to a file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file. A missing file yields an empty config bound to
    /// that path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let sections = match fs::read_to_string(path) {
            Ok(text) => parse_document(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(Self {
            sections,
            path: Some(path.to_path_buf()),
        })
    }

    /// Get a value by flat key (`user.name`, `remote.origin.url`).
    pub fn get(&self, key: &str) -> Option<&str> {
        let (section, subsection, key) = flat_parts(key)?;
        self.sections
            .iter()
            .find(|s| s.name == section && s.subsection.as_deref() == subsection)
            .and_then(|s| {
                s.entries
                    .iter()
                    .rev()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
            })
    }

    /// Set a value by flat key, creating the section if needed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let (section, subsection, entry_key) =
            flat_parts(key).ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
        let section = section.to_string();
        let subsection = subsection.map(|s| s.to_string());
        let entry_key = entry_key.to_string();

        let target = self
            .sections
            .iter_mut()
            .find(|s| s.name == section && s.subsection == subsection);

        match target {
            Some(s) => {
                if let Some(slot) = s.entries.iter_mut().find(|(k, _)| *k == entry_key) {
                    slot.1 = value.to_string();
                } else {
                    s.entries.push((entry_key, value.to_string()));
                }
            }
            None => self.sections.push(Section {
                name: section,
                subsection,
                entries: vec![(entry_key, value.to_string())],
            }),
        }
        Ok(())
    }

    /// Remove a key. Empty sections are dropped. Returns whether anything
    /// was removed.
    pub fn unset(&mut self, key: &str) -> bool {
        let Some((section, subsection, entry_key)) = flat_parts(key) else {
            return false;
        };
        let mut removed = false;
        if let Some(s) = self
            .sections
            .iter_mut()
            .find(|s| s.name == section && s.subsection.as_deref() == subsection)
        {
            let before = s.entries.len();
            s.entries.retain(|(k, _)| k != entry_key);
            removed = s.entries.len() != before;
        }
        self.sections.retain(|s| !s.entries.is_empty());
        removed
    }

    /// Remove an entire section (e.g. `remote.origin`). Returns whether it
    /// existed.
    pub fn remove_section(&mut self, name: &str, subsection: Option<&str>) -> bool {
        let before = self.sections.len();
        self.sections
            .retain(|s| !(s.name == name && s.subsection.as_deref() == subsection));
        self.sections.len() != before
    }

    /// All flat key/value pairs, in file order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for s in &self.sections {
            for (k, v) in &s.entries {
                let flat = match &s.subsection {
                    Some(sub) => format!("{}.{}.{}", s.name, sub, k),
                    None => format!("{}.{}", s.name, k),
                };
                out.push((flat, v.clone()));
            }
        }
        out
    }

    /// Subsection names of a section, e.g. configured remotes.
    pub fn subsections(&self, section: &str) -> Vec<String> {
        self.sections
            .iter()
            .filter(|s| s.name == section)
            .filter_map(|s| s.subsection.clone())
            .collect()
    }

    /// Write back to the file this config was loaded from (temp + rename).
    pub fn write(&self) -> Result<(), ConfigError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| ConfigError::InvalidKey("config not bound to a file".to_string()))?;
        let mut out = String::new();
        for s in &self.sections {
            match &s.subsection {
                Some(sub) => out.push_str(&format!("[{} \"{}\"]\n", s.name, sub)),
                None => out.push_str(&format!("[{}]\n", s.name)),
            }
            for (k, v) in &s.entries {
                out.push_str(&format!("\t{} = {}\n", k, v));
            }
        }
        let tmp = path.with_extension("lock");
        fs::write(&tmp, out)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Split a flat key into (section, subsection, key).
fn flat_parts(key: &str) -> Option<(&str, Option<&str>, &str)> {
    let first = key.find('.')?;
    let last = key.rfind('.')?;
    let section = &key[..first];
    let entry = &key[last + 1..];
    if section.is_empty() || entry.is_empty() {
        return None;
    }
    if first == last {
        Some((section, None, entry))
    } else {
        let sub = &key[first + 1..last];
        if sub.is_empty() {
            None
        } else {
            Some((section, Some(sub), entry))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn get_set_flat_keys() {
        let mut config = Config::new();
        config.set("user.name", "Jane").unwrap();
        config.set("remote.origin.url", "localhost:9418/p").unwrap();

        assert_eq!(config.get("user.name"), Some("Jane"));
        assert_eq!(config.get("remote.origin.url"), Some("localhost:9418/p"));
        assert_eq!(config.get("user.email"), None);
    }

    #[test]
    fn set_overwrites() {
        let mut config = Config::new();
        config.set("user.name", "A").unwrap();
        config.set("user.name", "B").unwrap();
        assert_eq!(config.get("user.name"), Some("B"));
        assert_eq!(config.entries().len(), 1);
    }

    #[test]
    fn unset_drops_empty_section() {
        let mut config = Config::new();
        config.set("user.name", "A").unwrap();
        assert!(config.unset("user.name"));
        assert!(!config.unset("user.name"));
        assert!(config.entries().is_empty());
    }

    #[test]
    fn remove_section_for_remote() {
        let mut config = Config::new();
        config.set("remote.origin.url", "u").unwrap();
        config.set("remote.backup.url", "v").unwrap();
        assert!(config.remove_section("remote", Some("origin")));
        assert_eq!(config.get("remote.origin.url"), None);
        assert_eq!(config.get("remote.backup.url"), Some("v"));
        assert_eq!(config.subsections("remote"), ["backup"]);
    }

    #[test]
    fn load_write_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");

        let mut config = Config::load(&path).unwrap();
        config.set("user.name", "Jane Doe").unwrap();
        config.set("remote.origin.url", "localhost:9418/p").unwrap();
        config.write().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[user]"));
        assert!(text.contains("[remote \"origin\"]"));

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.get("user.name"), Some("Jane Doe"));
        assert_eq!(reloaded.get("remote.origin.url"), Some("localhost:9418/p"));
    }

    #[test]
    fn invalid_keys_rejected() {
        let mut config = Config::new();
        assert!(config.set("nodot", "v").is_err());
        assert!(config.set(".bad", "v").is_err());
        assert!(config.set("bad.", "v").is_err());
        assert_eq!(config.get("nodot"), None);
    }
}
