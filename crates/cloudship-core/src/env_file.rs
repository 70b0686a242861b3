use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Append-only `KEY=VALUE` file used to hand values from one pipeline step
/// to the next when each step runs as its own process.
///
/// A key is written at most once. Lines written by other tools are kept.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. A missing file reads as empty; for duplicate keys the
    /// first occurrence wins.
    pub fn read(&self) -> Result<BTreeMap<String, String>> {
        let mut values = BTreeMap::new();
        if !self.path.exists() {
            return Ok(values);
        }

        let iter = dotenvy::from_path_iter(&self.path).map_err(|e| Error::EnvFileRead {
            path: self.path.clone(),
            source: e,
        })?;

        for item in iter {
            let (key, value) = item.map_err(|e| Error::EnvFileRead {
                path: self.path.clone(),
                source: e,
            })?;
            values.entry(key).or_insert(value);
        }

        Ok(values)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    pub fn append(&self, key: &str, value: &str) -> Result<()> {
        self.append_all(&[(key, value)])
    }

    /// Append several entries in one write. Nothing is written if any key is
    /// invalid or already present.
    pub fn append_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let existing = self.read()?;

        let mut lines = String::new();
        for (index, (key, value)) in entries.iter().enumerate() {
            validate_entry(key, value)?;

            let repeated = entries[..index].iter().any(|(k, _)| k == key);
            if repeated || existing.contains_key(*key) {
                return Err(Error::EnvKeyExists {
                    key: (*key).to_owned(),
                    path: self.path.clone(),
                });
            }

            lines.push_str(key);
            lines.push('=');
            lines.push_str(value);
            lines.push('\n');
        }

        if lines.is_empty() {
            return Ok(());
        }

        if self.needs_leading_newline()? {
            lines.insert(0, '\n');
        }

        let write_err = |e| Error::EnvFileWrite {
            path: self.path.clone(),
            source: e,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.write_all(lines.as_bytes()).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), count = entries.len(), "appended env entries");
        Ok(())
    }

    fn needs_leading_newline(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let content = std::fs::read(&self.path).map_err(|e| Error::EnvFileWrite {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(content.last().is_some_and(|b| *b != b'\n'))
    }
}

fn validate_entry(key: &str, value: &str) -> Result<()> {
    let invalid = |reason| Error::EnvInvalidEntry {
        key: key.to_owned(),
        reason,
    };

    let mut chars = key.chars();
    let valid_key = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_key {
        return Err(invalid("key must match [A-Za-z_][A-Za-z0-9_]*"));
    }
    if value.contains(['\n', '\r']) {
        return Err(invalid("value must be a single line"));
    }
    if value.contains(['$', '"', '\'', '#', ' ']) {
        return Err(invalid("value must not need quoting"));
    }
    Ok(())
}
