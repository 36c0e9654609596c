//! Sense key to basic type table.
//!
//! The table is produced by an external CoreLex tool. Each line holds a sense
//! key and its basic type label separated by a tab:
//!
//! ```text
//! # sense key         basic type
//! jury%1:14:00::      grp
//! say%2:32:00::       com
//! bank%1:14:00::      grp pos
//! ```
//!
//! Labels are kept verbatim, including compound labels such as `grp pos`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use semcor_types::SenseKey;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read basic type table {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read-only lookup from sense key to basic type label.
#[derive(Clone, Debug, Default)]
pub struct BasicTypeMap {
    labels: HashMap<String, String>,
}

impl BasicTypeMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse(&text);
        info!("loaded {} basic type labels from {}", map.len(), path.display());
        Ok(map)
    }

    /// Parse the table, skipping blank lines, comments and malformed lines.
    pub fn parse(text: &str) -> Self {
        let mut labels = HashMap::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let split = line
                .split_once('\t')
                .or_else(|| line.split_once(char::is_whitespace));
            let Some((key, label)) = split else {
                warn!("basic type table:{} missing label", lineno + 1);
                continue;
            };
            let (key, label) = (key.trim(), label.trim());
            if SenseKey::parse(key).is_none() || label.is_empty() {
                warn!("basic type table:{} malformed entry", lineno + 1);
                continue;
            }
            labels.insert(key.to_string(), label.to_string());
        }
        Self { labels }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &SenseKey) -> Option<&str> {
        self.get_str(&key.to_string())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
