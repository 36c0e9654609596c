//! Compiled cache artifacts, one per corpus file.
//!
//! Layout of `<cache_dir>/<name>.bin`:
//!
//! | bytes | content |
//! |---|---|
//! | 4 | magic `SCF1` |
//! | 4 | little-endian [`CACHE_FORMAT_VERSION`] |
//! | rest | `bincode` encoding of [`CorpusFile`] |
//!
//! Artifacts from another format version are reported as
//! [`CacheError::StaleFormat`] and never decoded.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::CorpusFile;

pub const CACHE_MAGIC: [u8; 4] = *b"SCF1";
pub const CACHE_FORMAT_VERSION: u32 = 1;
const ARTIFACT_EXTENSION: &str = "bin";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache artifact at {0}")]
    Missing(PathBuf),
    #[error("cache artifact {path} has format version {found}, expected {expected}; recompile")]
    StaleFormat {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("{0} is not a cache artifact; recompile")]
    NotAnArtifact(PathBuf),
    #[error("failed to decode cache artifact {path}: {source}; recompile")]
    Decode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[error("failed to encode cache artifact {path}: {source}")]
    Encode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[error("cache i/o on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl CacheError {
    /// True when the artifact exists but cannot be trusted.
    pub fn needs_recompile(&self) -> bool {
        matches!(
            self,
            CacheError::StaleFormat { .. } | CacheError::NotAnArtifact(_) | CacheError::Decode { .. }
        )
    }
}

/// Directory holding compiled artifacts.
#[derive(Clone, Debug)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    /// Write `file`, replacing any existing artifact for the same name.
    pub fn write(&self, file: &CorpusFile) -> Result<PathBuf, CacheError> {
        let path = self.artifact_path(&file.name);
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
        writer.write_all(&CACHE_MAGIC).map_err(io_err)?;
        writer
            .write_all(&CACHE_FORMAT_VERSION.to_le_bytes())
            .map_err(io_err)?;
        bincode::serialize_into(&mut writer, file).map_err(|source| CacheError::Encode {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<CorpusFile, CacheError> {
        read_artifact(&self.artifact_path(name))
    }
}

fn read_artifact(path: &Path) -> Result<CorpusFile, CacheError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CacheError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut reader = BufReader::new(file);

    let mut header = [0u8; 8];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(CacheError::NotAnArtifact(path.to_path_buf()));
        }
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    if header[..4] != CACHE_MAGIC {
        return Err(CacheError::NotAnArtifact(path.to_path_buf()));
    }
    let found = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if found != CACHE_FORMAT_VERSION {
        return Err(CacheError::StaleFormat {
            path: path.to_path_buf(),
            found,
            expected: CACHE_FORMAT_VERSION,
        });
    }

    bincode::deserialize_from(reader).map_err(|source| CacheError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markup;

    const MARKUP: &str = "<p pnum=1><s snum=1>
<wf cmd=done pos=NN lemma=jury wnsn=1 lexsn=1:14:00:: dc=1>jury</wf>
<punc>.</punc>
</s></p>";

    #[test]
    fn round_trips_a_parsed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("compiled"));
        let file = parse_markup("br-x01", MARKUP).file;
        let path = store.write(&file).unwrap();
        assert_eq!(path, store.artifact_path("br-x01"));
        assert_eq!(store.read("br-x01").unwrap(), file);
    }

    #[test]
    fn rewriting_produces_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let file = parse_markup("br-x01", MARKUP).file;
        let path = store.write(&file).unwrap();
        let first = fs::read(&path).unwrap();
        store.write(&parse_markup("br-x01", MARKUP).file).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn missing_artifact_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = CacheStore::new(dir.path()).read("nope").unwrap_err();
        assert!(matches!(err, CacheError::Missing(_)));
        assert!(!err.needs_recompile());
    }

    #[test]
    fn other_versions_are_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.extend_from_slice(&(CACHE_FORMAT_VERSION + 1).to_le_bytes());
        bytes.extend_from_slice(b"whatever follows");
        fs::write(store.artifact_path("old"), bytes).unwrap();

        let err = store.read("old").unwrap_err();
        assert!(matches!(
            err,
            CacheError::StaleFormat { found, expected, .. }
                if found == CACHE_FORMAT_VERSION + 1 && expected == CACHE_FORMAT_VERSION
        ));
        assert!(err.needs_recompile());
    }

    #[test]
    fn foreign_and_truncated_files_need_recompile() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        fs::write(store.artifact_path("pickle"), b"\x80\x04\x95 python pickle").unwrap();
        assert!(matches!(
            store.read("pickle").unwrap_err(),
            CacheError::NotAnArtifact(_)
        ));

        fs::write(store.artifact_path("short"), b"SC").unwrap();
        assert!(matches!(
            store.read("short").unwrap_err(),
            CacheError::NotAnArtifact(_)
        ));

        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.extend_from_slice(&CACHE_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&[0xff; 3]);
        fs::write(store.artifact_path("cut"), bytes).unwrap();
        let err = store.read("cut").unwrap_err();
        assert!(matches!(err, CacheError::Decode { .. }));
        assert!(err.needs_recompile());
    }
}
