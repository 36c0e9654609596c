//! Corpus sources plus the compile/load cycle.
//!
//! Source files are ordered by file name, and both `compile` and `load` walk
//! that order, so `load(n)` picks up exactly what `compile(n)` wrote.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use memmap2::Mmap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Semcor;
use crate::btypes::BasicTypeMap;
use crate::cache::{CacheError, CacheStore};
use crate::model::CorpusFile;
use crate::parser::parse_markup;

/// Tagfile directories of a Semcor 3.0 distribution, relative to its root.
pub const TAGFILE_DIRS: [&str; 3] = ["brown1/tagfiles", "brown2/tagfiles", "brownv/tagfiles"];

/// Strategy for reading source files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each source file.
    Mmap,
    /// Read each source file into an owned buffer.
    Owned,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus directory {0} does not exist")]
    MissingRoot(PathBuf),
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// One source file and the stable name used for it everywhere.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub failed: Vec<(String, SourceError)>,
    pub issues: usize,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub missing: Vec<String>,
    pub stale: Vec<(String, CacheError)>,
}

impl LoadReport {
    /// True when some artifacts exist but were written in another format.
    pub fn needs_recompile(&self) -> bool {
        !self.stale.is_empty()
    }
}

pub struct Corpus {
    sources: Vec<SourceFile>,
    cache: CacheStore,
    mode: LoadMode,
}

impl Corpus {
    /// Collect the tagfiles under `root`.
    ///
    /// A Semcor distribution root contributes every directory in
    /// [`TAGFILE_DIRS`] that exists; any other directory is read as a single
    /// tagfile directory.
    pub fn discover(root: impl AsRef<Path>, cache: CacheStore) -> Result<Self, CorpusError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CorpusError::MissingRoot(root.to_path_buf()));
        }
        let mut dirs: Vec<PathBuf> = TAGFILE_DIRS
            .iter()
            .map(|d| root.join(d))
            .filter(|d| d.is_dir())
            .collect();
        if dirs.is_empty() {
            dirs.push(root.to_path_buf());
        }

        let mut sources = Vec::new();
        for dir in &dirs {
            let entries = fs::read_dir(dir).map_err(|source| CorpusError::List {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| CorpusError::List {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    warn!("skipping non-utf8 file name {}", path.display());
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                sources.push(SourceFile {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
        }
        info!("found {} source files under {}", sources.len(), root.display());
        Ok(Self::from_sources(sources, cache))
    }

    pub fn from_sources(mut sources: Vec<SourceFile>, cache: CacheStore) -> Self {
        sources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        Self {
            sources,
            cache,
            mode: LoadMode::Mmap,
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn selected(&self, max_files: Option<usize>) -> &[SourceFile] {
        let n = max_files.unwrap_or(usize::MAX).min(self.sources.len());
        &self.sources[..n]
    }

    /// Parse one source file, logging anything the parser had to skip.
    pub fn parse_source(&self, source: &SourceFile) -> Result<(CorpusFile, usize), SourceError> {
        let bytes = read_source(&source.path, self.mode)?;
        let text = String::from_utf8_lossy(bytes.as_slice());
        let parsed = parse_markup(&source.name, &text);
        for issue in &parsed.issues {
            warn!("{}: {}", source.name, issue);
        }
        Ok((parsed.file, parsed.issues.len()))
    }

    /// Parse the first `max_files` sources and write their artifacts.
    ///
    /// A file that cannot be read or written is reported and skipped.
    pub fn compile(&self, max_files: Option<usize>) -> CompileReport {
        let start = Instant::now();
        let mut report = CompileReport::default();
        for source in self.selected(max_files) {
            info!("compiling {}", source.path.display());
            let result = self.parse_source(source).and_then(|(file, issues)| {
                self.cache.write(&file)?;
                Ok(issues)
            });
            match result {
                Ok(issues) => {
                    report.issues += issues;
                    report.compiled.push(source.name.clone());
                }
                Err(err) => {
                    warn!("failed to compile {}: {}", source.name, err);
                    report.failed.push((source.name.clone(), err));
                }
            }
        }
        info!(
            "compiled {} files ({} failed) in {} ms",
            report.compiled.len(),
            report.failed.len(),
            start.elapsed().as_millis()
        );
        report
    }

    /// Load the artifacts of the first `max_files` sources and index them.
    ///
    /// Missing artifacts are left out. Stale or undecodable ones are left out
    /// and listed in the report so the caller can ask for a recompile.
    pub fn load(&self, max_files: Option<usize>, btypes: BasicTypeMap) -> (Semcor, LoadReport) {
        let start = Instant::now();
        let mut report = LoadReport::default();
        let mut files = Vec::new();
        for source in self.selected(max_files) {
            match self.cache.read(&source.name) {
                Ok(file) => {
                    debug!("loaded {}", self.cache.artifact_path(&source.name).display());
                    report.loaded.push(source.name.clone());
                    files.push(file);
                }
                Err(CacheError::Missing(path)) => {
                    debug!("no artifact at {}, skipping", path.display());
                    report.missing.push(source.name.clone());
                }
                Err(err) => {
                    warn!("{}", err);
                    report.stale.push((source.name.clone(), err));
                }
            }
        }
        let loaded = start.elapsed();

        let semcor = Semcor::new(files, btypes);
        info!(
            "loaded {} files in {} ms, indexed in {} ms",
            report.loaded.len(),
            loaded.as_millis(),
            start.elapsed().saturating_sub(loaded).as_millis()
        );
        (semcor, report)
    }

    /// Parse sources directly, bypassing the cache.
    pub fn parse_all(&self, max_files: Option<usize>, btypes: BasicTypeMap) -> Semcor {
        let files = self
            .selected(max_files)
            .iter()
            .filter_map(|source| match self.parse_source(source) {
                Ok((file, _)) => Some(file),
                Err(err) => {
                    warn!("skipping {}: {}", source.name, err);
                    None
                }
            })
            .collect();
        Semcor::new(files, btypes)
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

fn read_source(path: &Path, mode: LoadMode) -> Result<Buffer, SourceError> {
    let read_err = |source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let len = file.metadata().map_err(read_err)?.len();
    match mode {
        // Empty files cannot be mapped on every platform.
        LoadMode::Mmap if len > 0 => {
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .map_err(read_err)
        }
        _ => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).map_err(read_err)?;
            Ok(Buffer::Owned(buf))
        }
    }
}
