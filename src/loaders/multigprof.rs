//! Several gprof profiles of the same program, parsed in parallel.
//!
//! Each worker owns the partial graph of one file; partial results are merged
//! sequentially in input order once every worker has finished.

use super::gprof::GprofLoader;
use super::{LoadOutput, Loader};
use crate::utils::config::DEFAULT_PROCESSES;
use crate::utils::error::LoadError;
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Loads a set of gprof profiles with a bounded worker pool
#[derive(Debug, Clone)]
pub struct MultiGprofLoader {
    sources: Vec<PathBuf>,
    processes: usize,
}

impl MultiGprofLoader {
    pub fn new(sources: Vec<PathBuf>, processes: usize) -> Self {
        Self {
            sources,
            processes: processes.max(1),
        }
    }

    /// **Public** - Every regular file directly inside `dir`, sorted by name
    ///
    /// # Errors
    /// * `LoadError::SourceNotFound` - `dir` does not exist
    /// * `LoadError::Io` - `dir` could not be listed
    pub fn from_directory(dir: &Path, processes: usize) -> Result<Self, LoadError> {
        if !dir.exists() {
            return Err(LoadError::SourceNotFound(dir.to_path_buf()));
        }

        let mut sources = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
            let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
            if path.is_file() {
                sources.push(path);
            }
        }
        sources.sort();

        debug!("Found {} profiles in {}", sources.len(), dir.display());
        Ok(Self::new(sources, processes))
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn processes(&self) -> usize {
        self.processes
    }
}

impl Default for MultiGprofLoader {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_PROCESSES)
    }
}

impl Loader for MultiGprofLoader {
    fn source(&self) -> String {
        self.sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn load(&self) -> Result<LoadOutput, LoadError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.processes)
            .thread_name(|i| format!("gprof-worker-{}", i))
            .build()
            .map_err(|e| LoadError::WorkerPool(e.to_string()))?;

        info!(
            "Loading {} gprof profiles with {} workers",
            self.sources.len(),
            self.processes
        );

        let partials: Vec<Result<LoadOutput, LoadError>> = pool.install(|| {
            self.sources
                .par_iter()
                .map(|path| GprofLoader::new(path.clone()).load())
                .collect()
        });

        let mut merged = LoadOutput::default();
        for partial in partials {
            merged.merge(partial?);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processes_at_least_one() {
        let loader = MultiGprofLoader::new(Vec::new(), 0);
        assert_eq!(loader.processes(), 1);
    }

    #[test]
    fn test_empty_source_list() {
        let output = MultiGprofLoader::default().load().unwrap();
        assert_eq!(output.graph.node_count(), 0);
    }

    #[test]
    fn test_from_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let loader = MultiGprofLoader::from_directory(dir.path(), 2).unwrap();
        let names: Vec<_> = loader
            .sources()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
