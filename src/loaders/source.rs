//! Trace sources: files on disk and the cflow subprocess.
//!
//! A trace is always consumed as a line stream. When a loader is pointed at
//! a source directory, cflow is run against it and its stdout is piped into
//! the parser; a non-zero exit status fails the load.

use crate::utils::config::CFLOW_SOURCE_EXTENSIONS;
use crate::utils::error::LoadError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use walkdir::WalkDir;

/// Feed each line of `reader` to `on_line` with its one-based number.
///
/// Invalid UTF-8 is replaced rather than rejected; trailing `\r\n` is removed.
pub fn for_each_line<R: BufRead>(
    mut reader: R,
    mut on_line: impl FnMut(usize, &str),
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        line_number += 1;
        let line = String::from_utf8_lossy(&buf);
        on_line(line_number, line.trim_end_matches(['\n', '\r']));
    }
}

/// Check that `path` exists before any loader touches it
pub fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.exists() {
        Ok(())
    } else {
        Err(LoadError::SourceNotFound(path.to_path_buf()))
    }
}

/// Open a trace file for buffered line reading
pub fn open_trace(path: &Path) -> Result<BufReader<File>, LoadError> {
    ensure_exists(path)?;
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    Ok(BufReader::new(file))
}

/// C sources below `dir`, sorted for a stable cflow invocation
pub fn find_c_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CFLOW_SOURCE_EXTENSIONS.contains(&ext))
        })
        .collect();
    sources.sort();
    sources
}

/// Running cflow process whose stdout is the trace
pub struct CflowProcess {
    child: Child,
    program: String,
}

impl CflowProcess {
    /// Start `program` over every C source in `dir`
    ///
    /// # Errors
    /// * `LoadError::SubprocessFailure` - no sources found or the process could not start
    pub fn spawn(program: &str, dir: &Path, reverse: bool) -> Result<Self, LoadError> {
        let sources = find_c_sources(dir);
        if sources.is_empty() {
            return Err(LoadError::SubprocessFailure(format!(
                "no C sources found in {}",
                dir.display()
            )));
        }

        info!("Running {} on {} source files in {}", program, sources.len(), dir.display());

        let mut command = Command::new(program);
        if reverse {
            command.arg("-r");
        }
        command
            .args(&sources)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        debug!("Spawning {:?}", command);
        let child = command.spawn().map_err(|e| {
            LoadError::SubprocessFailure(format!("failed to start {}: {}", program, e))
        })?;

        Ok(Self {
            child,
            program: program.to_string(),
        })
    }

    /// Stream stdout through `consume`, then wait for the exit status.
    ///
    /// # Errors
    /// * `LoadError::SubprocessFailure` - read failure or non-zero exit status
    pub fn run<T>(
        mut self,
        consume: impl FnOnce(BufReader<std::process::ChildStdout>) -> std::io::Result<T>,
    ) -> Result<T, LoadError> {
        let stdout = self.child.stdout.take().ok_or_else(|| {
            LoadError::SubprocessFailure(format!("{} stdout was not captured", self.program))
        })?;

        let consumed = consume(BufReader::new(stdout));

        let status = self.child.wait().map_err(|e| {
            LoadError::SubprocessFailure(format!("failed to wait for {}: {}", self.program, e))
        })?;

        let value = consumed.map_err(|e| {
            LoadError::SubprocessFailure(format!("failed to read {} output: {}", self.program, e))
        })?;

        if !status.success() {
            return Err(LoadError::SubprocessFailure(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_line_strips_endings() {
        let mut lines = Vec::new();
        for_each_line("a()\r\n    b()\nc()".as_bytes(), |n, l| lines.push((n, l.to_string())))
            .unwrap();
        assert_eq!(
            lines,
            vec![
                (1, "a()".to_string()),
                (2, "    b()".to_string()),
                (3, "c()".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_source() {
        let result = open_trace(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(LoadError::SourceNotFound(_))));
    }

    #[test]
    fn test_find_c_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.c"), "int main(void) { return 0; }").unwrap();
        std::fs::write(dir.path().join("util.h"), "").unwrap();
        std::fs::write(dir.path().join("README"), "").unwrap();

        let sources = find_c_sources(dir.path());
        assert_eq!(sources.len(), 2);
        assert!(sources[0].ends_with("main.c"));
    }
}
