//! GNU cflow indentation traces.
//!
//! Each line names one call; its indentation gives the nesting depth. The
//! forward trace lists callees under their caller, the reverse trace (`-r`)
//! lists callers under their callee. Both produce caller to callee edges.

use super::source::{ensure_exists, for_each_line, open_trace, CflowProcess};
use super::stack::IndentationStack;
use super::{LoadOutput, Loader};
use crate::call::Call;
use crate::utils::config::{CFLOW_INDENT_WIDTH, DEFAULT_CFLOW_PROGRAM};
use crate::utils::error::{LoadError, ParseError};
use log::{debug, warn};
use regex::Regex;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One parsed trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub call: Call,
    pub level: usize,
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>[A-Za-z_$][\w$.]*)\(\)(?:\s*<.*\sat\s+(?P<file>[^\s:]+):\d+>)?")
            .expect("cflow line pattern is valid")
    })
}

/// **Public** - Nesting depth of a line from its leading whitespace
///
/// Spaces count one column, tabs count a full level.
pub fn indentation_level(line: &str) -> usize {
    let columns: usize = line
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { CFLOW_INDENT_WIDTH } else { 1 })
        .sum();
    columns / CFLOW_INDENT_WIDTH
}

/// **Public** - Parse a single cflow line
///
/// # Returns
/// * `Ok(None)` - blank line
/// * `Ok(Some(line))` - a call and its nesting level
/// * `Err(reason)` - the line carries no `name()` token
pub fn parse_line(line: &str) -> Result<Option<TraceLine>, String> {
    let body = line.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let captures = line_pattern()
        .captures(body)
        .ok_or_else(|| "expected a `name()` call".to_string())?;

    let name = &captures["name"];
    let signature = captures.name("file").map_or("", |m| m.as_str());

    Ok(Some(TraceLine {
        call: Call::new(name, signature),
        level: indentation_level(line),
    }))
}

/// **Public** - Build a graph from a cflow trace stream
///
/// Malformed lines are recorded and skipped; they never become `previous`.
///
/// # Arguments
/// * `reader` - Trace text
/// * `origin` - Name used in parse errors
/// * `reverse` - Whether the trace was produced by `cflow -r`
pub fn parse_trace<R: BufRead>(
    reader: R,
    origin: &str,
    reverse: bool,
) -> std::io::Result<LoadOutput> {
    let mut output = LoadOutput::default();
    let mut ancestors: IndentationStack<Call> = IndentationStack::new();
    let mut previous: Option<TraceLine> = None;

    for_each_line(reader, |line_number, line| {
        let current = match parse_line(line) {
            Ok(Some(current)) => current,
            Ok(None) => return,
            Err(reason) => {
                let error = ParseError {
                    origin: origin.to_string(),
                    line_number,
                    line: line.to_string(),
                    reason,
                };
                warn!("Skipping malformed line: {}", error);
                output.errors.push(error);
                return;
            }
        };

        output.graph.add_call(current.call.clone());

        if let Some(prev) = previous.take() {
            if current.level > prev.level {
                ancestors.push(prev.call);
            } else if current.level < prev.level {
                ancestors.unwind(prev.level - current.level);
            }

            if let Some(parent) = ancestors.top() {
                if reverse {
                    output.graph.add_edge(current.call.clone(), parent.clone());
                } else {
                    output.graph.add_edge(parent.clone(), current.call.clone());
                }
            }
        }

        previous = Some(current);
    })?;

    debug!(
        "Parsed cflow trace {}: {} nodes, {} edges",
        origin,
        output.graph.node_count(),
        output.graph.edge_count()
    );
    Ok(output)
}

/// Loads a cflow trace file, or runs cflow over a source directory
#[derive(Debug, Clone)]
pub struct CflowLoader {
    path: PathBuf,
    reverse: bool,
    program: String,
}

impl CflowLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reverse: false,
            program: DEFAULT_CFLOW_PROGRAM.to_string(),
        }
    }

    /// Treat the trace as produced by `cflow -r`
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Executable used when the source is a directory
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }
}

impl Loader for CflowLoader {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadOutput, LoadError> {
        ensure_exists(&self.path)?;
        let origin = self.source();

        if self.path.is_dir() {
            let process = CflowProcess::spawn(&self.program, &self.path, self.reverse)?;
            process.run(|stdout| parse_trace(stdout, &origin, self.reverse))
        } else {
            let reader = open_trace(&self.path)?;
            parse_trace(reader, &origin, self.reverse).map_err(|e| LoadError::io(&self.path, e))
        }
    }
}
