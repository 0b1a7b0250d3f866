//! java-callgraph method call lists.
//!
//! Method lines look like
//! `M:org.app.Main:run(java.lang.String) (I)org.app.Io:read()`; class
//! dependency lines (`C:`) carry no call information and are skipped.

use super::source::{for_each_line, open_trace};
use super::{LoadOutput, Loader};
use crate::call::Call;
use crate::utils::error::{LoadError, ParseError};
use log::{debug, warn};
use regex::Regex;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn method_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^M:(?P<caller>[^:\s]+):(?P<caller_method>[^(\s]+)\((?P<caller_args>[^)]*)\)\s+\([MIOSD]\)(?P<callee>[^:\s]+):(?P<callee_method>[^(\s]+)\((?P<callee_args>[^)]*)\)$",
        )
        .expect("javacg method pattern is valid")
    })
}

/// A caller/callee pair and the classes they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub caller: Call,
    pub caller_class: String,
    pub callee: Call,
    pub callee_class: String,
}

/// **Public** - Parse one `M:` line
pub fn parse_method_line(line: &str) -> Result<MethodCall, String> {
    let captures = method_pattern()
        .captures(line.trim())
        .ok_or_else(|| "expected `M:Class:method(args) (T)Class:method(args)`".to_string())?;

    let caller_class = &captures["caller"];
    let callee_class = &captures["callee"];
    let caller_method = &captures["caller_method"];
    let callee_method = &captures["callee_method"];

    Ok(MethodCall {
        caller: Call::new(
            caller_method,
            format!("{}:{}({})", caller_class, caller_method, &captures["caller_args"]),
        ),
        caller_class: caller_class.to_string(),
        callee: Call::new(
            callee_method,
            format!("{}:{}({})", callee_class, callee_method, &captures["callee_args"]),
        ),
        callee_class: callee_class.to_string(),
    })
}

fn in_packages(class: &str, packages: &[String]) -> bool {
    packages.iter().any(|prefix| class.starts_with(prefix.as_str()))
}

/// **Public** - Build a graph from java-callgraph output
///
/// # Arguments
/// * `packages` - Package prefixes to keep; empty keeps every edge
pub fn parse_calls<R: BufRead>(
    reader: R,
    origin: &str,
    packages: &[String],
) -> std::io::Result<LoadOutput> {
    let mut output = LoadOutput::default();
    let mut filtered = 0usize;

    for_each_line(reader, |line_number, line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("C:") {
            return;
        }

        match parse_method_line(trimmed) {
            Ok(call) => {
                if packages.is_empty()
                    || (in_packages(&call.caller_class, packages)
                        && in_packages(&call.callee_class, packages))
                {
                    output.graph.add_edge(call.caller, call.callee);
                } else {
                    filtered += 1;
                }
            }
            Err(reason) => {
                let error = ParseError {
                    origin: origin.to_string(),
                    line_number,
                    line: line.to_string(),
                    reason,
                };
                warn!("Skipping malformed line: {}", error);
                output.errors.push(error);
            }
        }
    })?;

    debug!(
        "Parsed javacg output {}: {} nodes, {} edges, {} edges outside application packages",
        origin,
        output.graph.node_count(),
        output.graph.edge_count(),
        filtered
    );
    Ok(output)
}

/// Loads java-callgraph output, optionally scoped to application packages
#[derive(Debug, Clone)]
pub struct JavaCgLoader {
    path: PathBuf,
    app_packages: Vec<String>,
}

impl JavaCgLoader {
    pub fn new(path: impl Into<PathBuf>, app_packages: Vec<String>) -> Self {
        Self {
            path: path.into(),
            app_packages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn app_packages(&self) -> &[String] {
        &self.app_packages
    }
}

impl Loader for JavaCgLoader {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadOutput, LoadError> {
        let reader = open_trace(&self.path)?;
        parse_calls(reader, &self.source(), &self.app_packages)
            .map_err(|e| LoadError::io(&self.path, e))
    }
}
