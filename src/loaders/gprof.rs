//! GNU gprof call graph profiles.
//!
//! Only the "Call graph" table is read. It is a sequence of blocks separated
//! by dashed lines; in each block the line starting with `[N]` is the
//! primary function, lines above it are its callers and lines below it are
//! its callees.

use super::source::{for_each_line, open_trace};
use super::{LoadOutput, Loader};
use crate::call::Call;
use crate::utils::config::{GPROF_HEADER_MARKER, GPROF_INDEX_MARKER};
use crate::utils::error::{LoadError, ParseError};
use log::{debug, warn};
use regex::Regex;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn cycle_whole_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^<cycle \d+ as a whole>$").expect("cycle pattern is valid")
    })
}

fn cycle_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*<cycle \d+>$").expect("cycle suffix pattern is valid"))
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>.+?)\s+\((?P<file>[^():\s]+):\d+\s+@\s+[0-9A-Fa-fx]+\)$")
            .expect("location pattern is valid")
    })
}

/// Role of a line inside a call graph block.
///
/// `None` marks entries that name no real function (`<spontaneous>`,
/// `<cycle N as a whole>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLine {
    Primary(Option<Call>),
    Related(Option<Call>),
}

fn is_numeric_column(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '/'))
}

/// Split a trailing `[N]` index off an entry
fn strip_index(entry: &str) -> Option<&str> {
    let without = entry.strip_suffix(']')?;
    let open = without.rfind('[')?;
    let digits = &without[open + 1..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(without[..open].trim_end())
}

/// Turn the name column into a call, `None` for placeholder entries
fn call_from_name(name: &str) -> Option<Call> {
    if name == "<spontaneous>" || cycle_whole_pattern().is_match(name) {
        return None;
    }
    let name = cycle_suffix_pattern().replace(name, "");

    match location_pattern().captures(&name) {
        Some(captures) => Some(Call::new(&captures["name"], &captures["file"])),
        None => Some(Call::new(name.as_ref(), "")),
    }
}

/// **Public** - Classify one non-separator line of a call graph block
///
/// # Errors
/// The reason the line could not be read, for the caller to record.
pub fn parse_block_line(line: &str) -> Result<BlockLine, String> {
    let mut rest = line.trim();

    let is_primary = rest.starts_with('[');
    if is_primary {
        let end = rest
            .find(']')
            .ok_or_else(|| "unterminated [index]".to_string())?;
        rest = rest[end + 1..].trim_start();
    }

    loop {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == rest.len() || !is_numeric_column(&rest[..end]) {
            break;
        }
        rest = rest[end..].trim_start();
    }

    let call = if rest == "<spontaneous>" {
        None
    } else {
        let name = strip_index(rest).ok_or_else(|| "missing trailing [index]".to_string())?;
        if name.is_empty() {
            return Err("missing function name".to_string());
        }
        call_from_name(name)
    };

    Ok(if is_primary {
        BlockLine::Primary(call)
    } else {
        BlockLine::Related(call)
    })
}

#[derive(Default)]
struct Block {
    callers: Vec<Call>,
    primary: Option<Option<Call>>,
    callees: Vec<Call>,
}

impl Block {
    fn add(&mut self, line: BlockLine) {
        match line {
            BlockLine::Primary(call) => self.primary = Some(call),
            BlockLine::Related(Some(call)) if self.primary.is_some() => self.callees.push(call),
            BlockLine::Related(Some(call)) => self.callers.push(call),
            BlockLine::Related(None) => {}
        }
    }

    fn flush(&mut self, output: &mut LoadOutput) {
        let block = std::mem::take(self);
        let Some(Some(primary)) = block.primary else {
            return;
        };

        output.graph.add_call(primary.clone());
        for caller in block.callers {
            output.graph.add_edge(caller, primary.clone());
        }
        for callee in block.callees {
            output.graph.add_edge(primary.clone(), callee);
        }
    }
}

/// **Public** - Build a graph from gprof output
///
/// Reading starts after the `index % time` header when the text has one. It
/// stops at a blank line right after a separator, where gprof starts its
/// explanation text, or at the function index or the first form feed.
pub fn parse_profile<R: BufRead>(reader: R, origin: &str) -> std::io::Result<LoadOutput> {
    let mut lines = Vec::new();
    for_each_line(reader, |number, line| lines.push((number, line.to_string())))?;

    let start = lines
        .iter()
        .position(|(_, line)| line.trim_start().starts_with(GPROF_HEADER_MARKER))
        .map_or(0, |header| header + 1);

    let mut output = LoadOutput::default();
    let mut block = Block::default();
    let mut after_separator = false;

    for (line_number, line) in &lines[start..] {
        if line.contains('\x0c') || line.trim_start().starts_with(GPROF_INDEX_MARKER) {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if after_separator {
                break;
            }
            continue;
        }
        if trimmed.starts_with("---") {
            block.flush(&mut output);
            after_separator = true;
            continue;
        }
        after_separator = false;

        match parse_block_line(line) {
            Ok(entry) => block.add(entry),
            Err(reason) => {
                let error = ParseError {
                    origin: origin.to_string(),
                    line_number: *line_number,
                    line: line.clone(),
                    reason,
                };
                warn!("Skipping malformed line: {}", error);
                output.errors.push(error);
            }
        }
    }
    block.flush(&mut output);

    debug!(
        "Parsed gprof profile {}: {} nodes, {} edges",
        origin,
        output.graph.node_count(),
        output.graph.edge_count()
    );
    Ok(output)
}

/// Loads one gprof call graph profile
#[derive(Debug, Clone)]
pub struct GprofLoader {
    path: PathBuf,
}

impl GprofLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Loader for GprofLoader {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadOutput, LoadError> {
        let reader = open_trace(&self.path)?;
        parse_profile(reader, &self.source()).map_err(|e| LoadError::io(&self.path, e))
    }
}
