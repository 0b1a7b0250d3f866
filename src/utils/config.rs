//! Configuration and constants for the CLI and loaders.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default number of workers used when loading a directory of gprof traces
pub const DEFAULT_PROCESSES: usize = 2;

/// Columns of indentation cflow emits per nesting level
pub const CFLOW_INDENT_WIDTH: usize = 4;

/// Executable invoked when a cflow trace has to be generated from sources
pub const DEFAULT_CFLOW_PROGRAM: &str = "cflow";

/// Environment variable that overrides the cflow executable
pub const CFLOW_PROGRAM_ENV: &str = "ASM_CFLOW_PROGRAM";

/// File extensions handed to cflow when scanning a source directory
pub const CFLOW_SOURCE_EXTENSIONS: &[&str] = &["c", "h"];

// gprof section markers
pub const GPROF_HEADER_MARKER: &str = "index % time";
pub const GPROF_INDEX_MARKER: &str = "Index by function name";
