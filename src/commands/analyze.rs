//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Selects loaders from the given trace sources
//! 2. Builds the call graph (merging cflow and gprof graphs when both are given)
//! 3. Tags dangerous functions
//! 4. Builds the attack surface report
//! 5. Writes the report (format from the file extension) or prints a summary

use crate::call::Granularity;
use crate::graph::CallGraph;
use crate::loaders::{CflowLoader, GprofLoader, JavaCgLoader, Loader, MultiGprofLoader};
use crate::output::{build_report, render_parse_errors, render_summary, OutputFormat};
use crate::utils::config::{DEFAULT_CFLOW_PROGRAM, DEFAULT_PROCESSES};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// cflow trace file or C source directory
    pub cflow: Option<PathBuf>,

    /// The cflow trace was generated with the reverse algorithm
    pub reverse: bool,

    /// cflow executable used for source directories
    pub cflow_program: String,

    /// gprof profile, or a directory of profiles
    pub gprof: Option<PathBuf>,

    /// Worker pool size for a directory of gprof profiles
    pub processes: usize,

    /// java-callgraph output file
    pub javacg: Option<PathBuf>,

    /// Package prefixes that scope a java-callgraph graph
    pub app_packages: Vec<String>,

    pub granularity: Granularity,

    /// Function names to tag as dangerous
    pub dangerous: Vec<String>,

    /// Report path; `.json` selects JSON, anything else the text summary
    /// (None = print summary)
    pub output: Option<PathBuf>,

    /// Include per-node metrics in the report
    pub verbose_report: bool,

    /// Print parse errors recorded while loading
    pub show_errors: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            cflow: None,
            reverse: false,
            cflow_program: DEFAULT_CFLOW_PROGRAM.to_string(),
            gprof: None,
            processes: DEFAULT_PROCESSES,
            javacg: None,
            app_packages: Vec::new(),
            granularity: Granularity::Function,
            dangerous: Vec::new(),
            output: None,
            verbose_report: false,
            show_errors: false,
        }
    }
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Invalid argument combinations
/// * Missing sources or failed cflow runs
/// * Report write failures
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    validate_args(&args)?;

    info!("Step 1/3: Building call graph...");
    let mut call_graph = build_call_graph(&args)?;

    if !args.dangerous.is_empty() {
        let tagged = call_graph.mark_dangerous(&args.dangerous);
        info!(
            "Tagged {} calls matching {} dangerous function names",
            tagged,
            args.dangerous.len()
        );
    }

    info!("Step 2/3: Computing attack surface metrics...");
    let report = build_report(&call_graph, args.verbose_report)
        .context("Failed to compute attack surface metrics")?;

    info!("Step 3/3: Writing output...");
    match &args.output {
        Some(path) => {
            let output_format = OutputFormat::from_path(path);
            output_format
                .write(&report, path)
                .with_context(|| format!("Failed to write {:?} report", output_format))?;
            info!("✓ Report written to: {}", path.display());
        }
        None => print!("{}", render_summary(&report)),
    }

    if !report.parse_errors.is_empty() {
        if args.show_errors {
            println!("\nPARSE ERRORS ({})", report.parse_errors.len());
            print!("{}", render_parse_errors(&report));
        } else {
            warn!(
                "{} trace lines could not be parsed (use --show-errors to list them)",
                report.parse_errors.len()
            );
        }
    }

    info!(
        "Analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Build the call graph the arguments describe
///
/// **Public** - also used by integration tests
///
/// A java-callgraph source is used alone. cflow and gprof sources may be
/// combined, in which case the two graphs are merged.
pub fn build_call_graph(args: &AnalyzeArgs) -> Result<CallGraph> {
    if let Some(path) = &args.javacg {
        let loader = JavaCgLoader::new(path, args.app_packages.clone());
        return load(&loader, args.granularity);
    }

    let cflow_graph = match &args.cflow {
        Some(path) => {
            let loader = CflowLoader::new(path)
                .reverse(args.reverse)
                .program(args.cflow_program.as_str());
            Some(load(&loader, args.granularity)?)
        }
        None => None,
    };

    let gprof_graph = match &args.gprof {
        Some(path) if path.is_dir() => {
            let loader = MultiGprofLoader::from_directory(path, args.processes)
                .with_context(|| format!("Failed to list gprof profiles in {}", path.display()))?;
            Some(load(&loader, args.granularity)?)
        }
        Some(path) => Some(load(&GprofLoader::new(path), args.granularity)?),
        None => None,
    };

    match (cflow_graph, gprof_graph) {
        (Some(cflow), Some(gprof)) => {
            debug!("Merging cflow and gprof call graphs");
            Ok(CallGraph::from_merge(&cflow, &gprof))
        }
        (Some(graph), None) | (None, Some(graph)) => Ok(graph),
        (None, None) => anyhow::bail!("No call graph source given"),
    }
}

/// **Private** - run one loader with error context
fn load(loader: &dyn Loader, granularity: Granularity) -> Result<CallGraph> {
    CallGraph::from_loader(loader, granularity)
        .with_context(|| format!("Failed to load call graph from {}", loader.source()))
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.cflow.is_none() && args.gprof.is_none() && args.javacg.is_none() {
        anyhow::bail!("At least one of --cflow, --gprof or --javacg is required");
    }

    if args.javacg.is_some() && (args.cflow.is_some() || args.gprof.is_some()) {
        anyhow::bail!("--javacg cannot be combined with --cflow or --gprof");
    }

    if args.reverse && args.cflow.is_none() {
        anyhow::bail!("--reverse requires --cflow");
    }

    if !args.app_packages.is_empty() && args.javacg.is_none() {
        anyhow::bail!("--app-packages requires --javacg");
    }

    if args.processes == 0 {
        anyhow::bail!("processes must be greater than 0");
    }

    if args.cflow_program.trim().is_empty() {
        anyhow::bail!("cflow program cannot be empty");
    }

    for path in [&args.cflow, &args.gprof, &args.javacg].into_iter().flatten() {
        if !path.exists() {
            anyhow::bail!("{} not found", path.display());
        }
    }

    Ok(())
}
