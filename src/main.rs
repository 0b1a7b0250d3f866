//! Attack Surface Meter CLI
//!
//! Builds call graphs from cflow, gprof or java-callgraph output and
//! reports the attack surface of the analysed program.

use anyhow::Result;
use attack_surface_meter::call::Granularity;
use attack_surface_meter::commands::{execute_analyze, AnalyzeArgs};
use attack_surface_meter::utils::config::{
    CFLOW_PROGRAM_ENV, DEFAULT_CFLOW_PROGRAM, DEFAULT_PROCESSES, SCHEMA_VERSION,
};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// Attack Surface Meter - call graph based attack surface analysis
#[derive(Parser, Debug)]
#[command(name = "attack-surface-meter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze the attack surface of a call graph
    Analyze {
        /// cflow trace file, or C source directory to run cflow on
        #[arg(short, long)]
        cflow: Option<PathBuf>,

        /// The cflow trace uses the reverse algorithm (cflow -r)
        #[arg(short, long)]
        reverse: bool,

        /// cflow executable used for source directories
        #[arg(long, env = CFLOW_PROGRAM_ENV, default_value = DEFAULT_CFLOW_PROGRAM)]
        cflow_program: String,

        /// gprof call graph profile, or a directory of profiles
        #[arg(short, long)]
        gprof: Option<PathBuf>,

        /// Number of workers used to parse a directory of gprof profiles
        #[arg(short, long, default_value_t = DEFAULT_PROCESSES)]
        processes: usize,

        /// java-callgraph output file
        #[arg(short, long)]
        javacg: Option<PathBuf>,

        /// Package prefixes of the application (java-callgraph only)
        #[arg(short, long, num_args = 1..)]
        app_packages: Vec<String>,

        /// Node granularity of the call graph
        #[arg(long, value_enum, default_value_t = Granularity::Function)]
        granularity: Granularity,

        /// Function names to tag as dangerous
        #[arg(short, long, num_args = 1..)]
        dangerous: Vec<String>,

        /// Report path: `.json` writes JSON, other extensions the text summary
        /// (prints the summary when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include per-node metrics and call lists in the report
        #[arg(long)]
        verbose_report: bool,

        /// Print trace lines that could not be parsed
        #[arg(long)]
        show_errors: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            cflow,
            reverse,
            cflow_program,
            gprof,
            processes,
            javacg,
            app_packages,
            granularity,
            dangerous,
            output,
            verbose_report,
            show_errors,
        } => {
            let args = AnalyzeArgs {
                cflow,
                reverse,
                cflow_program,
                gprof,
                processes,
                javacg,
                app_packages,
                granularity,
                dangerous,
                output,
                verbose_report,
                show_errors,
            };

            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate a report JSON file
///
/// **Private** - internal command implementation
fn validate_report_file(file_path: PathBuf) -> Result<()> {
    use attack_surface_meter::output::read_report;

    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Nodes: {}", report.summary.nodes_count);
    println!("  Edges: {}", report.summary.edges_count);
    println!("  Entry Points: {}", report.summary.entry_points_count);
    println!("  Exit Points: {}", report.summary.exit_points_count);
    println!("  Verbose: {}", report.details.is_some());

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Attack Surface Meter v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Attack surface metrics over cflow, gprof and java-callgraph call graphs.");
}
