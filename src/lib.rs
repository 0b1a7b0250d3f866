//! Attack Surface Meter
//!
//! Attack surface metrics for software systems, computed over the call
//! graphs produced by GNU cflow, GNU gprof and java-callgraph.
//!
//! This crate provides the core implementation for the
//! `attack-surface-meter` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! attack-surface-meter analyze --cflow src/ --dangerous strcpy gets
//! attack-surface-meter analyze --gprof profiles/ -p 4 --output report.json
//! ```
//!
//! ## Library use
//!
//! ```ignore
//! use attack_surface_meter::call::Granularity;
//! use attack_surface_meter::graph::CallGraph;
//! use attack_surface_meter::loaders::CflowLoader;
//!
//! let graph = CallGraph::from_loader(&CflowLoader::new("cflow.txt"), Granularity::Function)?;
//! for entry in graph.entry_points() {
//!     println!("{}", entry);
//! }
//! ```

pub mod call;
pub mod commands;
pub mod graph;
pub mod loaders;
pub mod output;
pub mod utils;
