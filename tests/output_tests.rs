use attack_surface_meter::call::Granularity;
use attack_surface_meter::commands::{build_call_graph, execute_analyze, AnalyzeArgs};
use attack_surface_meter::graph::CallGraph;
use attack_surface_meter::loaders::CflowLoader;
use attack_surface_meter::output::{build_report, read_report, render_summary, write_report};
use attack_surface_meter::utils::config::SCHEMA_VERSION;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

const TRACE: &str = "\
main() <int main (void) at main.c:3>:
    login() <int login (void) at auth.c:10>:
        gets()
        strcpy()
        check() <int check (const char *p) at auth.c:30>:
            strcmp()
    report() <void report (int ok) at main.c:20>:
        printf()
";

fn trace_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("cflow.txt");
    std::fs::write(&path, TRACE).unwrap();
    path
}

#[test]
fn test_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = trace_file(&dir);

    let mut graph =
        CallGraph::from_loader(&CflowLoader::new(&path), Granularity::Function).unwrap();
    graph.mark_dangerous(&["strcpy", "gets"]);

    let report = build_report(&graph, true).unwrap();
    let output = dir.path().join("out/report.json");
    write_report(&report, &output).unwrap();

    let loaded = read_report(&output).unwrap();
    assert_eq!(loaded.source, report.source);
    assert_eq!(loaded.summary.nodes_count, report.summary.nodes_count);
    assert_eq!(loaded.version, SCHEMA_VERSION);
    assert_eq!(loaded.summary.nodes_count, 8);
    assert_eq!(loaded.summary.edges_count, 7);
    assert_eq!(loaded.summary.entry_points_count, 1);
    assert_eq!(loaded.summary.exit_points_count, 1);
    assert_eq!(loaded.summary.dangerous_functions_count, 2);
    // login cannot reach report
    assert_eq!(loaded.summary.execution_paths_count, 0);
    let details = loaded.details.unwrap();
    assert_eq!(details.nodes.len(), 8);
    assert_eq!(details.dangerous_functions.len(), 2);
}

#[test]
fn test_summary_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = trace_file(&dir);
    let args = AnalyzeArgs {
        cflow: Some(path),
        ..Default::default()
    };

    let graph = build_call_graph(&args).unwrap();
    let text = render_summary(&build_report(&graph, false).unwrap());

    assert!(text.contains("Nodes:               8"));
    assert!(text.contains("Entry Points:        1"));
    assert!(text.contains("Avg Path Length:     n/a"));
}

#[test]
fn test_analyze_file_granularity_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = trace_file(&dir);
    let output = dir.path().join("files.json");
    let args = AnalyzeArgs {
        cflow: Some(path),
        granularity: Granularity::File,
        output: Some(output.clone()),
        verbose_report: true,
        ..Default::default()
    };

    execute_analyze(args).unwrap();

    let report = read_report(&output).unwrap();
    let details = report.details.unwrap();
    let mut names: Vec<&str> = details
        .nodes
        .iter()
        .map(|n| n.call.function_name.as_str())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["auth.c", "gets", "main.c", "printf", "strcmp", "strcpy"]
    );
    assert_eq!(details.entry_points.len(), 1);
    assert_eq!(details.entry_points[0].function_name, "auth.c");
    assert_eq!(details.exit_points[0].function_name, "main.c");
}
