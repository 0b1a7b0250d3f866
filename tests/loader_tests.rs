use attack_surface_meter::call::{Call, CallKey, Granularity};
use attack_surface_meter::graph::{CallGraph, GraphBuilder};
use attack_surface_meter::loaders::{
    CflowLoader, GprofLoader, JavaCgLoader, LoadOutput, Loader, MultiGprofLoader,
};
use attack_surface_meter::utils::LoadError;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const CFLOW_TRACE: &str = "\
main() <int main (int argc, char **argv) at main.c:10>:
    parse_args() <void parse_args (int argc, char **argv) at args.c:5>:
        getopt()
    run() <int run (void) at main.c:30>:
        read_input() <char *read_input (void) at io.c:12>:
            fgets()
        emit() <void emit (const char *s) at io.c:40>:
            fputs()
";

const CFLOW_REVERSE_TRACE: &str = "\
fgets():
    read_input() <char *read_input (void) at io.c:12>:
        run() <int run (void) at main.c:30>:
            main() <int main (int argc, char **argv) at main.c:10>
fputs():
    emit() <void emit (const char *s) at io.c:40>:
        run() <int run (void) at main.c:30>:
            main() <int main (int argc, char **argv) at main.c:10>
";

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn node_keys(builder: &GraphBuilder) -> Vec<CallKey> {
    let mut keys: Vec<CallKey> = builder.calls().map(Call::identity).collect();
    keys.sort();
    keys
}

fn edge_keys(builder: &GraphBuilder) -> Vec<(CallKey, CallKey)> {
    let mut keys: Vec<(CallKey, CallKey)> = builder
        .edges()
        .map(|(a, b)| (a.identity(), b.identity()))
        .collect();
    keys.sort();
    keys
}

fn profile(blocks: &[(&str, &str)]) -> String {
    let mut text = String::from("index % time    self  children    called     name\n");
    for (i, (primary, callees)) in blocks.iter().enumerate() {
        text.push_str(&format!(
            "[{}]    50.0    0.01    0.02       1         {} [{}]\n",
            i + 1,
            primary,
            i + 1
        ));
        for callee in callees.split_whitespace() {
            text.push_str(&format!(
                "                0.01    0.00       1/1           {} [{}]\n",
                callee,
                i + 100
            ));
        }
        text.push_str("-----------------------------------------------\n");
    }
    text
}

#[test]
fn test_cflow_forward_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "cflow.txt", CFLOW_TRACE);

    let output = CflowLoader::new(&path).load().unwrap();

    assert_eq!(output.graph.node_count(), 8);
    assert_eq!(output.graph.edge_count(), 7);
    assert!(output.graph.contains_edge(
        &Call::new("main", "main.c"),
        &Call::new("parse_args", "args.c")
    ));
    assert!(output
        .graph
        .contains_edge(&Call::new("emit", "io.c"), &Call::new("fputs", "")));
    assert!(!output
        .graph
        .contains_edge(&Call::new("parse_args", "args.c"), &Call::new("run", "main.c")));
}

#[test]
fn test_cflow_reverse_keeps_caller_to_callee() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "cflow_r.txt", CFLOW_REVERSE_TRACE);

    let output = CflowLoader::new(&path).reverse(true).load().unwrap();

    assert!(output.graph.contains_edge(
        &Call::new("read_input", "io.c"),
        &Call::new("fgets", "")
    ));
    assert!(output.graph.contains_edge(
        &Call::new("main", "main.c"),
        &Call::new("run", "main.c")
    ));
    assert!(output
        .graph
        .contains_edge(&Call::new("run", "main.c"), &Call::new("emit", "io.c")));
    assert_eq!(output.graph.edge_count(), 5);
}

#[test]
fn test_cflow_malformed_lines_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "broken.txt",
        "main()\n    {garbage}\n    gets()\n\n    puts()\n",
    );

    let graph = CallGraph::from_loader(&CflowLoader::new(&path), Granularity::Function).unwrap();

    assert_eq!(graph.load_errors().len(), 1);
    assert_eq!(graph.load_errors()[0].line_number, 2);
    assert_eq!(graph.node_count(), 3);
    assert!(graph.is_entry_point(&Call::new("main", "")));
    assert!(graph.is_exit_point(&Call::new("main", "")));
}

#[test]
fn test_cflow_file_granularity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "cflow.txt", CFLOW_TRACE);

    let graph = CallGraph::from_loader(&CflowLoader::new(&path), Granularity::File).unwrap();

    assert!(graph.contains(&Call::new("main.c", "")));
    assert!(graph.contains(&Call::new("io.c", "")));
    assert!(graph.contains(&Call::new("fgets", "")));
    assert!(graph.contains_edge(&Call::new("main.c", ""), &Call::new("args.c", "")));
    assert!(!graph.contains_edge(&Call::new("main.c", ""), &Call::new("main.c", "")));
    assert!(graph.is_entry_point(&Call::new("io.c", "")));
}

#[test]
fn test_cflow_missing_program_is_subprocess_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "main.c", "int main(void) { return 0; }\n");

    let loader = CflowLoader::new(dir.path()).program("definitely-not-a-cflow-binary");

    assert!(matches!(loader.load(), Err(LoadError::SubprocessFailure(_))));
}

#[test]
fn test_missing_sources() {
    let missing = PathBuf::from("/no/such/trace");
    assert!(matches!(
        CflowLoader::new(&missing).load(),
        Err(LoadError::SourceNotFound(_))
    ));
    assert!(matches!(
        GprofLoader::new(&missing).load(),
        Err(LoadError::SourceNotFound(_))
    ));
    assert!(matches!(
        JavaCgLoader::new(&missing, Vec::new()).load(),
        Err(LoadError::SourceNotFound(_))
    ));
    assert!(matches!(
        MultiGprofLoader::from_directory(&missing, 2),
        Err(LoadError::SourceNotFound(_))
    ));
}

#[test]
fn test_gprof_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "gmon.txt",
        &profile(&[("main", "handle recv"), ("handle", "send")]),
    );

    let graph = CallGraph::from_loader(&GprofLoader::new(&path), Granularity::Function).unwrap();

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 3);
    assert!(graph.is_entry_point(&Call::new("main", "")));
    assert!(graph.is_exit_point(&Call::new("handle", "")));
}

#[test]
fn test_multigprof_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write_file(
            dir.path(),
            "gmon.1.txt",
            &profile(&[("main", "parse recv"), ("parse", "atoi")]),
        ),
        write_file(
            dir.path(),
            "gmon.2.txt",
            &profile(&[("main", "serve"), ("serve", "send parse")]),
        ),
        write_file(
            dir.path(),
            "gmon.3.txt",
            &profile(&[("serve", "log"), ("log", "fprintf")]),
        ),
    ];

    let parallel = MultiGprofLoader::new(files.clone(), 2).load().unwrap();

    for order in [[0, 1, 2], [2, 1, 0], [1, 2, 0]] {
        let mut sequential = LoadOutput::default();
        for i in order {
            sequential.merge(GprofLoader::new(&files[i]).load().unwrap());
        }
        assert_eq!(node_keys(&parallel.graph), node_keys(&sequential.graph));
        assert_eq!(edge_keys(&parallel.graph), edge_keys(&sequential.graph));
    }

    assert_eq!(parallel.graph.node_count(), 8);
    assert_eq!(parallel.graph.edge_count(), 8);
}

#[test]
fn test_multigprof_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", &profile(&[("main", "a")]));
    write_file(dir.path(), "b.txt", &profile(&[("main", "b")]));

    let loader = MultiGprofLoader::from_directory(dir.path(), 2).unwrap();
    let graph = CallGraph::from_loader(&loader, Granularity::Function).unwrap();

    assert_eq!(loader.sources().len(), 2);
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn test_javacg_package_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "javacg.txt",
        "C:com.shop.Cart com.shop.Db\n\
         M:com.shop.Cart:checkout() (M)com.shop.Db:save(com.shop.Order)\n\
         M:com.shop.Db:save(com.shop.Order) (I)java.sql.Statement:execute(java.lang.String)\n\
         M:com.shop.Cart:checkout() (S)com.shop.Log:info(java.lang.String)\n",
    );

    let all = JavaCgLoader::new(&path, Vec::new()).load().unwrap();
    assert_eq!(all.graph.edge_count(), 3);

    let scoped = JavaCgLoader::new(&path, vec!["com.shop".to_string()])
        .load()
        .unwrap();
    assert_eq!(scoped.graph.edge_count(), 2);
    assert!(!scoped
        .graph
        .calls()
        .any(|c| c.function_signature().starts_with("java.sql")));
}
