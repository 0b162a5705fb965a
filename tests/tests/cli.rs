//! Command-line runs over files and standard input.

use std::io::Write;

use metalp_cli::{error_kind, parse_args, run, Cli};
use metalp_extension::default_extensions;
use pretty_assertions::assert_eq;

fn cli(args: &[&str]) -> Cli {
    parse_args(&default_extensions(), std::iter::once("metalp").chain(args.iter().copied()))
        .unwrap()
}

fn program_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", text).unwrap();
    file
}

#[test]
fn test_file_and_stdin_give_the_same_output() {
    let text = "% @base\nedge(1,2).\npath(X,Y) :- edge(X,Y).\n";
    let file = program_file(text);
    let path = file.path().to_str().unwrap().to_string();

    let from_file = run(&cli(&[path.as_str()]), default_extensions(), std::io::empty()).unwrap();
    let from_stdin = run(&cli(&[]), default_extensions(), text.as_bytes()).unwrap();
    assert_eq!(from_file, from_stdin);
    assert!(from_file.contains("output(path(1,2),"));
}

#[test]
fn test_files_are_concatenated_in_order() {
    let first = program_file("a.\n");
    let second = program_file("b :- a.\n");
    let args = [
        "--classic",
        first.path().to_str().unwrap(),
        second.path().to_str().unwrap(),
    ];
    let output = run(&cli(&args), default_extensions(), std::io::empty()).unwrap();
    assert!(output.contains("output(a,"));
    assert!(output.contains("output(b,"));
}

#[test]
fn test_constants_from_the_command_line() {
    let output = run(&cli(&["-c", "n=7"]), default_extensions(), "p(n).".as_bytes()).unwrap();
    assert!(output.contains("output(p(7),"));
}

#[test]
fn test_no_clean_shows_more() {
    let program = "a. b :- a.";
    let clean = run(&cli(&[]), default_extensions(), program.as_bytes()).unwrap();
    let full = run(&cli(&["--no-clean"]), default_extensions(), program.as_bytes()).unwrap();
    assert!(full.lines().count() > clean.lines().count());
}

#[test]
fn test_dump_dir_option() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("dumps");
    let cli = cli(&["--dump-dir", dump.to_str().unwrap()]);
    let output = run(&cli, default_extensions(), "a.".as_bytes()).unwrap();

    let clean = std::fs::read_to_string(dump.join(metalp_pipeline::CLEAN_DUMP)).unwrap();
    assert_eq!(clean, output);
}

#[test]
fn test_error_kinds_are_named() {
    let err = run(&cli(&[]), default_extensions(), "p( .".as_bytes()).unwrap_err();
    assert_eq!(error_kind(&err), "SyntaxError");

    let err = run(&cli(&[]), default_extensions(), "p(X) :- not q(X).".as_bytes()).unwrap_err();
    assert_eq!(error_kind(&err), "GroundingError");
}
