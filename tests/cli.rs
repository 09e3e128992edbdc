use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

/// Write `source` to a scratch file unique to `name` and return its path.
fn script(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("quill-cli-{}-{}.ql", name, std::process::id()));
    std::fs::write(&path, source).expect("write script");
    path
}

fn quill(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quill"))
        .args(args)
        .output()
        .expect("run quill binary")
}

fn run_script(name: &str, source: &str) -> Output {
    let path = script(name, source);
    let output = quill(&["run", path.to_str().expect("utf-8 path")]);
    let _ = std::fs::remove_file(&path);
    output
}

#[test]
fn test_runtime_error_is_reported_but_exits_zero() {
    let output = run_script("runtime", "print 1;\nprint 1 / 0;\nprint 2;");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "Division by zero.\n[line 2]\n"
    );
}

#[test]
fn test_syntax_error_exits_65() {
    let output = run_script("syntax", "print (1;");

    assert_eq!(output.status.code(), Some(65));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_filename_fails() {
    for command in ["tokenize", "parse", "check", "translate", "run"] {
        let output = quill(&[command]);

        assert!(!output.status.success(), "{} succeeded", command);
        assert!(
            String::from_utf8_lossy(&output.stderr).contains("No source file given"),
            "{}",
            command
        );
    }
}

#[test]
fn test_unreadable_file_fails() {
    let output = quill(&["run", "/nonexistent/quill/script.ql"]);

    assert_eq!(output.status.code(), Some(1));
}
