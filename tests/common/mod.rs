use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    /// Writes a program source into the fixture directory.
    pub fn program(&self, name: &str, source: &str) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, source).expect("write program source");
        path
    }

    pub fn missing(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("mini-judge");
        cmd.current_dir(self.tmp.path()).env_remove("RUST_LOG");
        cmd
    }

    pub fn judge(&self, source: &PathBuf, stdin: &str, expected: &str) -> String {
        let out = self
            .cmd()
            .arg(source)
            .arg(stdin)
            .arg(expected)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).expect("verdict is utf8")
    }
}

/// Tests that execute real programs need a Python 3 interpreter.
pub fn python_available() -> bool {
    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("python3").is_file()))
        .unwrap_or(false);
    if !found {
        eprintln!("python3 not on PATH; skipping");
    }
    found
}

/// Splits `t0.0123\n` into its tag and the parsed duration.
pub fn timed_verdict(line: &str) -> (char, f64) {
    let line = line.strip_suffix('\n').expect("verdict ends with newline");
    assert!(!line.contains('\n'), "exactly one verdict line: {line:?}");
    let mut chars = line.chars();
    let tag = chars.next().expect("verdict tag");
    let seconds: f64 = chars.as_str().parse().expect("duration is a float");
    (tag, seconds)
}
