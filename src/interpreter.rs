use std::path::{Path, PathBuf};

use crate::error::JudgeError;
use crate::utils;

/// Names the judged program can use without importing them. The class name
/// of an escaping `Exception` is written to the kind file before re-raising;
/// the program itself sees `sys.argv` as `[judge, source, stdin, expected]`.
const PYTHON_PRELUDE: &str = "\
import sys
import io as _judge_io
from io import StringIO
from timeit import default_timer as timer
_judge_source, _judge_kind = sys.argv[1], sys.argv[2]
sys.argv = sys.argv[3:]
try:
    exec(compile(open(_judge_source, 'rb').read(), _judge_source, 'exec'))
except Exception as _judge_error:
    with _judge_io.open(_judge_kind, 'w', encoding='utf-8') as _judge_out:
        _judge_out.write(type(_judge_error).__name__)
    raise
";

/// How the judged source gets executed.
#[derive(Debug, Clone)]
pub struct Interpreter {
    name: &'static str,
    flags: &'static [&'static str],
    prelude: &'static str,
    source_suffix: &'static str,
}

impl Interpreter {
    pub fn python() -> Self {
        Interpreter {
            name: "python3",
            flags: &["-B", "-X", "utf8"],
            prelude: PYTHON_PRELUDE,
            source_suffix: ".py",
        }
    }

    pub fn source_suffix(&self) -> &'static str {
        self.source_suffix
    }

    pub fn resolve(&self) -> Result<PathBuf, JudgeError> {
        utils::find_path(self.name).ok_or_else(|| JudgeError::InterpreterNotFound(self.name.to_string()))
    }

    /// Full argument vector, `argv[0]` included. `program_args` become the
    /// judged program's own `sys.argv`.
    pub fn command(&self, source: &Path, kind: &Path, program_args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.flags.len() + program_args.len() + 5);
        argv.push(self.name.to_string());
        argv.extend(self.flags.iter().map(|flag| flag.to_string()));
        argv.push("-c".to_string());
        argv.push(self.prelude.to_string());
        argv.push(source.to_string_lossy().to_string());
        argv.push(kind.to_string_lossy().to_string());
        argv.extend(program_args.iter().cloned());
        argv
    }

    /// Exception class name recorded by the prelude, if the program raised one.
    pub fn failure_kind(&self, recorded: &str) -> Option<String> {
        let name = recorded.trim();
        is_identifier(name).then(|| name.to_string())
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}
