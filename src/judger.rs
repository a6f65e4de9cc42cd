use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::error::{JudgeError, RuntimeErrorKind};
use crate::escape::decode_line;
use crate::interpreter::Interpreter;
use crate::run::{self, ExitState, Workspace};

pub enum Verdict {
    Pass(Duration),
    Fail(Duration),
    Error(JudgeError),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass(_))
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Pass(time_used) => write!(f, "t{}", time_used.as_secs_f64()),
            Self::Fail(time_used) => write!(f, "f{}", time_used.as_secs_f64()),
            Self::Error(err) => write!(f, "e{}", err.kind()),
        }
    }
}

pub struct JudgeSession {
    source: PathBuf,
    stdin_literal: String,
    expected_literal: String,
    interpreter: Interpreter,
}

impl JudgeSession {
    pub fn new(
        source: PathBuf,
        stdin_literal: String,
        expected_literal: String,
        interpreter: Interpreter
    ) -> Self {
        JudgeSession {
            source,
            stdin_literal,
            expected_literal,
            interpreter
        }
    }

    /// Builds a session from `<source> <stdin> <expected>`; extra arguments are ignored.
    pub fn from_args<I>(args: I) -> Result<Self, JudgeError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args = args.into_iter();
        let source = PathBuf::from(args.next().ok_or(JudgeError::MissingArgument("source file"))?);
        let stdin_literal = utf8_arg(args.next(), "stdin")?;
        let expected_literal = utf8_arg(args.next(), "expected output")?;
        Ok(Self::new(source, stdin_literal, expected_literal, Interpreter::python()))
    }

    /// Runs the program once and classifies it. Every failure becomes `Verdict::Error`.
    pub fn judge(self) -> Verdict {
        match self.run_judge() {
            Ok(verdict) => verdict,
            Err(err) => {
                debug!("judge failed: {err}");
                Verdict::Error(err)
            }
        }
    }

    pub fn run_judge(self) -> Result<Verdict, JudgeError> {
        let source = fs::read(&self.source).map_err(|source| JudgeError::Source {
            path: self.source.clone(),
            source,
        })?;
        let stdin = decode_line(&self.stdin_literal)?;

        let exec = self.interpreter.resolve()?;
        debug!("running {} with {}", self.source.display(), exec.display());

        let mut workspace = Workspace::new(&source, self.interpreter.source_suffix(), &stdin)?;
        let program_args = [
            env!("CARGO_PKG_NAME").to_string(),
            self.source.to_string_lossy().into_owned(),
            self.stdin_literal.clone(),
            self.expected_literal.clone(),
        ];
        let argv = self.interpreter.command(workspace.source_path(), workspace.kind_path(), &program_args);
        let outcome = run::run_program(&exec, &argv, &workspace)?;

        let actual = workspace.read_stdout()?;
        debug!(
            "program finished: {:?} after {:?}, {} bytes of output",
            outcome.exit,
            outcome.elapsed,
            actual.len()
        );

        if !outcome.exit.success() {
            debug!("program diagnostics:\n{}", workspace.read_stderr()?);
            let recorded = workspace.read_kind()?;
            return Err(self.failure(outcome.exit, &recorded));
        }

        let expected = decode_line(&self.expected_literal)?;
        Ok(if compare_content(&actual, &expected) {
            Verdict::Pass(outcome.elapsed)
        } else {
            Verdict::Fail(outcome.elapsed)
        })
    }

    fn failure(&self, exit: ExitState, recorded_kind: &str) -> JudgeError {
        match exit {
            ExitState::Code(code) => match self.interpreter.failure_kind(recorded_kind) {
                Some(name) => JudgeError::Raised(name),
                None => JudgeError::ReturnNonZero(code),
            },
            ExitState::Signal(signal) => match RuntimeErrorKind::from_signal(signal) {
                Some(kind) => JudgeError::RuntimeError(kind),
                None => JudgeError::ReturnNonZero(128 + signal),
            },
        }
    }
}

fn utf8_arg(arg: Option<OsString>, name: &'static str) -> Result<String, JudgeError> {
    arg.ok_or(JudgeError::MissingArgument(name))?
        .into_string()
        .map_err(|_| JudgeError::InvalidArgument(name))
}

/// Exact byte comparison; whitespace and the trailing newline count.
fn compare_content(actual: &[u8], expected: &str) -> bool {
    actual == expected.as_bytes()
}
