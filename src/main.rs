mod error;
mod escape;
mod interpreter;
mod judger;
mod run;
mod utils;

use std::env;
use std::io::{self, Write};

use anyhow::Result;
use judger::{JudgeSession, Verdict};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let mut args = env::args_os();
    let program = args
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mini-judge".to_string());

    let verdict = match JudgeSession::from_args(args) {
        Ok(session) => session.judge(),
        Err(e) => {
            log::error!("{e}");
            log::error!("Usage: {program} <source file> <stdin literal> <expected output literal>");
            Verdict::Error(e)
        }
    };
    log::debug!("verdict: {verdict} (passed: {})", verdict.passed());

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{verdict}")?;
    stdout.flush()?;
    Ok(())
}
