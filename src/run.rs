use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;

use crate::error::JudgeError;

/// Private files backing one run: the source copy, the stdin payload, the
/// two capture sinks and the file the interpreter names a raised exception
/// in. Everything is removed when the workspace drops.
pub struct Workspace {
    source: NamedTempFile,
    kind: NamedTempFile,
    stdin: File,
    stdout: File,
    stderr: File,
}

impl Workspace {
    pub fn new(source: &[u8], source_suffix: &str, stdin: &str) -> io::Result<Self> {
        let mut source_file = tempfile::Builder::new()
            .prefix("solution")
            .suffix(source_suffix)
            .tempfile()?;
        source_file.write_all(source)?;
        source_file.flush()?;

        let mut stdin_file = tempfile::tempfile()?;
        stdin_file.write_all(stdin.as_bytes())?;
        stdin_file.seek(SeekFrom::Start(0))?;

        Ok(Workspace {
            source: source_file,
            kind: NamedTempFile::new()?,
            stdin: stdin_file,
            stdout: tempfile::tempfile()?,
            stderr: tempfile::tempfile()?,
        })
    }

    pub fn source_path(&self) -> &Path {
        self.source.path()
    }

    pub fn kind_path(&self) -> &Path {
        self.kind.path()
    }

    pub fn read_kind(&mut self) -> io::Result<String> {
        let bytes = read_all(self.kind.as_file_mut())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn read_stdout(&mut self) -> io::Result<Vec<u8>> {
        read_all(&mut self.stdout)
    }

    pub fn read_stderr(&mut self) -> io::Result<String> {
        let bytes = read_all(&mut self.stderr)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn read_all(file: &mut File) -> io::Result<Vec<u8>> {
    let mut content = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut content)?;
    Ok(content)
}

/// Holds the process's standard descriptors pointed at other files and
/// puts the real ones back when dropped.
pub struct StdioRedirect {
    saved: Vec<(RawFd, OwnedFd)>,
}

impl StdioRedirect {
    pub fn new(targets: &[(RawFd, &File)]) -> io::Result<Self> {
        io::stdout().flush()?;
        io::stderr().flush()?;

        let mut redirect = StdioRedirect { saved: Vec::with_capacity(targets.len()) };
        for &(target, file) in targets {
            let saved = dup_cloexec(target)?;
            redirect.saved.push((target, saved));
            if unsafe { libc::dup2(file.as_raw_fd(), target) } < 0 {
                // Already-swapped descriptors are restored by `redirect`'s drop.
                return Err(io::Error::last_os_error());
            }
        }
        Ok(redirect)
    }
}

impl Drop for StdioRedirect {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        for (target, saved) in self.saved.drain(..).rev() {
            unsafe {
                libc::dup2(saved.as_raw_fd(), target);
            }
        }
    }
}

fn dup_cloexec(fd: RawFd) -> io::Result<OwnedFd> {
    let copy = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if copy < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(copy) })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Code(i32),
    Signal(i32),
}

impl ExitState {
    fn from_wait_status(status: i32) -> Self {
        if libc::WIFSIGNALED(status) {
            ExitState::Signal(libc::WTERMSIG(status))
        } else {
            ExitState::Code(libc::WEXITSTATUS(status))
        }
    }

    pub fn success(&self) -> bool {
        *self == ExitState::Code(0)
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub exit: ExitState,
    pub elapsed: Duration,
}

fn fork() -> Result<i32, io::Error> {
    let pid: i32;
    unsafe {
        pid = libc::fork();
    }
    if pid < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(pid)
}

fn waitpid(pid: i32) -> io::Result<i32> {
    let mut status: i32 = 0;
    loop {
        let ret = unsafe { libc::waitpid(pid, &mut status, 0) };
        if ret == pid {
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

fn c_string(text: &str) -> Result<CString, JudgeError> {
    CString::new(text).map_err(|e| JudgeError::Launch(io::Error::new(io::ErrorKind::InvalidInput, e)))
}

/// Runs `exec` with `argv` while the judge's stdin, stdout and stderr point
/// into `workspace`. The clock covers fork to reap.
pub fn run_program(exec: &Path, argv: &[String], workspace: &Workspace) -> Result<RunOutcome, JudgeError> {
    let exec_c = c_string(&exec.to_string_lossy())?;
    let argv_c = argv.iter().map(|arg| c_string(arg)).collect::<Result<Vec<_>, _>>()?;
    let mut argv_ptrs: Vec<*const libc::c_char> = argv_c.iter().map(|arg| arg.as_ptr()).collect();
    argv_ptrs.push(std::ptr::null());

    let redirect = StdioRedirect::new(&[
        (libc::STDIN_FILENO, &workspace.stdin),
        (libc::STDOUT_FILENO, &workspace.stdout),
        (libc::STDERR_FILENO, &workspace.stderr),
    ])?;

    let begin_instant = Instant::now();
    let pid = fork().map_err(JudgeError::Launch)?;
    if pid == 0 {
        // Sub process
        unsafe {
            libc::execv(exec_c.as_ptr(), argv_ptrs.as_ptr());
            libc::perror(c"execv".as_ptr());
            libc::_exit(127);
        }
    }
    let status = waitpid(pid).map_err(JudgeError::Launch)?;
    let elapsed = begin_instant.elapsed();
    drop(redirect);

    Ok(RunOutcome { exit: ExitState::from_wait_status(status), elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    fn fd_identity(fd: RawFd) -> (u64, u64) {
        let copy = dup_cloexec(fd).unwrap();
        let meta = File::from(copy).metadata().unwrap();
        (meta.dev(), meta.ino())
    }

    #[test]
    fn redirect_is_undone_on_drop() {
        // A private descriptor stands in for a standard stream so the test
        // harness output is left alone.
        let stream = tempfile::tempfile().unwrap();
        let sink = tempfile::tempfile().unwrap();
        let target = stream.as_raw_fd();
        let before = fd_identity(target);
        let sink_identity = fd_identity(sink.as_raw_fd());
        assert_ne!(before, sink_identity);

        {
            let _redirect = StdioRedirect::new(&[(target, &sink)]).unwrap();
            assert_eq!(fd_identity(target), sink_identity);
        }
        assert_eq!(fd_identity(target), before);
    }

    #[test]
    fn redirect_is_undone_when_the_body_panics() {
        let stream = tempfile::tempfile().unwrap();
        let sink = tempfile::tempfile().unwrap();
        let target = stream.as_raw_fd();
        let before = fd_identity(target);

        let result = std::panic::catch_unwind(|| {
            let _redirect = StdioRedirect::new(&[(target, &sink)]).unwrap();
            panic!("program blew up");
        });
        assert!(result.is_err());
        assert_eq!(fd_identity(target), before);
    }

    #[test]
    fn workspace_round_trips_payloads() {
        let mut workspace = Workspace::new(b"print(1)\n", ".py", "1\n2\n").unwrap();
        assert!(workspace.source_path().to_string_lossy().ends_with(".py"));
        assert_eq!(std::fs::read(workspace.source_path()).unwrap(), b"print(1)\n");

        let mut stdin = String::new();
        workspace.stdin.read_to_string(&mut stdin).unwrap();
        assert_eq!(stdin, "1\n2\n");

        workspace.stdout.write_all(b"captured").unwrap();
        assert_eq!(workspace.read_stdout().unwrap(), b"captured");
        assert_eq!(workspace.read_stderr().unwrap(), "");

        assert_eq!(workspace.read_kind().unwrap(), "");
        std::fs::write(workspace.kind_path(), "ValueError").unwrap();
        assert_eq!(workspace.read_kind().unwrap(), "ValueError");
    }

    #[test]
    fn exit_state_decoding() {
        assert!(ExitState::Code(0).success());
        assert!(!ExitState::Code(1).success());
        assert!(!ExitState::Signal(libc::SIGSEGV).success());
    }
}
