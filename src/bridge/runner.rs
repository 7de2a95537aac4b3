//! Blocking child-process runner: spawn, relay output, wait, cancel.

use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bridge::output::OutputSink;

/// A cancellation flag shared between the caller and a running solver.
///
/// Cancelling while a run is in progress kills the child process and, on unix,
/// every process in its group; the run then returns `KwaveError::Cancelled`.
/// A token stays cancelled once set.
///
/// On unix the solver runs in its own process group, so a terminal Ctrl-C
/// only reaches the caller. Applications that want Ctrl-C to stop the solver
/// should cancel the token from their signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Exited(ExitStatus),
    /// The token was cancelled and the child was killed.
    Cancelled,
}

/// Runs `program` with `args`, relaying its stdout and stderr line by line to
/// `sink` while it runs, and blocks until it exits or `cancel` is set.
pub fn run_process(
    program: &Path,
    args: &[&std::ffi::OsStr],
    sink: Arc<dyn OutputSink>,
    cancel: &CancelToken,
    poll_interval: Duration,
) -> io::Result<ProcessOutcome> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // The solver leads its own process group, so a cancel reaches every
    // process it starts, not just the direct child.
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut command, 0);
    let mut child = command.spawn()?;

    let readers = [
        child.stdout.take().map(|s| relay("kwave-stdout", s, Arc::clone(&sink))),
        child.stderr.take().map(|s| relay("kwave-stderr", s, Arc::clone(&sink))),
    ];

    let outcome = wait_or_cancel(&mut child, cancel, poll_interval);

    for reader in readers.into_iter().flatten() {
        // A panicking sink loses the rest of its stream, nothing more.
        let _ = reader?.join();
    }
    sink.finish();

    outcome
}

fn wait_or_cancel(
    child: &mut Child,
    cancel: &CancelToken,
    poll_interval: Duration,
) -> io::Result<ProcessOutcome> {
    loop {
        if cancel.is_cancelled() {
            log::warn!("Cancellation requested, killing solver process group {}", child.id());
            kill_tree(child);
            child.wait()?;
            return Ok(ProcessOutcome::Cancelled);
        }
        if let Some(status) = child.try_wait()? {
            return Ok(ProcessOutcome::Exited(status));
        }
        thread::sleep(poll_interval);
    }
}

/// Kills the child and everything in its process group. The relay threads
/// only see end-of-stream once every holder of the pipes is gone.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions; a negative pid
    // addresses the process group led by the child.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        log::debug!(
            "killpg({}) failed: {}",
            pgid,
            io::Error::last_os_error()
        );
        // Fails only if the child already exited, which is fine here.
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Spawns a thread that forwards every line of `stream` to `sink`.
/// Invalid UTF-8 is replaced rather than ending the relay.
fn relay<R>(name: &str, stream: R, sink: Arc<dyn OutputSink>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(move || {
        for line in BufReader::new(stream).split(b'\n') {
            let Ok(line) = line else {
                break;
            };
            let text = String::from_utf8_lossy(&line);
            sink.process_line(text.trim_end_matches('\r'));
        }
    })
}
