//! Fork/wait bookkeeping and the two concurrent combinators.
//!
//! Every child created here runs a closure against its own copy of the
//! `ShellContext` and leaves through `exit_child`, so nothing it does ever
//! unwinds back into code that belongs to the parent.

use crate::shell::context::ShellContext;
use crate::shell::fds::{heighten_fd, redirect_fd};
use crate::shell::outcome::Outcome;
use anyhow::{Context, Result};
use log::{error, warn};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, pipe};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::panic::{self, AssertUnwindSafe};

/// Terminate a forked child without running destructors or atexit handlers
/// inherited from the parent.
pub fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

/// Fork a child that runs `body` and exits with the resulting outcome.
/// Returns the child's pid in the parent. A panic in `body` exits the child
/// with status 1.
pub fn spawn_child<F>(ctx: &mut ShellContext, body: F) -> Result<Pid>
where
    F: FnOnce(&mut ShellContext) -> Outcome,
{
    // Buffered output would otherwise be written by both processes.
    io::stdout().flush().ok();
    io::stderr().flush().ok();

    match unsafe { fork() }.context("Failed to fork")? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => match panic::catch_unwind(AssertUnwindSafe(|| body(ctx))) {
            Ok(outcome) => exit_child(outcome.exit_code()),
            Err(_) => exit_child(1),
        },
    }
}

/// Block until `pid` terminates.
pub fn wait_for(pid: Pid) -> Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => return Ok(status),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e).with_context(|| format!("Failed to wait for process {}", pid)),
        }
    }
}

/// Wait for `pid` and translate its termination into an outcome.
pub fn wait_outcome(pid: Pid) -> Outcome {
    match wait_for(pid) {
        Ok(status) => Outcome::from_wait_status(status),
        Err(e) => {
            warn!("{:#}", e);
            Outcome::failure()
        }
    }
}

/// Run `left` and `right` in two concurrent children.
///
/// Succeeds when both children terminated through a normal exit, whatever
/// their exit codes were.
pub fn run_parallel<L, R>(ctx: &mut ShellContext, left: L, right: R) -> Outcome
where
    L: FnOnce(&mut ShellContext) -> Outcome,
    R: FnOnce(&mut ShellContext) -> Outcome,
{
    let first = match spawn_child(ctx, left) {
        Ok(pid) => pid,
        Err(e) => {
            warn!("{:#}", e);
            return Outcome::failure();
        }
    };
    let second = match spawn_child(ctx, right) {
        Ok(pid) => pid,
        Err(e) => {
            warn!("{:#}", e);
            wait_for(first).ok();
            return Outcome::failure();
        }
    };

    let statuses = [wait_for(first), wait_for(second)];
    let mut outcome = Outcome::Success;
    for status in statuses {
        match status {
            Ok(WaitStatus::Exited(..)) => {}
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                if outcome.is_success() {
                    outcome = Outcome::Signaled(signal as i32);
                }
            }
            Ok(_) => {
                if outcome.is_success() {
                    outcome = Outcome::failure();
                }
            }
            Err(e) => {
                warn!("{:#}", e);
                if outcome.is_success() {
                    outcome = Outcome::failure();
                }
            }
        }
    }
    outcome
}

/// Connect `left`'s standard output to `right`'s standard input.
///
/// The outcome is the right-hand child's; the left one is only reaped.
pub fn run_pipe<L, R>(ctx: &mut ShellContext, left: L, right: R) -> Outcome
where
    L: FnOnce(&mut ShellContext) -> Outcome,
    R: FnOnce(&mut ShellContext) -> Outcome,
{
    let (reader, writer) = match open_pipe() {
        Ok(ends) => ends,
        Err(e) => {
            warn!("{:#}", e);
            return Outcome::failure();
        }
    };

    let writer_pid = spawn_child(ctx, |ctx| {
        attach_pipe_end(&writer, libc::STDOUT_FILENO, [&reader, &writer]);
        left(ctx)
    });
    let writer_pid = match writer_pid {
        Ok(pid) => pid,
        Err(e) => {
            warn!("{:#}", e);
            return Outcome::failure();
        }
    };

    let reader_pid = spawn_child(ctx, |ctx| {
        attach_pipe_end(&reader, libc::STDIN_FILENO, [&reader, &writer]);
        right(ctx)
    });

    // The reader only sees EOF once every copy of the write end is gone.
    drop(reader);
    drop(writer);

    let reader_pid = match reader_pid {
        Ok(pid) => pid,
        Err(e) => {
            warn!("{:#}", e);
            wait_for(writer_pid).ok();
            return Outcome::failure();
        }
    };

    if let Err(e) = wait_for(writer_pid) {
        warn!("{:#}", e);
    }
    wait_outcome(reader_pid)
}

// Both ends sit above the standard descriptors, so attaching one can never
// land on the other.
fn open_pipe() -> Result<(OwnedFd, OwnedFd)> {
    let (reader, writer) = pipe().context("Failed to create pipe")?;
    let reader = heighten_fd(reader).context("Failed to move pipe reader")?;
    let writer = heighten_fd(writer).context("Failed to move pipe writer")?;
    Ok((reader, writer))
}

// Runs in the child only. The child never returns into the frame owning
// these descriptors, so closing the raw numbers here cannot double-close.
fn attach_pipe_end(end: &OwnedFd, target: i32, both: [&OwnedFd; 2]) {
    if let Err(e) = redirect_fd(end.as_raw_fd(), target) {
        error!("Failed to attach pipe to descriptor {}: {}", target, e);
        exit_child(1);
    }
    for fd in both {
        unsafe { libc::close(fd.as_raw_fd()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::{self, File};
    use std::io::Read;
    use std::os::fd::FromRawFd;

    #[test]
    #[serial]
    fn test_spawn_child_reports_exit_code() {
        let mut ctx = ShellContext::new();
        let pid = spawn_child(&mut ctx, |_| Outcome::Failure(7)).unwrap();
        assert_eq!(wait_outcome(pid), Outcome::Failure(7));
    }

    #[test]
    #[serial]
    fn test_panicking_child_exits_with_failure() {
        let mut ctx = ShellContext::new();
        let pid = spawn_child(&mut ctx, |_| -> Outcome { panic!("child body panicked") }).unwrap();
        assert_eq!(wait_outcome(pid), Outcome::Failure(1));
    }

    #[test]
    #[serial]
    fn test_child_context_is_a_copy() {
        let mut ctx = ShellContext::new();
        ctx.set_var("TREESH_COPY", "parent".to_string());
        let pid = spawn_child(&mut ctx, |ctx| {
            ctx.set_var("TREESH_COPY", "child".to_string());
            Outcome::Success
        })
        .unwrap();
        assert!(wait_outcome(pid).is_success());
        assert_eq!(ctx.var("TREESH_COPY"), Some("parent"));
    }

    #[test]
    #[serial]
    fn test_parallel_ignores_exit_codes() {
        let mut ctx = ShellContext::new();
        let outcome = run_parallel(&mut ctx, |_| Outcome::Failure(3), |_| Outcome::Success);
        assert_eq!(outcome, Outcome::Success);
    }

    #[test]
    #[serial]
    fn test_parallel_reports_signaled_child() {
        let mut ctx = ShellContext::new();
        let outcome = run_parallel(
            &mut ctx,
            |_| Outcome::Success,
            |_| {
                unsafe { libc::raise(libc::SIGKILL) };
                Outcome::Success
            },
        );
        assert_eq!(outcome, Outcome::Signaled(libc::SIGKILL));
    }

    #[test]
    #[serial]
    fn test_pipe_carries_bytes_and_right_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("sink.bin");
        let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();

        let mut ctx = ShellContext::new();
        let outcome = run_pipe(
            &mut ctx,
            |_| {
                let mut out = unsafe { File::from_raw_fd(libc::STDOUT_FILENO) };
                if out.write_all(&payload).is_ok() { Outcome::Success } else { Outcome::failure() }
            },
            |_| {
                let mut input = unsafe { File::from_raw_fd(libc::STDIN_FILENO) };
                let mut buf = Vec::new();
                if input.read_to_end(&mut buf).is_err() {
                    return Outcome::failure();
                }
                fs::write(&sink, &buf).ok();
                Outcome::Failure(4)
            },
        );

        assert_eq!(outcome, Outcome::Failure(4));
        assert_eq!(fs::read(&sink).unwrap(), payload);
    }

    #[test]
    #[serial]
    fn test_pipe_with_standard_streams_closed() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("sink.txt");

        let mut ctx = ShellContext::new();
        let pid = spawn_child(&mut ctx, |ctx| {
            // pipe() now hands back descriptors 0 and 1.
            unsafe {
                libc::close(libc::STDIN_FILENO);
                libc::close(libc::STDOUT_FILENO);
            }
            run_pipe(
                ctx,
                |_| {
                    let msg = b"through";
                    let written = unsafe { libc::write(libc::STDOUT_FILENO, msg.as_ptr().cast(), msg.len()) };
                    if written == msg.len() as isize { Outcome::Success } else { Outcome::Failure(3) }
                },
                |_| {
                    let mut input = unsafe { File::from_raw_fd(libc::STDIN_FILENO) };
                    let mut buf = Vec::new();
                    if input.read_to_end(&mut buf).is_err() {
                        return Outcome::Failure(4);
                    }
                    fs::write(&sink, &buf).ok();
                    Outcome::Success
                },
            )
        })
        .unwrap();

        assert_eq!(wait_outcome(pid), Outcome::Success);
        assert_eq!(fs::read_to_string(&sink).unwrap(), "through");
    }
}
