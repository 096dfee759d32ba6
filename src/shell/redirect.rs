use crate::shell::ast::{IoFlags, SimpleCommand, Word};
use crate::shell::context::ShellContext;
use crate::shell::fds::{heighten_fd, redirect_fd};
use crate::shell::word::expand_word;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl StdStream {
    pub fn fd(self) -> RawFd {
        match self {
            StdStream::Stdin => libc::STDIN_FILENO,
            StdStream::Stdout => libc::STDOUT_FILENO,
            StdStream::Stderr => libc::STDERR_FILENO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,     // <
    Truncate, // >
    Append,   // >>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redirection {
    pub stream: StdStream,
    pub path: PathBuf,
    pub mode: OpenMode,
}

impl Redirection {
    fn open(&self) -> Result<File> {
        let mut opts = OpenOptions::new();
        match self.mode {
            OpenMode::Read => {
                opts.read(true);
            }
            OpenMode::Truncate => {
                opts.write(true).create(true).truncate(true);
            }
            OpenMode::Append => {
                opts.append(true).create(true);
            }
        }
        opts.mode(0o644);
        opts.open(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))
    }
}

/// Concrete files and modes for a simple command's redirections, in the
/// order they are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectPlan {
    pub redirections: Vec<Redirection>,
}

impl RedirectPlan {
    /// `execute_cd` resolves every target against `cwd`, the directory that
    /// was current before a pending `cd`. Otherwise targets are used as written.
    pub fn for_command(cmd: &SimpleCommand, ctx: &ShellContext, execute_cd: bool, cwd: &Path) -> Self {
        let target = |word: &Word| -> PathBuf {
            let raw = expand_word(word, ctx);
            if execute_cd { cwd.join(raw) } else { PathBuf::from(raw) }
        };

        let mut redirections = Vec::new();

        if let Some(input) = &cmd.input {
            redirections.push(Redirection {
                stream: StdStream::Stdin,
                path: target(input),
                mode: OpenMode::Read,
            });
        }

        match (&cmd.out, &cmd.err) {
            // Combined form (&>): stdout appends, stderr truncates.
            (Some(out), Some(err)) => {
                redirections.push(Redirection {
                    stream: StdStream::Stdout,
                    path: target(out),
                    mode: OpenMode::Append,
                });
                redirections.push(Redirection {
                    stream: StdStream::Stderr,
                    path: target(err),
                    mode: OpenMode::Truncate,
                });
            }
            (out, err) => {
                if let Some(out) = out {
                    let mode = if cmd.io_flags == IoFlags::OutAppend { OpenMode::Append } else { OpenMode::Truncate };
                    redirections.push(Redirection {
                        stream: StdStream::Stdout,
                        path: target(out),
                        mode,
                    });
                }
                if let Some(err) = err {
                    let mode = if cmd.io_flags == IoFlags::ErrAppend { OpenMode::Append } else { OpenMode::Truncate };
                    redirections.push(Redirection {
                        stream: StdStream::Stderr,
                        path: target(err),
                        mode,
                    });
                }
            }
        }

        Self { redirections }
    }

    /// Opens each target and moves it onto its standard descriptor. The
    /// opened file is closed right after; only the standard descriptor keeps it.
    ///
    /// Repoints the calling process's standard streams, so the caller is
    /// either a forked child or holds a `SavedStdio`.
    pub fn apply(&self) -> Result<()> {
        for r in &self.redirections {
            let file = heighten_fd(OwnedFd::from(r.open()?))
                .with_context(|| format!("Failed to move descriptor for {}", r.path.display()))?;
            redirect_fd(file.as_raw_fd(), r.stream.fd())
                .with_context(|| format!("Failed to redirect descriptor {}", r.stream.fd()))?;
        }
        Ok(())
    }
}
