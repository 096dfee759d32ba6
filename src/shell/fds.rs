use anyhow::{Context, Result};
use log::error;
use nix::fcntl::{FcntlArg, fcntl};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

/// Saved duplicates and freshly opened files live at or above this
/// descriptor, out of the range a redirection ever targets.
pub const FIRST_HIGH_FD: RawFd = 10;

pub const STANDARD_FDS: [RawFd; 3] = [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO];

/// Duplicate `fd` above FIRST_HIGH_FD with close-on-exec set.
pub fn dup_high<Fd: AsFd>(fd: Fd) -> nix::Result<OwnedFd> {
    let newfd = fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(FIRST_HIGH_FD))?;
    Ok(unsafe { OwnedFd::from_raw_fd(newfd) })
}

/// Move `fd` out of the standard range if it landed there.
///
/// With a standard stream closed, `open` or `pipe` hands that number back;
/// redirecting onto it and then closing the original would close the stream.
pub fn heighten_fd(fd: OwnedFd) -> nix::Result<OwnedFd> {
    if fd.as_raw_fd() >= FIRST_HIGH_FD {
        return Ok(fd);
    }
    dup_high(&fd)
}

/// Point `target` at the open file description behind `src`.
pub fn redirect_fd(src: RawFd, target: RawFd) -> io::Result<()> {
    loop {
        if unsafe { libc::dup2(src, target) } >= 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Copies of the three standard descriptors, put back when dropped.
///
/// Anything that repoints a standard stream in the shell process itself
/// (rather than in a forked child) must hold one of these for the duration.
pub struct SavedStdio {
    saved: Vec<(RawFd, OwnedFd)>,
}

impl SavedStdio {
    pub fn save() -> Result<Self> {
        flush_std_streams();
        let mut saved = Vec::with_capacity(STANDARD_FDS.len());
        for fd in STANDARD_FDS {
            let copy = dup_high(unsafe { BorrowedFd::borrow_raw(fd) }).with_context(|| format!("Failed to save descriptor {}", fd))?;
            saved.push((fd, copy));
        }
        Ok(Self { saved })
    }

    fn restore(&mut self) {
        flush_std_streams();
        for (fd, copy) in self.saved.drain(..) {
            if let Err(e) = redirect_fd(copy.as_raw_fd(), fd) {
                error!("Failed to restore descriptor {}: {}", fd, e);
            }
        }
    }
}

impl Drop for SavedStdio {
    fn drop(&mut self) {
        self.restore();
    }
}

fn flush_std_streams() {
    io::stdout().flush().ok();
    io::stderr().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;

    fn identity(fd: RawFd) -> (u64, u64) {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        assert_eq!(unsafe { libc::fstat(fd, &mut st) }, 0);
        (st.st_dev as u64, st.st_ino as u64)
    }

    #[test]
    fn test_dup_high_is_out_of_user_range() {
        let fd = dup_high(io::stdin().as_fd()).unwrap();
        assert!(fd.as_raw_fd() >= FIRST_HIGH_FD);
        let flags = fcntl(&fd, FcntlArg::F_GETFD).unwrap();
        assert!(flags & libc::FD_CLOEXEC != 0);
    }

    #[test]
    fn test_heighten_fd_leaves_high_descriptors_alone() {
        let high = dup_high(io::stdin().as_fd()).unwrap();
        let raw = high.as_raw_fd();
        assert_eq!(heighten_fd(high).unwrap().as_raw_fd(), raw);
    }

    #[test]
    #[serial]
    fn test_saved_stdio_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let before = identity(libc::STDERR_FILENO);
        {
            let _guard = SavedStdio::save().unwrap();
            let file = File::create(dir.path().join("err.txt")).unwrap();
            redirect_fd(file.as_raw_fd(), libc::STDERR_FILENO).unwrap();
            assert_eq!(identity(libc::STDERR_FILENO), identity(file.as_raw_fd()));
        }
        assert_eq!(identity(libc::STDERR_FILENO), before);
    }
}
