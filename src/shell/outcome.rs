use nix::sys::wait::WaitStatus;

/// Result of evaluating a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Normal termination with a non-zero status.
    Failure(i32),
    /// Killed by the given signal number.
    Signaled(i32),
}

impl Outcome {
    pub fn failure() -> Self {
        Outcome::Failure(1)
    }

    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Outcome::Success
        } else {
            Outcome::Failure(code)
        }
    }

    pub fn from_wait_status(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Exited(_, code) => Outcome::from_code(code),
            WaitStatus::Signaled(_, signal, _) => Outcome::Signaled(signal as i32),
            _ => Outcome::failure(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Status a process should exit with to report this outcome to its parent.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure(code) => *code,
            Outcome::Signaled(signal) => 128 + signal,
        }
    }
}
