use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used whenever the launcher stops before the child is spawned.
pub const EXIT_LAUNCH_ABORTED: i32 = 1;

/// Terminal failures of a single launch. Every variant halts the sequence.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("required file not found: {}", path.display())]
    MissingResource { path: PathBuf, hint: Option<String> },

    #[error("failed to create directory '{}'", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for '{program}'")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("child process exited with code {code}")]
    ChildFailed { code: i32 },
}

impl LaunchError {
    /// The launcher's own exit status for this failure.
    ///
    /// A failed child passes its code through; everything else is a fixed abort code.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::ChildFailed { code } => *code,
            _ => EXIT_LAUNCH_ABORTED,
        }
    }

    /// True when the child was never started.
    pub fn aborted_before_spawn(&self) -> bool {
        !matches!(
            self,
            LaunchError::ChildFailed { .. } | LaunchError::Wait { .. }
        )
    }
}
