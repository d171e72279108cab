use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::context::ChildCommand;
use crate::env::Environment;
use crate::error::LaunchError;

/// Starts the child. Spawning and waiting are separate steps so the caller
/// can record the spawn only once the process actually exists.
pub trait ProcessRunner {
    fn spawn(
        &self,
        command: &ChildCommand,
        env: &Environment,
        cwd: &Path,
    ) -> Result<Box<dyn RunningChild>, LaunchError>;
}

/// A started child the launcher blocks on.
pub trait RunningChild {
    fn wait(&mut self) -> Result<i32, LaunchError>;
}

/// Spawns a real process with inherited stdio and waits without a timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn spawn(
        &self,
        command: &ChildCommand,
        env: &Environment,
        cwd: &Path,
    ) -> Result<Box<dyn RunningChild>, LaunchError> {
        debug!(program = %command.program, cwd = %cwd.display(), "spawning child");

        // The child sees exactly the composed map; program lookup uses its PATH.
        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(Box::new(SystemChild {
            program: command.program.clone(),
            child,
        }))
    }
}

struct SystemChild {
    program: String,
    child: Child,
}

impl RunningChild for SystemChild {
    fn wait(&mut self) -> Result<i32, LaunchError> {
        let status = self.child.wait().map_err(|source| LaunchError::Wait {
            program: self.program.clone(),
            source,
        })?;
        let code = exit_code_of(status);
        debug!(code, "child exited");
        Ok(code)
    }
}

/// Map a child's status to an exit code. Signal deaths become `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}
