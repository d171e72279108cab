use tracing::{debug, info, warn};

use crate::context::LaunchContext;
use crate::env::{compose_environment, Environment};
use crate::error::LaunchError;
use crate::preflight::{missing_toolkit_dirs, run_preflight};
use crate::report::{show_banner, FailureReporter};
use crate::runner::ProcessRunner;
use crate::trace::LaunchTrace;

/// One launch: preflight, environment, banner, child, status.
///
/// The sequence is strictly linear; the first failure ends it.
pub struct Launcher<'a, R: ProcessRunner + ?Sized> {
    ctx: &'a LaunchContext,
    runner: &'a R,
    inherited: Environment,
    banner: Option<&'a [String]>,
}

impl<'a, R: ProcessRunner + ?Sized> Launcher<'a, R> {
    pub fn new(ctx: &'a LaunchContext, runner: &'a R, inherited: Environment) -> Self {
        Self {
            ctx,
            runner,
            inherited,
            banner: None,
        }
    }

    /// Print these lines (plus the launch line) right before spawning.
    pub fn with_banner(mut self, lines: &'a [String]) -> Self {
        self.banner = Some(lines);
        self
    }

    /// Run the sequence. `Ok` only when the child exited zero.
    pub fn run(&self, trace: &mut LaunchTrace) -> Result<(), LaunchError> {
        let ctx = self.ctx;
        debug!(working_directory = %ctx.working_directory.display(), "starting launch");

        run_preflight(ctx, trace)?;

        let env = compose_environment(self.inherited.clone(), &ctx.overrides);
        trace.environment_composed(ctx.overrides.len());

        let command_line = ctx.command.display();
        if let Some(lines) = self.banner {
            show_banner(&mut std::io::stdout().lock(), lines, &command_line);
        }

        info!(command = %command_line, "launching child");
        let mut child = self
            .runner
            .spawn(&ctx.command, &env, &ctx.working_directory)?;
        trace.child_spawned(&command_line);
        let code = child.wait()?;
        trace.child_exited(code);

        if code != 0 {
            return Err(LaunchError::ChildFailed { code });
        }
        Ok(())
    }

    /// Run, report any failure through `reporter`, and return the launcher's
    /// own exit code.
    pub fn launch(&self, reporter: &mut dyn FailureReporter, trace: &mut LaunchTrace) -> i32 {
        match self.run(trace) {
            Ok(()) => {
                trace.launch_finished(true);
                0
            }
            Err(err) => {
                if err.aborted_before_spawn() {
                    trace.launch_aborted(&err.to_string());
                }
                trace.launch_finished(false);
                reporter.report(&err);
                err.exit_code()
            }
        }
    }

    /// Preflight and environment composition only; the child is never
    /// started. Missing toolkit directories are warnings, not failures.
    pub fn check(&self, reporter: &mut dyn FailureReporter, trace: &mut LaunchTrace) -> i32 {
        let result = run_preflight(self.ctx, trace)
            .map(|_| compose_environment(self.inherited.clone(), &self.ctx.overrides));

        match result {
            Ok(env) => {
                trace.environment_composed(self.ctx.overrides.len());
                for (name, dir) in missing_toolkit_dirs(&self.ctx.overrides, &env) {
                    warn!(name = %name, path = %dir.display(), "toolkit directory not found");
                    println!("[WARN] {name} points to a missing directory: {}", dir.display());
                }
                println!("[OK] All launch preconditions satisfied.");
                trace.launch_finished(true);
                0
            }
            Err(err) => {
                trace.launch_aborted(&err.to_string());
                trace.launch_finished(false);
                reporter.report(&err);
                err.exit_code()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::OsStr;
    use std::path::{Path, PathBuf};

    use crate::context::{ChildCommand, RequiredPath};
    use crate::env::EnvOverride;
    use crate::runner::{RunningChild, SystemRunner};

    struct FakeRunner {
        code: i32,
        calls: RefCell<Vec<(Environment, PathBuf)>>,
    }

    struct Exited(i32);

    impl RunningChild for Exited {
        fn wait(&mut self) -> Result<i32, LaunchError> {
            Ok(self.0)
        }
    }

    impl ProcessRunner for FakeRunner {
        fn spawn(
            &self,
            _command: &ChildCommand,
            env: &Environment,
            cwd: &Path,
        ) -> Result<Box<dyn RunningChild>, LaunchError> {
            self.calls
                .borrow_mut()
                .push((env.clone(), cwd.to_path_buf()));
            Ok(Box::new(Exited(self.code)))
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl FailureReporter for Recorder {
        fn report(&mut self, err: &LaunchError) {
            self.0.push(err.to_string());
        }
    }

    fn ctx(dir: &Path) -> LaunchContext {
        LaunchContext {
            working_directory: dir.to_path_buf(),
            overrides: vec![EnvOverride::Set {
                name: "FORCE_CMAKE".into(),
                value: "1".into(),
            }],
            required_paths: vec![
                RequiredPath::Directory("models".into()),
                RequiredPath::File {
                    path: "models/m.gguf".into(),
                    hint: None,
                },
            ],
            command: ChildCommand {
                program: "agent".into(),
                args: Vec::new(),
            },
        }
    }

    #[test]
    fn missing_file_never_reaches_runner() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = ctx(tmp.path());
        let runner = FakeRunner {
            code: 0,
            calls: RefCell::new(Vec::new()),
        };
        let mut reporter = Recorder::default();
        let mut trace = LaunchTrace::new("test");

        let code =
            Launcher::new(&ctx, &runner, Environment::new()).launch(&mut reporter, &mut trace);

        assert_eq!(code, crate::error::EXIT_LAUNCH_ABORTED);
        assert!(runner.calls.borrow().is_empty());
        assert!(!trace.child_was_spawned());
        assert_eq!(reporter.0.len(), 1);
        assert!(reporter.0[0].contains("m.gguf"));
    }

    #[test]
    fn child_gets_composed_env_and_working_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("models")).expect("mkdir");
        std::fs::write(tmp.path().join("models/m.gguf"), b"x").expect("write");
        let ctx = ctx(tmp.path());
        let runner = FakeRunner {
            code: 0,
            calls: RefCell::new(Vec::new()),
        };
        let mut inherited = Environment::new();
        inherited.insert("HOME".into(), "/home/op".into());
        let mut reporter = Recorder::default();
        let mut trace = LaunchTrace::new("test");

        let code = Launcher::new(&ctx, &runner, inherited).launch(&mut reporter, &mut trace);

        assert_eq!(code, 0);
        assert!(reporter.0.is_empty());
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (env, cwd) = &calls[0];
        assert_eq!(cwd, tmp.path());
        assert_eq!(
            env.get(OsStr::new("FORCE_CMAKE")).map(|v| v.as_os_str()),
            Some(OsStr::new("1"))
        );
        assert!(env.contains_key(OsStr::new("HOME")));
    }

    #[test]
    fn non_zero_child_code_is_reported_and_returned() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("models")).expect("mkdir");
        std::fs::write(tmp.path().join("models/m.gguf"), b"x").expect("write");
        let ctx = ctx(tmp.path());
        let runner = FakeRunner {
            code: 5,
            calls: RefCell::new(Vec::new()),
        };
        let mut reporter = Recorder::default();
        let mut trace = LaunchTrace::new("test");

        let code =
            Launcher::new(&ctx, &runner, Environment::new()).launch(&mut reporter, &mut trace);

        assert_eq!(code, 5);
        assert_eq!(reporter.0, vec!["child process exited with code 5".to_string()]);
        assert!(trace.child_was_spawned());
    }

    #[test]
    fn check_never_spawns_and_reports_missing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = ctx(tmp.path());
        let runner = FakeRunner {
            code: 0,
            calls: RefCell::new(Vec::new()),
        };
        let mut reporter = Recorder::default();
        let mut trace = LaunchTrace::new("test");
        let launcher = Launcher::new(&ctx, &runner, Environment::new());

        assert_eq!(launcher.check(&mut reporter, &mut trace), 1);
        assert_eq!(reporter.0.len(), 1);

        std::fs::write(tmp.path().join("models/m.gguf"), b"x").expect("write");
        assert_eq!(launcher.check(&mut reporter, &mut trace), 0);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn failed_spawn_is_not_traced_as_spawned() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("models")).expect("mkdir");
        std::fs::write(tmp.path().join("models/m.gguf"), b"x").expect("write");
        let mut ctx = ctx(tmp.path());
        ctx.command = ChildCommand {
            program: "swarm-launcher-no-such-program".into(),
            args: Vec::new(),
        };
        let mut reporter = Recorder::default();
        let mut trace = LaunchTrace::new("test");

        let code = Launcher::new(&ctx, &SystemRunner, crate::env::inherited_environment())
            .launch(&mut reporter, &mut trace);

        assert_eq!(code, crate::error::EXIT_LAUNCH_ABORTED);
        assert!(!trace.child_was_spawned());
        assert!(trace
            .events
            .iter()
            .any(|e| matches!(e, crate::trace::TraceEvent::LaunchAborted { .. })));
        assert_eq!(reporter.0, vec!["failed to start 'swarm-launcher-no-such-program'".to_string()]);
    }
}
