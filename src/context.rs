use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::env::EnvOverride;
use crate::profile::LaunchProfile;

/// A filesystem precondition checked before the child is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredPath {
    /// Created (with parents) when absent.
    Directory(PathBuf),
    /// Launch aborts when absent; `hint` tells the user how to supply it.
    File { path: PathBuf, hint: Option<String> },
}

impl RequiredPath {
    pub fn path(&self) -> &Path {
        match self {
            RequiredPath::Directory(p) => p,
            RequiredPath::File { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ChildCommand {
    /// Split `[program, args...]`.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("command must name a program"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Shell-ish rendering for messages and plans. Not re-parseable.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| {
                if a.contains(char::is_whitespace) {
                    format!("\"{a}\"")
                } else {
                    a.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything one launch needs. Built once, dropped at exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Absolute; relative required paths and the child's cwd resolve here.
    pub working_directory: PathBuf,
    pub overrides: Vec<EnvOverride>,
    pub required_paths: Vec<RequiredPath>,
    pub command: ChildCommand,
}

impl LaunchContext {
    pub fn from_profile(profile: &LaunchProfile, working_directory: PathBuf) -> Result<Self> {
        let command = ChildCommand::from_argv(&profile.command)
            .context("profile command is empty")?;
        Ok(Self {
            working_directory,
            overrides: profile.env.iter().map(|e| e.to_override()).collect(),
            required_paths: profile.require.iter().map(|r| r.to_required_path()).collect(),
            command,
        })
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        }
    }
}

/// Pick the directory the launch runs in.
///
/// Order: an explicit directory, else the profile file's directory (joined
/// with the profile's own `working_dir`), else the launcher executable's
/// directory. The caller's current directory only matters for making an
/// explicit relative path absolute.
pub fn resolve_working_directory(
    explicit: Option<&Path>,
    profile_file: Option<&Path>,
    profile_working_dir: Option<&Path>,
) -> Result<PathBuf> {
    let base = match (explicit, profile_file) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(file)) => {
            let file = absolutize(file)?;
            let parent = file
                .parent()
                .ok_or_else(|| anyhow!("profile path has no parent: {}", file.display()))?
                .to_path_buf();
            match profile_working_dir {
                Some(rel) => parent.join(rel),
                None => parent,
            }
        }
        (None, None) => {
            let exe = std::env::current_exe().context("resolve launcher executable path")?;
            exe.parent()
                .ok_or_else(|| anyhow!("launcher executable has no parent: {}", exe.display()))?
                .to_path_buf()
        }
    };
    absolutize(&base)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("resolve current_dir")?
            .join(path)
    };
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}
