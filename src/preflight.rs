//! Filesystem preconditions that gate the launch.
//!
//! Directories are handled before files so a missing `models/` folder is
//! created and then reported as "file missing" instead of aborting on its own.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::context::{LaunchContext, RequiredPath};
use crate::env::{lookup, EnvOverride, Environment};
use crate::error::LaunchError;
use crate::trace::LaunchTrace;

/// What preflight found. Paths are resolved against the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    pub created_dirs: Vec<PathBuf>,
    pub verified_files: Vec<PathBuf>,
}

/// Ensure every required directory exists, then check every required file.
///
/// Stops at the first missing file; nothing after it is checked.
pub fn run_preflight(
    ctx: &LaunchContext,
    trace: &mut LaunchTrace,
) -> Result<PreflightReport, LaunchError> {
    let mut report = PreflightReport::default();

    for req in &ctx.required_paths {
        let RequiredPath::Directory(rel) = req else {
            continue;
        };
        let dir = ctx.resolve(rel);
        let created = if dir.is_dir() {
            false
        } else {
            fs::create_dir_all(&dir).map_err(|source| LaunchError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
            debug!(path = %dir.display(), "created required directory");
            report.created_dirs.push(dir.clone());
            true
        };
        trace.directory_ensured(&dir, created);
    }

    for req in &ctx.required_paths {
        let RequiredPath::File { path: rel, hint } = req else {
            continue;
        };
        let file = ctx.resolve(rel);
        let present = file.is_file();
        trace.file_checked(&file, present);
        if !present {
            return Err(LaunchError::MissingResource {
                path: file,
                hint: hint.clone(),
            });
        }
        debug!(path = %file.display(), "required file present");
        report.verified_files.push(file);
    }

    Ok(report)
}

/// Variables set to a toolkit location (`*_PATH`, `*_HOME`) whose directory
/// does not exist. Never fatal: the child may not need the toolkit at all.
pub fn missing_toolkit_dirs(overrides: &[EnvOverride], env: &Environment) -> Vec<(String, PathBuf)> {
    overrides
        .iter()
        .filter_map(|ov| match ov {
            EnvOverride::Set { name, .. } if name.ends_with("_PATH") || name.ends_with("_HOME") => {
                let value = lookup(env, name)?;
                let dir = PathBuf::from(value);
                (!dir.is_dir()).then(|| (name.clone(), dir))
            }
            _ => None,
        })
        .collect()
}
