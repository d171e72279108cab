//! Child environment composition.
//!
//! The composed environment is always a fresh map: the inherited variables are
//! copied in, the overrides are layered on top in order, and the launcher's own
//! process environment is left untouched.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use tracing::{debug, warn};

/// Variable name → value, ordered for stable printing.
pub type Environment = BTreeMap<OsString, OsString>;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// One variable set specifically for the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOverride {
    /// Replace (or insert) the variable.
    Set { name: String, value: String },
    /// Put `entries` in front of an inherited path list.
    Prepend { name: String, entries: Vec<String> },
}

impl EnvOverride {
    pub fn name(&self) -> &str {
        match self {
            EnvOverride::Set { name, .. } | EnvOverride::Prepend { name, .. } => name,
        }
    }
}

/// Snapshot of the current process environment.
pub fn inherited_environment() -> Environment {
    std::env::vars_os().collect()
}

/// Layer `overrides` over `inherited` and return the child's environment.
///
/// `${NAME}` references in values see everything composed so far, so a later
/// override can build on an earlier one. Composition cannot fail: entries are
/// joined as written, even when they contain the list separator themselves.
pub fn compose_environment(inherited: Environment, overrides: &[EnvOverride]) -> Environment {
    let mut env = inherited;

    for ov in overrides {
        let key = existing_key(&env, ov.name()).unwrap_or_else(|| OsString::from(ov.name()));
        match ov {
            EnvOverride::Set { name, value } => {
                let value = expand_vars(value, &env);
                debug!(name = %name, "set child env var");
                env.insert(key, OsString::from(value));
            }
            EnvOverride::Prepend { name, entries } => {
                let expanded: Vec<String> = entries.iter().map(|e| expand_vars(e, &env)).collect();
                let mut joined = OsString::from(expanded.join(PATH_LIST_SEPARATOR));

                // The inherited list is appended verbatim so its entries keep
                // their exact spelling and order.
                if let Some(existing) = env.get(&key).filter(|v| !v.is_empty()) {
                    joined.push(PATH_LIST_SEPARATOR);
                    joined.push(existing);
                }
                debug!(name = %name, added = expanded.len(), "prepended child path list");
                env.insert(key, joined);
            }
        }
    }

    env
}

/// Look a variable up with the platform's name matching rules.
pub fn lookup<'a>(env: &'a Environment, name: &str) -> Option<&'a OsStr> {
    existing_key(env, name).and_then(|k| env.get(&k).map(OsString::as_os_str))
}

/// Expand `${NAME}` references against `env`. Unknown names stay literal.
pub fn expand_vars(raw: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match lookup(env, name) {
            Some(value) => out.push_str(&value.to_string_lossy()),
            None => {
                warn!(name = %name, "unknown variable reference left unexpanded");
                out.push_str(&rest[start..start + end + 3]);
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(windows)]
fn existing_key(env: &Environment, name: &str) -> Option<OsString> {
    env.keys()
        .find(|k| k.to_string_lossy().eq_ignore_ascii_case(name))
        .cloned()
}

#[cfg(not(windows))]
fn existing_key(env: &Environment, name: &str) -> Option<OsString> {
    let key = OsString::from(name);
    env.contains_key(&key).then_some(key)
}
