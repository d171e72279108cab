use crate::context::{LaunchContext, RequiredPath};
use crate::env::{lookup, EnvOverride, Environment};

/// Print a `header count` line followed by numbered items.
fn print_section<I, F>(header: &str, count: usize, items: I, mut format_item: F)
where
    I: IntoIterator,
    F: FnMut(I::Item) -> String,
{
    println!("{header:<13} {count}");
    for (idx, item) in items.into_iter().enumerate() {
        println!("  {idx}. {}", format_item(item));
    }
}

/// Print what a launch would do, without touching the filesystem or spawning.
///
/// `env` is the composed child environment; overridden variables are shown
/// with their final values.
pub fn print_plan(profile: &str, ctx: &LaunchContext, env: &Environment) {
    println!("{:<13} {}", "Profile:", profile);
    println!("{:<13} {}", "Working dir:", ctx.working_directory.display());

    print_section(
        "Requires:",
        ctx.required_paths.len(),
        ctx.required_paths.iter(),
        |req| {
            let (kind, path) = match req {
                RequiredPath::Directory(p) => ("dir ", ctx.resolve(p)),
                RequiredPath::File { path, .. } => ("file", ctx.resolve(path)),
            };
            let state = if path.exists() { "present" } else { "missing" };
            format!("{kind} {}  [{state}]", path.display())
        },
    );

    print_section(
        "Environment:",
        ctx.overrides.len(),
        ctx.overrides.iter(),
        |ov| {
            let verb = match ov {
                EnvOverride::Set { .. } => "set    ",
                EnvOverride::Prepend { .. } => "prepend",
            };
            let name = ov.name();
            let value = lookup(env, name)
                .map(|v| v.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{verb} {name}={value}")
        },
    );

    println!("{:<13} {}", "Command:", ctx.command.display());
}
