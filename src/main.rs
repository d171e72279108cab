use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use swarm_launcher::context::{resolve_working_directory, LaunchContext};
use swarm_launcher::env::{compose_environment, inherited_environment};
use swarm_launcher::error::EXIT_LAUNCH_ABORTED;
use swarm_launcher::launcher::Launcher;
use swarm_launcher::profile::{FailureMode, LaunchProfile};
use swarm_launcher::runner::SystemRunner;
use swarm_launcher::trace::{print_trace, LaunchTrace};
use swarm_launcher::{plan, report, schema};

const LOG_ENV: &str = "SWARM_LAUNCHER_LOG";

/// Check launch preconditions, prepare the GPU build environment, and run the
/// Sentinel Swarm agent runner.
#[derive(Parser, Debug)]
#[command(name = "swarm-launcher", version)]
#[command(about = "Precondition-gated launcher for the Sentinel Swarm", long_about = None)]
struct Cli {
    /// Launch profile YAML (defaults to the built-in swarm profile)
    #[arg(env = "SWARM_LAUNCHER_PROFILE")]
    profile: Option<PathBuf>,

    /// Directory to launch in (defaults to the profile's directory, else the launcher's)
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Exit right after a failure message instead of waiting for Enter
    #[arg(long)]
    no_pause: bool,

    /// Skip the banner
    #[arg(long, short)]
    quiet: bool,

    /// Print the resolved launch plan and exit
    #[arg(long, conflicts_with = "check")]
    print_plan: bool,

    /// Run the preconditions only; never start the child
    #[arg(long)]
    check: bool,

    /// Print the launch trace when done
    #[arg(long)]
    trace: bool,

    /// Print the effective profile as YAML and exit
    #[arg(long)]
    print_profile: bool,

    /// Print the launch profile JSON schema and exit
    #[arg(long)]
    print_schema: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn print_error_chain(err: &anyhow::Error) {
    eprintln!("Error: {err}");

    let mut n = 0;
    let mut cur = err.source();
    while let Some(cause) = cur {
        eprintln!("  {n}: {cause}");
        n += 1;
        cur = cause.source();
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match real_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            print_error_chain(&err);
            std::process::exit(EXIT_LAUNCH_ABORTED);
        }
    }
}

fn real_main() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.print_schema {
        let text = serde_json::to_string_pretty(schema::profile_schema_json())
            .context("render profile schema")?;
        println!("{text}");
        return Ok(0);
    }

    let (profile, label) = match cli.profile.as_deref() {
        Some(path) => (
            LaunchProfile::load_from_file(path)?,
            path.display().to_string(),
        ),
        None => (LaunchProfile::builtin(), "builtin".to_string()),
    };

    if cli.print_profile {
        print!("{}", profile.to_yaml()?);
        return Ok(0);
    }

    let working_directory = resolve_working_directory(
        cli.workdir.as_deref(),
        cli.profile.as_deref(),
        profile.working_dir.as_deref(),
    )?;
    let ctx = LaunchContext::from_profile(&profile, working_directory)?;

    if cli.print_plan {
        let env = compose_environment(inherited_environment(), &ctx.overrides);
        plan::print_plan(&label, &ctx, &env);
        return Ok(0);
    }

    let mode = if cli.no_pause {
        FailureMode::Exit
    } else {
        profile.on_failure
    };
    let mut reporter = report::console_reporter(mode);
    let mut trace = LaunchTrace::new(label);

    let runner = SystemRunner;
    let mut launcher = Launcher::new(&ctx, &runner, inherited_environment());
    if !cli.quiet {
        launcher = launcher.with_banner(&profile.banner);
    }

    let code = if cli.check {
        launcher.check(reporter.as_mut(), &mut trace)
    } else {
        launcher.launch(reporter.as_mut(), &mut trace)
    };

    if cli.trace {
        print_trace(&trace);
    }

    Ok(code)
}
