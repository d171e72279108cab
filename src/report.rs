//! Console output: the banner and the two ways of surfacing a failure.

use std::error::Error as _;
use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::error::LaunchError;
use crate::profile::FailureMode;

pub const PAUSE_PROMPT: &str = "Press Enter to continue . . .";

/// How a terminal failure is shown to whoever started the launcher.
pub trait FailureReporter {
    fn report(&mut self, err: &LaunchError);
}

/// User-facing text for a failure.
pub fn failure_message(err: &LaunchError) -> String {
    match err {
        LaunchError::MissingResource { path, hint } => {
            let mut msg = format!("[ERROR] Required file not found: {}", path.display());
            if let Some(hint) = hint {
                msg.push('\n');
                msg.push_str(hint);
            }
            msg
        }
        LaunchError::ChildFailed { code } => {
            format!("[FATAL] Swarm process crashed with exit code {code}.")
        }
        other => {
            let mut msg = format!("[ERROR] {other}");
            let mut cur = other.source();
            while let Some(cause) = cur {
                msg.push_str(&format!("\n  caused by: {cause}"));
                cur = cause.source();
            }
            msg
        }
    }
}

/// Print the message and return.
pub struct ImmediateReporter<W: Write> {
    out: W,
}

impl<W: Write> ImmediateReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FailureReporter for ImmediateReporter<W> {
    fn report(&mut self, err: &LaunchError) {
        if let Err(e) = writeln!(self.out, "{}", failure_message(err)) {
            warn!(error = %e, "failed to write failure message");
        }
    }
}

/// Print the message, then block until the operator presses Enter.
///
/// End of input counts as acknowledgment, so a closed stdin never hangs.
pub struct InteractiveReporter<R: BufRead, W: Write> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> InteractiveReporter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.out)
    }

    fn pause(&mut self) -> io::Result<()> {
        write!(self.out, "{PAUSE_PROMPT}")?;
        self.out.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        writeln!(self.out)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> FailureReporter for InteractiveReporter<R, W> {
    fn report(&mut self, err: &LaunchError) {
        if let Err(e) = writeln!(self.out, "{}", failure_message(err)).and_then(|_| self.pause()) {
            warn!(error = %e, "failed to show failure prompt");
        }
    }
}

/// Reporter for the real console.
pub fn console_reporter(mode: FailureMode) -> Box<dyn FailureReporter> {
    match mode {
        FailureMode::Pause => Box::new(InteractiveReporter::new(io::stdin().lock(), io::stderr())),
        FailureMode::Exit => Box::new(ImmediateReporter::new(io::stderr())),
    }
}

/// Write banner lines followed by the launch line.
pub fn write_banner<W: Write>(out: &mut W, lines: &[String], command: &str) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "[*] Launching: {command}")?;
    out.flush()
}

/// Write the banner; a console that cannot take it is logged, not fatal.
pub fn show_banner<W: Write>(out: &mut W, lines: &[String], command: &str) {
    if let Err(e) = write_banner(out, lines, command) {
        warn!(error = %e, "failed to write banner");
    }
}
