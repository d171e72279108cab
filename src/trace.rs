use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct LaunchTrace {
    pub profile: String,
    pub events: Vec<TraceEvent>,
    launch_started_ms: u128,
    child_started_ms: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    DirectoryEnsured {
        ts_ms: u128,
        path: String,
        created: bool,
    },
    FileChecked {
        ts_ms: u128,
        path: String,
        present: bool,
    },
    EnvironmentComposed {
        ts_ms: u128,
        overrides: usize,
    },
    ChildSpawned {
        ts_ms: u128,
        command: String,
    },
    ChildExited {
        ts_ms: u128,
        code: i32,
        elapsed_ms: u128,
    },
    LaunchAborted {
        ts_ms: u128,
        message: String,
    },
    LaunchFinished {
        ts_ms: u128,
        success: bool,
        elapsed_ms: u128,
    },
}

impl TraceEvent {
    pub fn summarize(&self) -> String {
        match self {
            TraceEvent::DirectoryEnsured {
                ts_ms,
                path,
                created,
            } => {
                let ts = format_ts_ms(*ts_ms);
                format!("{ts_ms} DirectoryEnsured ts={ts} path={path} created={created}")
            }
            TraceEvent::FileChecked {
                ts_ms,
                path,
                present,
            } => {
                let ts = format_ts_ms(*ts_ms);
                format!("{ts_ms} FileChecked ts={ts} path={path} present={present}")
            }
            TraceEvent::EnvironmentComposed { ts_ms, overrides } => {
                let ts = format_ts_ms(*ts_ms);
                format!("{ts_ms} EnvironmentComposed ts={ts} overrides={overrides}")
            }
            TraceEvent::ChildSpawned { ts_ms, command } => {
                let ts = format_ts_ms(*ts_ms);
                format!("{ts_ms} ChildSpawned ts={ts} command={command}")
            }
            TraceEvent::ChildExited {
                ts_ms,
                code,
                elapsed_ms,
            } => {
                let ts = format_ts_ms(*ts_ms);
                let elapsed = format_elapsed_ms(*elapsed_ms);
                format!(
                    "{ts_ms} ChildExited ts={ts} code={code} elapsed_ms={elapsed_ms} elapsed={elapsed}"
                )
            }
            TraceEvent::LaunchAborted { ts_ms, message } => {
                let ts = format_ts_ms(*ts_ms);
                format!("{ts_ms} LaunchAborted ts={ts} message={message}")
            }
            TraceEvent::LaunchFinished {
                ts_ms,
                success,
                elapsed_ms,
            } => {
                let ts = format_ts_ms(*ts_ms);
                let elapsed = format_elapsed_ms(*elapsed_ms);
                format!(
                    "{ts_ms} LaunchFinished ts={ts} success={success} elapsed_ms={elapsed_ms} elapsed={elapsed}"
                )
            }
        }
    }
}

impl LaunchTrace {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            events: Vec::new(),
            launch_started_ms: Self::now_ms(),
            child_started_ms: None,
        }
    }

    fn now_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    pub fn directory_ensured(&mut self, path: &Path, created: bool) {
        self.events.push(TraceEvent::DirectoryEnsured {
            ts_ms: Self::now_ms(),
            path: path.display().to_string(),
            created,
        });
    }

    pub fn file_checked(&mut self, path: &Path, present: bool) {
        self.events.push(TraceEvent::FileChecked {
            ts_ms: Self::now_ms(),
            path: path.display().to_string(),
            present,
        });
    }

    pub fn environment_composed(&mut self, overrides: usize) {
        self.events.push(TraceEvent::EnvironmentComposed {
            ts_ms: Self::now_ms(),
            overrides,
        });
    }

    pub fn child_spawned(&mut self, command: &str) {
        let ts_ms = Self::now_ms();
        self.child_started_ms = Some(ts_ms);
        self.events.push(TraceEvent::ChildSpawned {
            ts_ms,
            command: command.to_string(),
        });
    }

    pub fn child_exited(&mut self, code: i32) {
        let ts_ms = Self::now_ms();
        let elapsed_ms = self
            .child_started_ms
            .take()
            .map(|started| ts_ms.saturating_sub(started))
            .unwrap_or(0);
        self.events.push(TraceEvent::ChildExited {
            ts_ms,
            code,
            elapsed_ms,
        });
    }

    pub fn launch_aborted(&mut self, message: &str) {
        self.events.push(TraceEvent::LaunchAborted {
            ts_ms: Self::now_ms(),
            message: message.to_string(),
        });
    }

    pub fn launch_finished(&mut self, success: bool) {
        let ts_ms = Self::now_ms();
        let elapsed_ms = ts_ms.saturating_sub(self.launch_started_ms);
        self.events.push(TraceEvent::LaunchFinished {
            ts_ms,
            success,
            elapsed_ms,
        });
    }

    /// True once a `ChildSpawned` event was recorded.
    pub fn child_was_spawned(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, TraceEvent::ChildSpawned { .. }))
    }
}

/// Print a human-readable trace to stdout (stable + diff-friendly).
pub fn print_trace(tr: &LaunchTrace) {
    println!("TRACE profile={}", tr.profile);
    for ev in &tr.events {
        println!("{}", ev.summarize());
    }
}

fn format_ts_ms(ts_ms: u128) -> String {
    let secs = ts_ms / 1000;
    let millis = ts_ms % 1000;
    format!("{secs}.{millis:03}Z")
}

fn format_elapsed_ms(elapsed_ms: u128) -> String {
    let secs = elapsed_ms as f64 / 1000.0;
    format!("{secs:.2}s")
}
