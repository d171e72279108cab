//! `swarm-launcher` library.
//!
//! A precondition-gated process launcher: resolve a launch profile into a
//! [`context::LaunchContext`], check the filesystem (`preflight`), compose the
//! child's environment without touching our own (`env`), run the child with
//! inherited stdio (`runner`), and turn its status into our exit code
//! (`launcher`, `report`).
//!
//! Invariants:
//! - a missing required file means the child is never spawned
//! - required directories are created before any file is checked
//! - path-list overrides only ever prepend; inherited entries keep their order
//! - once spawned, the launcher's exit code is the child's

pub mod context;
pub mod env;
pub mod error;
pub mod launcher;
pub mod plan;
pub mod preflight;
pub mod profile;
pub mod report;
pub mod runner;
pub mod schema;
pub mod trace;
