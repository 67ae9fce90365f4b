//! sox-noise process supervisor
//!
//! Owns the lifecycle of the two external SoX processes a noise session
//! needs:
//!
//! - **synthesis**: the long-running looping playback process
//! - **visualization**: the one-shot spectrogram renderer
//!
//! Each role is an independent slot that holds at most one live child.
//! `replace` is the workhorse: it terminates the current child (SIGTERM,
//! bounded wait, SIGKILL) and starts the new one while holding the role's
//! lock, so two replacements for the same role never interleave.
//!
//! Every child gets a completion watch thread. Visualization results are
//! delivered to a callback exactly once, and only while the request that
//! produced them is still current; results of superseded requests are
//! dropped. Observed exits are collected and handed out by
//! [`ProcessSupervisor::reap`].
//!
//! Dropping the supervisor (or calling [`ProcessSupervisor::shutdown`])
//! stops both roles and removes the scratch image file.
//!
//! # Example
//!
//! ```ignore
//! use soxnoise_supervisor::{OutputSink, ProcessSupervisor, Role};
//!
//! let supervisor = ProcessSupervisor::new()
//!     .on_visualization(|out| println!("spectrogram #{} ready", out.generation));
//!
//! supervisor.replace(Role::Synthesis, &argv, OutputSink::Discard)?;
//! supervisor.replace(Role::Visualization, &spectrogram_argv, OutputSink::Pipe)?;
//! ```

pub mod error;
pub mod handle;
pub mod role;
pub mod runner;
pub mod supervisor;
mod watch;

pub use error::{SupervisorError, SupervisorResult};
pub use handle::ChildProcessHandle;
pub use role::{
    OutputSink, Role, RoleExit, RoleState, VisualizationArtifact, VisualizationOutput,
};
pub use runner::RunOutput;
pub use supervisor::{
    resolve_executable, CompletionCallback, ProcessSupervisor, SupervisorConfig,
    DEFAULT_KILL_TIMEOUT_MS, DEFAULT_RUN_TIMEOUT_SECS, DEFAULT_TERM_TIMEOUT_MS,
};
