//! Supervisor roles, their states and output wiring.

use std::fmt;
use std::path::PathBuf;

/// An independent single-instance slot in the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The long-running looping playback process.
    Synthesis,
    /// The one-shot spectrogram process.
    Visualization,
}

impl Role {
    /// Both roles.
    pub const ALL: [Role; 2] = [Role::Synthesis, Role::Visualization];

    /// Returns the string identifier for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Synthesis => "synthesis",
            Role::Visualization => "visualization",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// No process.
    Idle,
    /// A live process owns the role.
    Running,
    /// The process is being terminated.
    Stopping,
}

/// Where a child's standard output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Shared with the supervisor's own stdout (audio streamed to stdout).
    Inherit,
    /// Captured through a pipe and read to completion by the supervisor.
    Pipe,
    /// Discarded; the process writes directly to a device.
    Discard,
    /// Discarded; the process writes its result to this file.
    File(PathBuf),
}

/// A finished visualization result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualizationArtifact {
    /// Image bytes captured from the pipe.
    Bytes(Vec<u8>),
    /// Image written to a file.
    File(PathBuf),
}

/// A visualization completion delivered to the registered callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationOutput {
    /// Request number; increases with every spawn of the role.
    pub generation: u64,
    /// The produced image.
    pub artifact: VisualizationArtifact,
}

/// A process exit observed by a completion watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleExit {
    pub role: Role,
    pub pid: u32,
    pub generation: u64,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
}
