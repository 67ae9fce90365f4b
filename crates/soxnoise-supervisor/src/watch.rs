//! Completion watches: one background thread per spawned child.
//!
//! A watch drains the child's stdout pipe (if any), then polls the owning
//! slot until the child exits. It only acts while the slot still holds the
//! same generation; once the role has been stopped or replaced the watch
//! ends silently, so superseded visualization results are never delivered.

use std::io::Read;
use std::process::ChildStdout;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::role::{
    OutputSink, Role, RoleExit, RoleState, VisualizationArtifact, VisualizationOutput,
};
use crate::supervisor::{lock, CompletionCallback, SharedSlot};

pub(crate) struct Watch {
    pub slot: SharedSlot,
    pub role: Role,
    pub pid: u32,
    pub generation: u64,
    pub stdout: Option<ChildStdout>,
    pub exits: Arc<Mutex<Vec<RoleExit>>>,
    pub on_visualization: Option<CompletionCallback>,
    pub poll_interval: Duration,
}

impl Watch {
    pub fn spawn(self) {
        thread::spawn(move || self.run());
    }

    fn run(mut self) {
        let mut captured = self.stdout.take().map(|mut out| {
            let mut buf = Vec::new();
            if let Err(e) = out.read_to_end(&mut buf) {
                debug!(role = %self.role, pid = self.pid, "stdout read ended early: {}", e);
            }
            buf
        });

        loop {
            {
                let mut slot = lock(&self.slot);
                let polled = match slot.handle.as_mut() {
                    Some(handle) if handle.generation() == self.generation => {
                        handle.child.try_wait()
                    }
                    _ => {
                        debug!(
                            role = %self.role,
                            generation = self.generation,
                            "dropping superseded completion"
                        );
                        return;
                    }
                };

                match polled {
                    Ok(Some(status)) => {
                        let handle = slot.handle.take();
                        slot.state = RoleState::Idle;
                        self.record(RoleExit {
                            role: self.role,
                            pid: self.pid,
                            generation: self.generation,
                            code: status.code(),
                            success: status.success(),
                        });

                        if self.role != Role::Visualization {
                            info!(role = %self.role, pid = self.pid, code = ?status.code(), "process exited");
                            return;
                        }
                        if !status.success() {
                            warn!(pid = self.pid, code = ?status.code(), "spectrogram process failed");
                            return;
                        }
                        let artifact = match handle.as_ref().map(|h| h.sink()) {
                            Some(OutputSink::File(path)) => VisualizationArtifact::File(path.clone()),
                            _ => VisualizationArtifact::Bytes(captured.take().unwrap_or_default()),
                        };
                        // Delivered under the slot lock: a newer request cannot
                        // slip in between the generation check and the callback.
                        if let Some(callback) = &self.on_visualization {
                            callback(VisualizationOutput {
                                generation: self.generation,
                                artifact,
                            });
                        }
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(role = %self.role, pid = self.pid, "failed to poll process, killing: {}", e);
                        if let Some(handle) = slot.handle.take() {
                            handle.abandon();
                        }
                        slot.state = RoleState::Idle;
                        return;
                    }
                }
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn record(&self, exit: RoleExit) {
        self.exits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(exit);
    }
}
