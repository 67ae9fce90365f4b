//! sox-noise integration test infrastructure
//!
//! - `command_laws`: argument vector properties over arbitrary parameter sets
//! - `config_roundtrip`: settings files survive save and load
//! - `supervisor_lifecycle`: spawn, replace and escalation against `/bin/sh`
//! - `session_scenarios`: full controller sessions against a fake `sox`
//!
//! ```bash
//! cargo test -p soxnoise-tests
//! ```
//!
//! Process tests only run on unix.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// Polls `condition` until it holds or `timeout` passes. Returns the last result.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// A shell script standing in for SoX.
///
/// Every invocation appends its arguments to a log. Spectrogram requests
/// print `PNG-<pid>`, looping playback sleeps until terminated and anything
/// else exits at once.
#[cfg(unix)]
pub struct FakeSox {
    dir: TempDir,
    program: PathBuf,
    log: PathBuf,
}

#[cfg(unix)]
impl FakeSox {
    pub fn new() -> Self {
        Self::with_playback("exec sleep 30")
    }

    /// Like [`new`](Self::new), but the first looping playback exits with
    /// status 1 at once. Later ones sleep as usual.
    pub fn failing_first_playback() -> Self {
        Self::with_playback(
            r#"marker="$(dirname "$0")/played"
    if [ -e "$marker" ]; then exec sleep 30; fi
    : > "$marker"
    exit 1"#,
        )
    }

    fn with_playback(playback: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create fake sox dir");
        let program = dir.path().join("sox");
        let log = dir.path().join("invocations.log");
        let script = format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> "{log}"
case " $* " in
  *" spectrogram "*) printf 'PNG-%s' "$$"; exit 0 ;;
  *" repeat "*)
    {playback}
    ;;
esac
exit 0
"#,
            log = log.display(),
            playback = playback
        );
        fs::write(&program, script).expect("Failed to write fake sox");
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake sox executable");
        Self { dir, program, log }
    }

    /// Absolute path of the script.
    pub fn program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Scratch directory owned by the fake.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Logged argument lists, oldest first.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    /// Waits until at least `count` invocations were logged.
    pub fn wait_for(&self, count: usize) -> Vec<Vec<String>> {
        wait_until(Duration::from_secs(5), || self.invocations().len() >= count);
        self.invocations()
    }
}

#[cfg(unix)]
impl Default for FakeSox {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `argv` contains `a` immediately followed by `b`.
pub fn has_pair(argv: &[String], a: &str, b: &str) -> bool {
    argv.windows(2).any(|w| w[0] == a && w[1] == b)
}
