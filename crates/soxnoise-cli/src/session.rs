//! The headless session loop.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use soxnoise_params::{OutputTarget, ParameterSet, SessionFlags};
use soxnoise_supervisor::{Role, VisualizationArtifact, VisualizationOutput};
use tracing::{debug, info, warn};

use crate::cli_args::Cli;
use crate::controller::{Controller, ControllerConfig, Notice};
use crate::events::Event;
use crate::input::{self, Request};
use crate::settings;
use crate::signals;

/// How often child exits are collected while idle.
pub const TICK: Duration = Duration::from_millis(100);

/// Runs a session until `quit`, end of input or a termination signal.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config_dir = settings::config_dir();
    let startup = settings::resolve(cli.config.as_deref(), &cli.overrides(), &config_dir);
    for warning in &startup.warnings {
        warn!("{}", warning);
    }
    if let Some(warning) = redirect_warning(startup.params.output(), io::stdout().is_terminal()) {
        warn!("{}", warning);
    }
    if startup.flags.tray {
        info!("Tray icon requested; this front end has none");
    }

    let hidden = startup.flags.hidden_on_start;
    let audio_on_stdout = startup.params.output().writes_to_stdout();
    let config = ControllerConfig {
        program: cli.sox.clone(),
        spectrogram_to_file: cli.spectrogram_file,
        render_path: cli.save.clone(),
        settings_dir: startup
            .config_path
            .parent()
            .map_or_else(|| config_dir.clone(), Path::to_path_buf),
        ..ControllerConfig::default()
    };
    let (mut controller, notices) =
        Controller::new(startup.params, startup.flags, config).context("failed to start session")?;

    if let Err(e) = signals::install() {
        warn!("{:#}", e);
    }
    let (tx, rx) = mpsc::channel();
    if hidden {
        info!("Playing until interrupted");
    } else {
        input::spawn_reader(tx.clone());
    }
    let presenter = Presenter {
        spectrogram_out: cli.spectrogram_out.clone(),
        requests: tx,
    };

    let mut flow = controller.start();
    while flow.is_continue() && !signals::shutdown_requested() {
        match rx.recv_timeout(TICK) {
            Ok(Request::Event(event)) => flow = controller.handle(event),
            Ok(Request::Status) => print_status(&controller, audio_on_stdout)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        controller.tick();
        for notice in notices.try_iter() {
            presenter.show(notice);
        }
    }

    if controller.is_rendering() && !signals::shutdown_requested() {
        info!("Waiting for the sound file to finish rendering");
    }
    while controller.is_rendering() && !signals::shutdown_requested() {
        std::thread::sleep(TICK);
        controller.tick();
        for notice in notices.try_iter() {
            presenter.show(notice);
        }
    }

    if signals::shutdown_requested() {
        info!("Interrupted; stopping");
    }
    controller.shutdown();
    Ok(ExitCode::SUCCESS)
}

/// Warns when stdout is redirected but the audio goes somewhere else.
pub fn redirect_warning(output: &OutputTarget, stdout_is_terminal: bool) -> Option<String> {
    if stdout_is_terminal || output.writes_to_stdout() {
        return None;
    }
    Some(format!(
        "stdout is redirected but the output is '{}'; use --output wav or --output sox to stream audio",
        output
    ))
}

/// Shows notices on stderr and answers file choosers with their suggestion.
struct Presenter {
    spectrogram_out: Option<PathBuf>,
    requests: Sender<Request>,
}

impl Presenter {
    fn show(&self, notice: Notice) {
        match notice {
            Notice::Spectrogram(output) => self.spectrogram(output),
            Notice::SpectrogramHidden => info!("Spectrogram hidden"),
            Notice::Playback(true) => info!("Playing"),
            Notice::Playback(false) => info!("Stopped"),
            Notice::EffectsPanel(expanded) => {
                info!("Effects panel {}", if expanded { "shown" } else { "hidden" })
            }
            Notice::ChooseFile(request) => {
                info!(
                    "{} ({}): {}",
                    request.purpose.title(),
                    request.filter.pattern(),
                    request.suggested.display()
                );
                let _ = self.requests.send(Request::Event(Event::FileChosen {
                    purpose: request.purpose,
                    path: request.suggested,
                }));
            }
            // already logged by the controller
            other => debug!("{:?}", other),
        }
    }

    fn spectrogram(&self, output: VisualizationOutput) {
        let written = match (&output.artifact, &self.spectrogram_out) {
            (VisualizationArtifact::Bytes(bytes), Some(dest)) => fs::write(dest, bytes),
            (VisualizationArtifact::File(path), Some(dest)) => fs::copy(path, dest).map(|_| ()),
            (_, None) => Ok(()),
        };
        if let Err(e) = written {
            warn!("failed to write spectrogram: {}", e);
        }
        match &output.artifact {
            VisualizationArtifact::Bytes(bytes) => {
                info!("Spectrogram #{} ready ({} bytes)", output.generation, bytes.len())
            }
            VisualizationArtifact::File(path) => {
                info!("Spectrogram #{} ready in {}", output.generation, path.display())
            }
        }
    }
}

#[derive(Serialize)]
struct Status<'a> {
    params: &'a ParameterSet,
    flags: &'a SessionFlags,
    synthesis_pid: Option<u32>,
    spectrogram_pid: Option<u32>,
}

/// Prints the state as one JSON line; on stderr when audio owns stdout.
fn print_status(controller: &Controller, audio_on_stdout: bool) -> Result<()> {
    let status = Status {
        params: controller.params(),
        flags: controller.flags(),
        synthesis_pid: controller.supervisor().pid(Role::Synthesis),
        spectrogram_pid: controller.supervisor().pid(Role::Visualization),
    };
    let line = serde_json::to_string(&status)?;
    if audio_on_stdout {
        eprintln!("{}", line);
    } else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
    }
    Ok(())
}
