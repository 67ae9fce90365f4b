//! Carries out coalescer directives against the process supervisor.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use soxnoise_params::{
    config, CommandBuilder, OutputTarget, ParameterSet, SessionFlags, SpectrogramDest,
    SpectrogramOptions,
};
use soxnoise_supervisor::{
    OutputSink, ProcessSupervisor, Role, RunOutput, SupervisorConfig, SupervisorError,
    SupervisorResult, VisualizationOutput,
};
use tracing::{debug, info, warn};

use crate::coalescer::{Directive, UpdateCoalescer};
use crate::events::{Event, FilePurpose, FileRequest};

/// Default suggestion for the settings file chooser.
pub const DEFAULT_SETTINGS_NAME: &str = "noise.sxn";

/// Default suggestion for the sound file chooser.
pub const DEFAULT_SOUND_NAME: &str = "noise.ogg";

/// Something the front end should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Warning(String),
    /// A fresh spectrogram image.
    Spectrogram(VisualizationOutput),
    SpectrogramHidden,
    /// Playback was turned on or off.
    Playback(bool),
    EffectsPanel(bool),
    ChooseFile(FileRequest),
    SettingsSaved(PathBuf),
    SettingsLoaded(PathBuf),
    SoundRendered(PathBuf),
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// SoX executable.
    pub program: String,
    pub spectrogram: SpectrogramOptions,
    /// Have SoX write the spectrogram to a scratch file instead of a pipe.
    pub spectrogram_to_file: bool,
    /// Re-render the sound here on every commit.
    pub render_path: Option<PathBuf>,
    /// Base directory for relative chooser suggestions.
    pub settings_dir: PathBuf,
    pub supervisor: SupervisorConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            program: soxnoise_params::command::DEFAULT_PROGRAM.to_string(),
            spectrogram: SpectrogramOptions::default(),
            spectrogram_to_file: false,
            render_path: None,
            settings_dir: PathBuf::from("."),
            supervisor: SupervisorConfig::default(),
        }
    }
}

type RenderResult = (PathBuf, SupervisorResult<RunOutput>);

/// Owns the coalescer and the supervisor and connects the two.
///
/// At most one render runs at a time; a render requested meanwhile waits
/// and is superseded by any later request.
pub struct Controller {
    coalescer: UpdateCoalescer,
    supervisor: ProcessSupervisor,
    visualization_sink: OutputSink,
    notices: Sender<Notice>,
    settings_dir: PathBuf,
    last_settings: PathBuf,
    last_sound: PathBuf,
    renders_tx: Sender<RenderResult>,
    renders_rx: Receiver<RenderResult>,
    rendering: bool,
    pending_render: Option<(PathBuf, Vec<String>)>,
}

impl Controller {
    /// Creates a controller and the receiving end of its notice channel.
    pub fn new(
        params: ParameterSet,
        flags: SessionFlags,
        config: ControllerConfig,
    ) -> SupervisorResult<(Self, Receiver<Notice>)> {
        let (tx, rx) = mpsc::channel();

        let callback_tx = Mutex::new(tx.clone());
        let supervisor = ProcessSupervisor::with_config(config.supervisor.clone()).on_visualization(
            move |output: VisualizationOutput| {
                let tx = callback_tx.lock().unwrap_or_else(|e| e.into_inner());
                let _ = tx.send(Notice::Spectrogram(output));
            },
        );

        let (dest, visualization_sink) = if config.spectrogram_to_file {
            let path = supervisor.visualization_file()?;
            (SpectrogramDest::File(path.clone()), OutputSink::File(path))
        } else {
            (SpectrogramDest::Pipe, OutputSink::Pipe)
        };

        let coalescer = UpdateCoalescer::new(params, flags, CommandBuilder::new(&config.program))
            .with_spectrogram(config.spectrogram, dest)
            .with_render_path(config.render_path.clone());

        let (renders_tx, renders_rx) = mpsc::channel();
        let controller = Self {
            coalescer,
            supervisor,
            visualization_sink,
            notices: tx,
            settings_dir: config.settings_dir,
            last_settings: PathBuf::from(DEFAULT_SETTINGS_NAME),
            last_sound: config
                .render_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOUND_NAME)),
            renders_tx,
            renders_rx,
            rendering: false,
            pending_render: None,
        };
        Ok((controller, rx))
    }

    pub fn params(&self) -> &ParameterSet {
        self.coalescer.params()
    }

    pub fn flags(&self) -> &SessionFlags {
        self.coalescer.flags()
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Brings processes in line with the initial state.
    pub fn start(&mut self) -> ControlFlow<()> {
        let directives = self.coalescer.startup();
        self.apply_all(directives)
    }

    /// Handles one event. Breaks when the session should end.
    pub fn handle(&mut self, event: Event) -> ControlFlow<()> {
        debug!("event: {:?}", event);
        let directives = self.coalescer.dispatch(event);
        self.apply_all(directives)
    }

    /// Collects processes that exited on their own and finished renders.
    pub fn tick(&mut self) {
        for exit in self.supervisor.reap() {
            if exit.role != Role::Synthesis {
                continue;
            }
            if exit.generation != self.supervisor.generation(Role::Synthesis) {
                debug!("ignoring exit of replaced synthesis pid {}", exit.pid);
                continue;
            }
            if !exit.success {
                self.warn(format!(
                    "{} process {} exited with {}",
                    exit.role,
                    exit.pid,
                    exit.code
                        .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c))
                ));
            }
            if self.coalescer.playback_stopped() {
                self.notify(Notice::Playback(false));
            }
        }
        while let Ok((path, result)) = self.renders_rx.try_recv() {
            self.rendering = false;
            match result {
                Ok(output) => {
                    info!("Rendered {} in {:.2?}", path.display(), output.duration);
                    self.notify(Notice::SoundRendered(path));
                }
                Err(e) => self.report(&e),
            }
        }
        if !self.rendering {
            if let Some((path, argv)) = self.pending_render.take() {
                self.render(path, argv);
            }
        }
    }

    /// True while a render runs or waits to run.
    pub fn is_rendering(&self) -> bool {
        self.rendering || self.pending_render.is_some()
    }

    /// Stops every child process.
    pub fn shutdown(&mut self) {
        self.supervisor.shutdown();
    }

    /// The chooser suggestion for `purpose`.
    pub fn suggestion(&self, purpose: FilePurpose) -> PathBuf {
        match purpose {
            FilePurpose::LoadSettings | FilePurpose::SaveSettings => {
                self.settings_dir.join(&self.last_settings)
            }
            FilePurpose::SaveSound => self.last_sound.clone(),
        }
    }

    fn apply_all(&mut self, directives: Vec<Directive>) -> ControlFlow<()> {
        for directive in directives {
            self.apply(directive)?;
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, directive: Directive) -> ControlFlow<()> {
        match directive {
            Directive::ReplaceSynthesis(argv) => {
                let sink = synthesis_sink(self.coalescer.params().output());
                match self.supervisor.replace(Role::Synthesis, &argv, sink) {
                    Ok(pid) => {
                        debug!("synthesis running as pid {}", pid);
                        self.notify(Notice::Playback(true));
                    }
                    Err(e) => {
                        self.report(&e);
                        if self.coalescer.playback_stopped() {
                            self.notify(Notice::Playback(false));
                        }
                    }
                }
            }
            Directive::StopSynthesis => {
                if let Err(e) = self.supervisor.stop(Role::Synthesis) {
                    self.report(&e);
                }
                self.notify(Notice::Playback(false));
            }
            Directive::RefreshSpectrogram(argv) => {
                let sink = self.visualization_sink.clone();
                if let Err(e) = self.supervisor.replace(Role::Visualization, &argv, sink) {
                    self.report(&e);
                }
            }
            Directive::HideSpectrogram => {
                if let Err(e) = self.supervisor.stop(Role::Visualization) {
                    self.report(&e);
                }
                self.notify(Notice::SpectrogramHidden);
            }
            Directive::Render { path, argv } => {
                self.last_sound = path.clone();
                if self.rendering {
                    debug!("render of {} queued", path.display());
                    self.pending_render = Some((path, argv));
                } else {
                    self.render(path, argv);
                }
            }
            Directive::EffectsPanel(expanded) => self.notify(Notice::EffectsPanel(expanded)),
            Directive::ChooseFile(purpose) => {
                let request = FileRequest {
                    purpose,
                    suggested: self.suggestion(purpose),
                    filter: purpose.filter(),
                };
                self.notify(Notice::ChooseFile(request));
            }
            Directive::SaveSettings(path) => self.save_settings(path),
            Directive::LoadSettings(path) => return self.load_settings(path),
            Directive::Warn(message) => self.warn(message),
            Directive::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn render(&mut self, path: PathBuf, argv: Vec<String>) {
        let tx = self.renders_tx.clone();
        let done_path = path.clone();
        let started = self.supervisor.run_in_background(&argv, None, move |result| {
            let _ = tx.send((done_path, result));
        });
        match started {
            Ok(()) => {
                debug!("rendering {}", path.display());
                self.rendering = true;
            }
            Err(e) => self.report(&e),
        }
    }

    fn save_settings(&mut self, path: PathBuf) {
        self.remember_settings(&path);
        match config::save(self.coalescer.params(), self.coalescer.flags(), &path) {
            Ok(()) => {
                info!("Saved settings to {}", path.display());
                self.notify(Notice::SettingsSaved(path));
            }
            Err(e) => self.warn(format!("{} [{}]", e, e.code())),
        }
    }

    fn load_settings(&mut self, path: PathBuf) -> ControlFlow<()> {
        self.remember_settings(&path);
        let overlay = match config::load(&path) {
            Ok(overlay) => overlay,
            Err(e) => {
                self.warn(format!("{} [{}]; keeping current settings", e, e.code()));
                return ControlFlow::Continue(());
            }
        };
        let (loaded, _, clamped) = overlay.resolve();
        for warning in clamped {
            self.warn(warning.to_string());
        }
        info!("Loaded settings from {}", path.display());
        self.notify(Notice::SettingsLoaded(path));
        let directives = self.coalescer.replace_sound(&loaded);
        self.apply_all(directives)
    }

    fn remember_settings(&mut self, path: &Path) {
        self.last_settings = match path.parent() {
            Some(parent) if parent == self.settings_dir => {
                path.file_name().map_or_else(|| path.to_path_buf(), PathBuf::from)
            }
            _ => path.to_path_buf(),
        };
    }

    fn report(&self, error: &SupervisorError) {
        self.warn(format!("{} [{}]", error, error.code()));
    }

    fn warn(&self, message: String) {
        warn!("{}", message);
        self.notify(Notice::Warning(message));
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}

/// Streams to stdout share the supervisor's stdout; everything else writes
/// to a device or file on its own.
pub fn synthesis_sink(output: &OutputTarget) -> OutputSink {
    if output.writes_to_stdout() {
        OutputSink::Inherit
    } else {
        OutputSink::Discard
    }
}
