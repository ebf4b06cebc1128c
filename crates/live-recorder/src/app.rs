use crate::{AppCommand, AppResult, config::Config};

use live_recorder_core::{
    CpalBackend, EventReceiver, Recorder, RecorderEvent, RecorderHandle, RouteMonitor,
    SessionSignal,
};

use std::{fs, path::PathBuf, time::Duration};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, instrument, warn};

/// Console front end for one recorder.
///
/// Reads commands from stdin, logs recorder events, and finalizes the live
/// session on quit or Ctrl+C.
pub struct App {
    pub(crate) recorder: RecorderHandle,
    pub(crate) events: EventReceiver,
    pub(crate) monitor: Option<RouteMonitor>,
    pub(crate) output: Option<PathBuf>,
    /// Loudest level seen since the last duration tick.
    pub(crate) peak_level: f32,
}

impl App {
    /// Spawn the recorder on the default input device and, if enabled, the
    /// route monitor watching it.
    #[instrument(skip(config))]
    pub(crate) fn new(config: &Config, output: Option<PathBuf>) -> AppResult<Self> {
        let (recorder, events) =
            Recorder::spawn(|| Ok(CpalBackend::new()), config.recorder_settings())?;

        let monitor = match config.monitor.route_poll_ms {
            0 => None,
            poll_ms => Some(RouteMonitor::spawn(
                recorder.clone(),
                Box::new(CpalBackend::default_input_id),
                Duration::from_millis(poll_ms),
            )?),
        };

        Ok(Self {
            recorder,
            events,
            monitor,
            output,
            peak_level: 0.0,
        })
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Live-Recorder starting");

        self.recorder.configure(self.output.take(), None).await?;
        let path = self.recorder.start().await?;
        println!("Recording to {}", path.display());
        println!("{}", AppCommand::HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut console_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line(), if console_open => {
                    match line {
                        Ok(Some(line)) if line.trim().is_empty() => {}
                        Ok(Some(line)) => match line.parse::<AppCommand>() {
                            Ok(AppCommand::Quit) => {
                                info!("Quit requested");
                                break;
                            }
                            Ok(command) => {
                                if let Err(e) = self.handle_command(command).await {
                                    error!(command = ?command, error = %e, "Command failed");
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "Ignoring console input");
                                println!("{}", AppCommand::HELP);
                            }
                        },
                        Ok(None) => {
                            info!("Console closed, Ctrl+C stops the recording");
                            console_open = false;
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to read console");
                            console_open = false;
                        }
                    }
                }

                Some(event) = self.events.recv() => {
                    self.handle_event(event);
                }

                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for Ctrl+C");
                    }
                    info!("Ctrl+C received");
                    break;
                }

                else => {
                    info!("Recorder closed, shutting down");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Execute one console command.
    #[instrument(skip(self))]
    pub(crate) async fn handle_command(&mut self, command: AppCommand) -> AppResult<()> {
        match command {
            AppCommand::Start => {
                let path = self.recorder.start().await?;
                println!("Recording to {}", path.display());
            }
            AppCommand::Pause => self.recorder.pause().await?,
            AppCommand::Resume => self.recorder.resume().await?,
            AppCommand::Reset => {
                let path = self.recorder.reset().await?;
                println!("Next segment: {} (resume to continue)", path.display());
            }
            AppCommand::Stop => {
                let path = self.recorder.stop_and_wait().await?;
                report_file(&path)?;
            }
            AppCommand::Status => {
                let status = self.recorder.status();
                let path = status
                    .path
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {:.1}s {}",
                    status.state,
                    status.duration.as_secs_f64(),
                    path
                );
            }
            AppCommand::Interrupt => self.recorder.notify(SessionSignal::InterruptionBegan)?,
            AppCommand::InterruptEnd => self.recorder.notify(SessionSignal::InterruptionEnded {
                should_resume: true,
            })?,
            AppCommand::Quit => {}
        }
        Ok(())
    }

    fn handle_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::StatusChanged(state) => {
                info!(state = %state, "Recorder status changed");
            }
            RecorderEvent::DurationTick { seconds } => {
                info!(seconds, peak = self.peak_level, "Recording");
                self.peak_level = 0.0;
            }
            RecorderEvent::WaveLevel { level, .. } => {
                self.peak_level = self.peak_level.max(level);
            }
            RecorderEvent::Finalized { path } => {
                info!(path = ?path, "Recording finalized");
            }
            RecorderEvent::Error { message } => {
                warn!(message = %message, "Recorder reported an error");
            }
        }
    }

    /// Finalize any live session and stop background threads.
    async fn shutdown(mut self) -> AppResult<()> {
        if self.recorder.status().state.is_active() {
            match self.recorder.stop_and_wait().await {
                Ok(path) => report_file(&path)?,
                Err(e) => error!(error = %e, "Failed to finalize recording on shutdown"),
            }
        }

        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }

        while let Ok(event) = self.events.try_recv() {
            debug!(event = ?event, "Event after shutdown");
        }

        info!("Live-Recorder shut down successfully");
        Ok(())
    }
}

fn report_file(path: &std::path::Path) -> AppResult<()> {
    let size = fs::metadata(path)?.len();
    println!("Saved {} ({} bytes)", path.display(), size);
    Ok(())
}
