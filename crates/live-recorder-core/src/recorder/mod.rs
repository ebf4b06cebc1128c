mod actor;
mod clock;
mod command;
pub(crate) mod event;
mod handle;
mod paths;
pub(crate) mod pipeline;
mod settings;
mod state;

pub use {
    clock::{DurationClock, PeriodicTask},
    command::AnalyzerUpdate,
    event::{EventReceiver, EventSender, RecorderEvent},
    handle::{Recorder, RecorderHandle},
    paths::{DefaultPathResolver, PathResolver, next_segment_path, timestamped_file_name},
    settings::RecorderSettings,
    state::{RecorderStatus, RecordingState},
};
