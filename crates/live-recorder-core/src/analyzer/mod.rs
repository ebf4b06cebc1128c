#[allow(clippy::module_inception)]
mod analyzer;
pub(crate) mod level;
mod settings;
pub(crate) mod vad;

pub use {
    analyzer::VoiceAnalyzer,
    settings::{AnalyzerSettings, SpeechMode},
};
