use crate::AppError;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Commands typed on the console while the recorder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Begin a new session after the previous one stopped.
    Start,
    /// Pause the live session.
    Pause,
    /// Resume a paused session.
    Resume,
    /// Close the current segment and continue into a new file.
    Reset,
    /// Stop and wait until the file is finalized.
    Stop,
    /// Print the current status.
    Status,
    /// Simulate the hardware being taken by another client.
    Interrupt,
    /// Simulate the end of an interruption.
    InterruptEnd,
    /// Stop any live session and exit.
    Quit,
}

impl AppCommand {
    /// Console help listing every command.
    pub const HELP: &'static str = "commands: start | pause | resume | reset | stop | status | interrupt | interrupt-end | quit";
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let command = match input.trim().to_ascii_lowercase().as_str() {
            "start" => AppCommand::Start,
            "pause" | "p" => AppCommand::Pause,
            "resume" | "r" => AppCommand::Resume,
            "reset" => AppCommand::Reset,
            "stop" | "s" => AppCommand::Stop,
            "status" => AppCommand::Status,
            "interrupt" => AppCommand::Interrupt,
            "interrupt-end" => AppCommand::InterruptEnd,
            "quit" | "q" | "exit" => AppCommand::Quit,
            _ => {
                return Err(AppError::InvalidCommand {
                    input: input.trim().to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };
        Ok(command)
    }
}
