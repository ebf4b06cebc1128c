use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// An operation was attempted in a state that does not allow it.
    #[error("Invalid session transition: {reason} {location}")]
    Session {
        /// Description of the rejected transition.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The platform refused exclusive access to the input device.
    #[error("Hardware acquisition failed: {reason} {location}")]
    HardwareAcquisition {
        /// Description of the hardware failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The target encoding could not be built for the negotiated input format.
    #[error("Encoding setup failed: {reason} {location}")]
    EncodingSetup {
        /// Description of the encoder failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing or finalizing the container failed.
    #[error("Writer error: {reason} {location}")]
    Writer {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reactivation after an interruption or route change failed.
    #[error("Interruption recovery failed: {reason} {location}")]
    InterruptionRecovery {
        /// Description of the recovery failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No writable output target could be resolved.
    #[error("Path resolution failed: {reason} {location}")]
    PathResolution {
        /// Description of the path failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recorder's state queue is no longer running.
    #[error("Recorder channel closed: {message} {location}")]
    ChannelClosed {
        /// Human-readable error message.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecorderError {
    /// `Session` error at the caller.
    #[track_caller]
    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `HardwareAcquisition` error at the caller.
    #[track_caller]
    pub fn hardware(reason: impl Into<String>) -> Self {
        Self::HardwareAcquisition {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `EncodingSetup` error at the caller.
    #[track_caller]
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::EncodingSetup {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `Writer` error at the caller.
    #[track_caller]
    pub fn writer(reason: impl Into<String>) -> Self {
        Self::Writer {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `InterruptionRecovery` error at the caller.
    #[track_caller]
    pub fn recovery(reason: impl Into<String>) -> Self {
        Self::InterruptionRecovery {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `PathResolution` error at the caller.
    #[track_caller]
    pub fn path(reason: impl Into<String>) -> Self {
        Self::PathResolution {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `ChannelClosed` error at the caller.
    #[track_caller]
    pub fn channel_closed(message: impl Into<String>) -> Self {
        Self::ChannelClosed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
