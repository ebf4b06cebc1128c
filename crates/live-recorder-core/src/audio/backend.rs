use crate::{CoreResult, audio::InputFormat, audio::PcmBuffer};

/// Callback invoked on the hardware's real-time thread for every captured block.
///
/// Implementations must return quickly: no locks shared with the state queue,
/// no blocking I/O.
pub type BufferCallback = Box<dyn FnMut(PcmBuffer) + Send + 'static>;

/// Asynchronous platform signals that affect an active recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Another client (phone call, alarm) took the audio hardware.
    InterruptionBegan,
    /// The interruption is over.
    InterruptionEnded {
        /// Platform hint that capture may continue without user action.
        should_resume: bool,
    },
    /// The set of audio routes changed (headset plugged or unplugged).
    RouteChanged {
        /// Whether any input device is usable after the change.
        input_available: bool,
    },
    /// The default input moved to another device while one stayed available.
    InputSwitched,
}

/// A live attachment to the hardware input stream.
///
/// Dropping the tap detaches it; no callback fires after drop returns.
pub trait CaptureTap {
    /// Format the hardware delivers on this tap.
    fn format(&self) -> InputFormat;

    /// Pause the hardware engine without detaching.
    fn pause(&mut self) -> CoreResult<()>;

    /// Restart a paused hardware engine. Calling it on a running engine is a no-op.
    fn play(&mut self) -> CoreResult<()>;
}

/// Audio session adapter and tap factory for one input device family.
///
/// The recorder owns exactly one backend and installs at most one tap at a time.
pub trait AudioBackend {
    /// Tap handle produced by [`AudioBackend::install_tap`].
    type Tap: CaptureTap;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Acquire exclusive access to the input hardware.
    ///
    /// Fails with `HardwareAcquisition` when access is refused (permission
    /// revoked, device busy, no device).
    fn activate(&mut self) -> CoreResult<()>;

    /// Release the hardware session. Never fails; errors are logged.
    fn deactivate(&mut self);

    /// Whether an input device is currently present.
    fn input_available(&self) -> bool;

    /// Attach to the live input stream and start delivering buffers.
    ///
    /// The tap's format is read from the hardware, never assumed.
    fn install_tap(&mut self, on_buffer: BufferCallback) -> CoreResult<Self::Tap>;
}
