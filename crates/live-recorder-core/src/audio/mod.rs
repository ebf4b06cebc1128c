mod backend;
mod buffer;
mod capture;
mod route_monitor;

pub use {
    backend::{AudioBackend, BufferCallback, CaptureTap, SessionSignal},
    buffer::{InputFormat, PcmBuffer},
    capture::{CpalBackend, CpalTap},
    route_monitor::{InputProbe, RouteMonitor, route_signals},
};
