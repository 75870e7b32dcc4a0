#[macro_use] extern crate log;

pub mod app;

pub use app::config::Config;
pub use app::error::TrackerError;
pub use app::radar::{Frame, FrameKind, RadarController, RadarStatus, TimeLabel};
pub use app::warnings::{Alert, AlertCounts, AlertSnapshot, Severity, WarningsProcessor};
