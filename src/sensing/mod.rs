pub mod clock;
pub mod controller;
pub mod loop_worker;
pub mod source;

pub use clock::MonitorClock;
pub use controller::MonitorController;
pub use source::{SignalSource, SourceKind};
