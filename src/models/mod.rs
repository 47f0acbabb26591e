pub mod alert;
pub mod observation;
pub mod session;

pub use alert::{Alert, AlertKind, Candidate, Severity, StatCounter};
pub use observation::{
    BoundingBox, DetectedFace, DetectedObject, InputKind, Observation, Point, Size,
};
pub use session::{Session, SessionStatus};
