pub mod alert_log;
pub mod engine;
pub mod policy;
pub mod stats;
pub mod throttle;

pub use alert_log::{AlertLog, DEFAULT_LOG_CAPACITY};
pub use engine::{AlertingEngine, EngineHandle, EngineSnapshot};
pub use policy::{AlertPolicy, KindPolicy};
pub use stats::Stats;
pub use throttle::ThrottleState;
