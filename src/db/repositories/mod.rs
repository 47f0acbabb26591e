pub mod alerts;
pub mod session_stats;
pub mod sessions;
