use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Instant;

/// Wall-clock time anchored at session start and advanced by the tokio
/// clock, so paused-time tests see consistent timestamps.
#[derive(Debug, Clone, Copy)]
pub struct MonitorClock {
    anchor_wall: DateTime<Utc>,
    anchor_instant: Instant,
}

impl MonitorClock {
    pub fn start() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall,
            anchor_instant: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.anchor_wall
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = self.anchor_instant.elapsed();
        match ChronoDuration::from_std(elapsed) {
            Ok(delta) => self.anchor_wall + delta,
            Err(_) => self.anchor_wall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn advances_with_tokio_time() {
        let anchor = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let clock = MonitorClock::anchored_at(anchor);
        assert_eq!(clock.now(), anchor);

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(clock.now(), anchor + ChronoDuration::milliseconds(1_500));
    }
}
