use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_secs(1);

/// Counts whole seconds on a background tokio task until stopped.
///
/// The task is aborted when the timer is stopped or dropped, so a timer can
/// never outlive the session that owns it.
#[derive(Debug)]
pub struct SessionTimer {
    elapsed: Arc<AtomicU64>,
    ticker: JoinHandle<()>,
}

impl SessionTimer {
    /// Must be called from within a tokio runtime.
    pub fn start() -> Self {
        let elapsed = Arc::new(AtomicU64::new(0));
        let counter = elapsed.clone();

        // Ticks are anchored to the moment the session starts
        let mut interval = tokio::time::interval(TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let ticker = tokio::spawn(async move {
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        Self { elapsed, ticker }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Stops ticking and returns the frozen value.
    pub fn stop(self) -> u64 {
        self.ticker.abort();
        self.elapsed_seconds()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

/// Formats seconds as `MM:SS`. Minutes keep counting past 59.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(9), "00:09");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3600), "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let timer = SessionTimer::start();
        assert_eq!(timer.elapsed_seconds(), 0);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_second_counts_from_start() {
        let timer = SessionTimer::start();
        // The clock moves on before the ticker task gets polled
        tokio::time::advance(Duration::from_millis(1500)).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(timer.elapsed_seconds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_is_frozen() {
        let timer = SessionTimer::start();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let counter = timer.elapsed.clone();
        let frozen = timer.stop();
        assert_eq!(frozen, 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }
}
