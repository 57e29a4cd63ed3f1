use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Name of the alarm that drives unread-count polling.
pub const POLL_ALARM: &str = "update-count";

/// A named recurring timer. The first tick fires `delay` after [`Alarm::run`]
/// starts, then every `period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    name: String,
    delay: Duration,
    period: Duration,
}

impl Alarm {
    pub fn periodic(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            delay: period,
            period,
        }
    }

    /// Tick until `cancel` receives a message or its sender is dropped.
    ///
    /// `on_tick` runs inline; spawn from it if handlers should overlap.
    pub async fn run<F>(self, mut cancel: mpsc::Receiver<()>, on_tick: F)
    where
        F: Fn(&str) + Send,
    {
        let mut interval = interval_at(Instant::now() + self.delay, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "[Alarm] {} armed, every {}s",
            self.name,
            self.period.as_secs()
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    log::debug!("[Alarm] {} fired", self.name);
                    on_tick(&self.name);
                }
                _ = cancel.recv() => {
                    log::info!("[Alarm] {} cancelled", self.name);
                    break;
                }
            }
        }
    }
}
