use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const EXTRACTION_MESSAGES: [&str; 5] = [
    "Analysing document structure...",
    "Extracting metadata...",
    "Identifying data sources...",
    "Checking for pseudonymization...",
    "Summarising study goals...",
];

pub const TICK_PERIOD: Duration = Duration::from_secs(2);

/// Rotates a status message while a request runs. The task is aborted when the ticker drops.
#[derive(Debug)]
pub struct StatusTicker {
    messages: &'static [&'static str],
    current: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl StatusTicker {
    pub fn start(handle: &Handle, messages: &'static [&'static str], period: Duration) -> Self {
        let (sender, current) = watch::channel(0);
        let count = messages.len().max(1);

        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            let mut index = 0;
            loop {
                interval.tick().await;
                index = (index + 1) % count;
                if sender.send(index).is_err() {
                    break;
                }
            }
        });

        Self {
            messages,
            current,
            task,
        }
    }

    pub fn message(&self) -> &'static str {
        self.messages
            .get(*self.current.borrow())
            .copied()
            .unwrap_or_default()
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rotates_messages_every_period() {
        let ticker = StatusTicker::start(&Handle::current(), &EXTRACTION_MESSAGES, TICK_PERIOD);
        assert_eq!(ticker.message(), EXTRACTION_MESSAGES[0]);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(ticker.message(), EXTRACTION_MESSAGES[1]);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(ticker.message(), EXTRACTION_MESSAGES[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_task() {
        let ticker = StatusTicker::start(&Handle::current(), &EXTRACTION_MESSAGES, TICK_PERIOD);
        let mut updates = ticker.current.clone();
        ticker.cancel();

        assert!(updates.changed().await.is_err());
    }
}
