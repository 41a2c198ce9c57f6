use std::time::Duration;
use tokio::time::Instant;

/// Trailing-edge debouncer polled from the event loop tick.
///
/// Each `push` replaces the pending value and restarts the delay; only the
/// last value of a burst is released, once the delay has elapsed with no
/// further pushes.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now()));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if its delay has elapsed by `now`.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test]
    async fn test_releases_after_delay() {
        time::pause();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.push("rust");

        time::advance(Duration::from_millis(499)).await;
        assert_eq!(d.take_ready(Instant::now()), None);

        time::advance(Duration::from_millis(1)).await;
        assert_eq!(d.take_ready(Instant::now()), Some("rust"));
        assert!(!d.is_pending());
    }

    #[tokio::test]
    async fn test_burst_collapses_to_last_value() {
        time::pause();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.push("r");
        time::advance(Duration::from_millis(300)).await;
        d.push("ru");
        time::advance(Duration::from_millis(300)).await;
        d.push("rus");

        time::advance(Duration::from_millis(300)).await;
        assert_eq!(d.take_ready(Instant::now()), None);

        time::advance(Duration::from_millis(200)).await;
        assert_eq!(d.take_ready(Instant::now()), Some("rus"));
        assert_eq!(d.take_ready(Instant::now()), None);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending() {
        time::pause();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.push(1);
        assert_eq!(d.cancel(), Some(1));
        time::advance(Duration::from_millis(200)).await;
        assert_eq!(d.take_ready(Instant::now()), None);
    }
}
