use std::time::Duration;
use std::time::Instant;

/// Wall-clock budget polled by the solve loop.
///
/// A stopwatch without a limit never reports exhaustion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Stopwatch {
    time_limit: Option<Duration>,
    time_start: Instant,
}

impl Stopwatch {
    pub(crate) fn new(time_limit: Option<Duration>) -> Stopwatch {
        Stopwatch {
            time_limit,
            time_start: Instant::now(),
        }
    }

    pub(crate) fn reset(&mut self, time_limit: Option<Duration>) {
        self.time_limit = time_limit;
        self.time_start = Instant::now();
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.time_start.elapsed()
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.time_limit
            .is_some_and(|limit| self.time_start.elapsed() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_limit_never_exhausts() {
        let stopwatch = Stopwatch::new(None);
        assert!(!stopwatch.budget_exhausted());
    }

    #[test]
    fn zero_limit_exhausts_immediately() {
        let stopwatch = Stopwatch::new(Some(Duration::ZERO));
        assert!(stopwatch.budget_exhausted());
    }
}
