use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep inside [`ShutdownToken::wait`].
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Cooperative stop signal shared by every activity of a node.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleeps for `timeout` or until triggered. Returns whether it was triggered.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_triggered() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_times_out() {
        let token = ShutdownToken::new();
        assert!(!token.wait(Duration::from_millis(15)));
    }

    #[test]
    fn test_trigger_is_seen_by_clones() {
        let token = ShutdownToken::new();
        let other = token.clone();
        let waiter = thread::spawn(move || other.wait(Duration::from_secs(10)));
        token.trigger();
        assert!(waiter.join().unwrap());
        assert!(token.is_triggered());
    }
}
