//! Outbound-HTTP token bucket, §5: "outbound HTTP (exchange-rate, IP
//! geolocation) serialized with a 5s token-bucket." One permit refills
//! every `interval`; callers that arrive before the next refill wait.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

pub struct TokenBucket {
    interval: Duration,
    next_available: Mutex<Instant>,
}

impl TokenBucket {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_available: Mutex::new(Instant::now()),
        }
    }

    /// Blocks the caller until a token is available, then reserves the
    /// next one. Serializes callers rather than dropping them: §5 calls
    /// for rate-limiting outbound calls, not failing them.
    pub async fn acquire(&self) {
        let mut next = self.next_available.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_acquire_waits_out_the_interval() {
        let bucket = TokenBucket::new(Duration::from_secs(5));
        bucket.acquire().await;
        let started = Instant::now();
        bucket.acquire().await;
        assert!(Instant::now() - started >= Duration::from_secs(5));
    }
}
