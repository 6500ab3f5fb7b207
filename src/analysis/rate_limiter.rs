// Client-side request pacing for the Gemini API.
//
// The free tier is quoted in requests per minute, so the limiter spaces calls
// evenly: at 15 RPM each request waits until 4s have passed since the previous
// one was let through.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Pacing>>,
}

struct Pacing {
    spacing: Duration,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    /// Allow `requests_per_minute` evenly spaced requests. Zero disables pacing.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let spacing = if requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(60.0 / requests_per_minute as f64)
        };
        Self {
            inner: Arc::new(Mutex::new(Pacing {
                spacing,
                next_allowed: None,
            })),
        }
    }

    /// Wait for this caller's slot.
    ///
    /// The slot is reserved before sleeping, so concurrent callers queue up
    /// behind each other instead of all waking at the same instant.
    pub async fn acquire(&self) {
        let wait_until = {
            let mut pacing = self.inner.lock().await;
            let now = Instant::now();
            let slot = match pacing.next_allowed {
                Some(next) if next > now => next,
                _ => now,
            };
            pacing.next_allowed = Some(slot + pacing.spacing);
            slot
        };

        tokio::time::sleep_until(wait_until).await;
    }
}
