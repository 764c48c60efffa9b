use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff before the next attempt: `2^attempt + U(0,1)` seconds, attempt
/// 0-based. The jitter spreads retries against rate-limited endpoints.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = 2f64.powi(attempt as i32);
    Duration::from_secs_f64(base + rand::random::<f64>())
}

/// Invoke `op` up to `max_attempts` times, sleeping between failures.
///
/// The controller is strategy-agnostic: it retries on any error and returns
/// the last error once attempts are exhausted. Failure is always a returned
/// `Err`, never a panic.
pub async fn with_retry<T, F, Fut>(name: &str, max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed: {}",
                    name,
                    attempt + 1,
                    max_attempts,
                    e
                );
                if attempt + 1 >= max_attempts {
                    return Err(e);
                }

                let wait = backoff_delay(attempt);
                info!("{}: waiting {:.1}s before retry", name, wait.as_secs_f64());
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
