//! Bounded retry for transient filesystem contention.

use std::thread;
use std::time::Duration;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * attempt`
/// between failed attempts.
///
/// Returns the last error together with the number of attempts made.
pub fn retry_io<T>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: impl FnMut() -> std::io::Result<T>,
) -> Result<T, (std::io::Error, u32)> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err((e, attempt)),
            Err(e) => {
                tracing::debug!(attempt, error = %e, "retrying after I/O error");
                thread::sleep(base_delay * attempt);
                attempt += 1;
            }
        }
    }
}
