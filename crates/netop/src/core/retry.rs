use std::time::Duration;

/// How long a timed-out operation waits before its next attempt.
///
/// Only timeouts are retried, so this is the pause between a timer fire and
/// the attempt that replaces it. `retry_count` counts retries already spent
/// (0 before the second attempt) and `base` is
/// [`OperationConfig::retry_backoff`](crate::OperationConfig::retry_backoff).
/// The operation stays `TimedOut` for the whole wait and a cancel cuts it
/// short. The default base of zero re-attempts at once.
///
/// ```
/// use std::time::Duration;
/// use netop::core::retry_delay;
///
/// let base = Duration::from_millis(250);
/// assert_eq!(retry_delay(0, base), Duration::from_millis(250));
/// assert_eq!(retry_delay(2, base), Duration::from_secs(1));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry_count))
}
