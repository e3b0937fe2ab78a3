use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::warn;

/// Bounded retry with a fixed delay. `is_transient` decides whether an
/// error is worth another attempt; anything else propagates immediately.
pub fn retry<T>(
    what: &str,
    attempts: u32,
    delay: Duration,
    is_transient: impl Fn(&anyhow::Error) -> bool,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || attempt == attempts {
                    return Err(err);
                }
                warn!("{what}: attempt {attempt}/{attempts} failed: {err:#}");
                last_err = Some(err);
                thread::sleep(delay);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{what}: no attempts made")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn stops_on_non_transient_error() {
        let calls = Cell::new(0u32);
        let result: Result<()> = retry(
            "op",
            5,
            Duration::from_millis(0),
            |_| false,
            || {
                calls.set(calls.get() + 1);
                Err(anyhow::anyhow!("hard failure"))
            },
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_transient_until_bound() {
        let calls = Cell::new(0u32);
        let result: Result<()> = retry(
            "op",
            3,
            Duration::from_millis(0),
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err(anyhow::anyhow!("reset"))
            },
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn returns_first_success() {
        let calls = Cell::new(0u32);
        let result = retry(
            "op",
            3,
            Duration::from_millis(0),
            |_| true,
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 2 {
                    Err(anyhow::anyhow!("reset"))
                } else {
                    Ok(calls.get())
                }
            },
        );
        assert_eq!(result.expect("second attempt should succeed"), 2);
    }
}
