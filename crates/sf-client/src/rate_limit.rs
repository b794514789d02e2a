//! Token-bucket admission control shared by every request of a client.
//!
//! The bucket is tracked as a single "theoretical arrival time" (GCRA): each
//! admission reserves the next slot and pushes the arrival time forward by
//! one emission interval. Callers that arrive before their slot sleep until
//! it. Blocking is the only backpressure; nothing is queued or shed.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Rate limit settings: `rate` admissions per `per`, allowing `burst` at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained admissions per period.
    pub rate: u32,
    /// Length of the period.
    pub per: Duration,
    /// Admissions allowed back to back before spacing kicks in.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 150,
            per: Duration::from_secs(1),
            burst: 1,
        }
    }
}

impl RateLimitConfig {
    /// `rate` admissions per second with a burst of one.
    pub fn per_second(rate: u32) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    /// Set the burst size.
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Set the period the rate applies to.
    pub fn with_period(mut self, per: Duration) -> Self {
        self.per = per;
        self
    }

    /// Check that the settings describe a usable bucket.
    pub fn validate(&self) -> Result<()> {
        if self.rate == 0 {
            return Err(Error::new(ErrorKind::Config("rate limit must be non-zero".into())));
        }
        if self.burst == 0 {
            return Err(Error::new(ErrorKind::Config("burst must be at least 1".into())));
        }
        if self.per.is_zero() {
            return Err(Error::new(ErrorKind::Config(
                "rate limit period must be non-zero".into(),
            )));
        }
        Ok(())
    }

    /// Time between admissions at the sustained rate.
    pub fn interval(&self) -> Duration {
        self.per / self.rate.max(1)
    }
}

/// A slot handed out by [`RateLimiter::reserve`].
#[derive(Debug, Clone, Copy)]
struct Reservation {
    start: Instant,
    tat_after: Instant,
}

/// Shared token-bucket limiter.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    tolerance: Duration,
    tat: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter from validated settings.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        config.validate()?;
        let interval = config.interval();
        Ok(Self {
            interval,
            tolerance: interval * (config.burst - 1),
            tat: Mutex::new(None),
        })
    }

    /// Time between admissions at the sustained rate.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for an admission slot.
    ///
    /// If `cancel` fires while waiting, the slot is handed back when no later
    /// caller has reserved behind it, and [`ErrorKind::Cancelled`] is returned.
    pub async fn acquire(&self, cancel: Option<&CancellationToken>) -> Result<()> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::cancelled());
        }

        let reservation = self.reserve()?;
        let now = Instant::now();
        if reservation.start <= now {
            return Ok(());
        }

        debug!(
            wait_ms = (reservation.start - now).as_millis() as u64,
            "rate limiter delaying request"
        );

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = sleep_until(reservation.start) => Ok(()),
                    _ = token.cancelled() => {
                        self.release(reservation);
                        Err(Error::cancelled())
                    }
                }
            }
            None => {
                sleep_until(reservation.start).await;
                Ok(())
            }
        }
    }

    fn reserve(&self) -> Result<Reservation> {
        let mut tat = self
            .tat
            .lock()
            .map_err(|_| Error::new(ErrorKind::Config("rate limiter state poisoned".into())))?;

        let now = Instant::now();
        let current = tat.map_or(now, |t| t.max(now));
        let start = current
            .checked_sub(self.tolerance)
            .map_or(now, |earliest| earliest.max(now));
        let tat_after = current + self.interval;
        *tat = Some(tat_after);

        Ok(Reservation { start, tat_after })
    }

    fn release(&self, reservation: Reservation) {
        if let Ok(mut tat) = self.tat.lock() {
            if *tat == Some(reservation.tat_after) {
                *tat = Some(reservation.tat_after - self.interval);
            }
        }
    }
}
