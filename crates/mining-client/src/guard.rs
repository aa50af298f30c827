//! Re-entrancy guards for backend operations
//!
//! An [`InFlightGuard`] marks an operation (a toggle, a queue drain) as running
//! so a second one is rejected instead of queued. A marker that has been held
//! longer than the timeout is treated as abandoned, which keeps a call that
//! never settles from locking the operation out forever.
//!
//! ## Transitions
//! - Idle → Busy: `try_acquire`
//! - Busy → Idle: `release` with the token handed out by `try_acquire`
//! - Busy → Busy (new token): `try_acquire` after the timeout elapsed; the old
//!   token becomes stale and its `release` is ignored

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Busy { token: FlightToken, since: Instant },
}

#[derive(Debug)]
pub struct InFlightGuard {
    name: &'static str,
    state: GuardState,
    timeout: Duration,
    next_token: u64,
    abandoned: u64,
}

impl InFlightGuard {
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            state: GuardState::Idle,
            timeout,
            next_token: 0,
            abandoned: 0,
        }
    }

    /// Claim the guard. Returns `None` while a fresh marker is held.
    pub fn try_acquire(&mut self) -> Option<FlightToken> {
        if let GuardState::Busy { token, since } = self.state {
            let held = since.elapsed();
            if held < self.timeout {
                return None;
            }
            warn!(
                guard = self.name,
                stale_token = token.0,
                held_secs = held.as_secs_f64(),
                "Abandoning stale in-flight marker"
            );
            self.abandoned += 1;
        }

        let token = FlightToken(self.next_token);
        self.next_token += 1;
        self.state = GuardState::Busy {
            token,
            since: Instant::now(),
        };
        Some(token)
    }

    /// Release the guard. Returns `false` if `token` is no longer the holder.
    pub fn release(&mut self, token: FlightToken) -> bool {
        match self.state {
            GuardState::Busy { token: current, .. } if current == token => {
                self.state = GuardState::Idle;
                true
            }
            _ => {
                debug!(guard = self.name, token = token.0, "Stale release ignored");
                false
            }
        }
    }

    /// Whether a marker that has not yet timed out is held.
    pub fn is_busy(&self) -> bool {
        match self.state {
            GuardState::Idle => false,
            GuardState::Busy { since, .. } => since.elapsed() < self.timeout,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Number of markers abandoned after timing out.
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned
    }
}

/// Leading-edge throttle: the first call passes, further calls within
/// `min_interval` of the last accepted one are dropped.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_accepted: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: None,
        }
    }

    pub fn try_pass(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_guard_rejects_while_busy() {
        let mut guard = InFlightGuard::new("toggle", Duration::from_secs(30));
        let token = guard.try_acquire().expect("idle guard");
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());

        assert!(guard.release(token));
        assert!(!guard.is_busy());
        assert_eq!(guard.state(), &GuardState::Idle);
        assert!(guard.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_abandons_stale_marker() {
        let mut guard = InFlightGuard::new("drain", Duration::from_secs(10));
        let stale = guard.try_acquire().expect("idle guard");

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(!guard.is_busy());
        let fresh = guard.try_acquire().expect("stale marker abandoned");
        assert_eq!(guard.abandoned_count(), 1);

        // The late completion of the abandoned call must not free the new holder
        assert!(!guard.release(stale));
        assert!(guard.is_busy());
        assert!(guard.release(fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_window() {
        let mut throttle = Throttle::new(Duration::from_millis(1000));
        assert!(throttle.try_pass());
        assert!(!throttle.try_pass());

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!throttle.try_pass());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(throttle.try_pass());
    }
}
