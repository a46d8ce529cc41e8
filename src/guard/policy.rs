use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const LOCKOUT_DURATION: Duration = Duration::from_secs(15 * 60);

/// Failure counter and block expiry for a single client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptState {
    pub attempt_count: u32,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl AttemptState {
    pub fn is_empty(&self) -> bool {
        self.attempt_count == 0 && self.blocked_until.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub allowed: bool,
    pub remaining_block_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    StillOpen { attempts_remaining: u32 },
    Blocked {
        blocked_until: DateTime<Utc>,
        remaining_seconds: i64,
    },
}

impl GuardDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GuardDecision::Blocked { .. })
    }
}

pub fn lockout_delta() -> TimeDelta {
    TimeDelta::milliseconds(LOCKOUT_DURATION.as_millis() as i64)
}

/// Whole seconds left until `blocked_until`, rounded up. Zero once expired.
pub fn remaining_seconds(blocked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (blocked_until - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + 999) / 1000
    }
}

/// Formats a countdown as `mm:ss`.
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn check_allowed(state: &AttemptState, now: DateTime<Utc>) -> (Check, AttemptState) {
    match state.blocked_until {
        Some(until) if now < until => (
            Check {
                allowed: false,
                remaining_block_seconds: remaining_seconds(until, now),
            },
            state.clone(),
        ),
        // Lockout elapsed: the whole record resets
        Some(_) => (
            Check {
                allowed: true,
                remaining_block_seconds: 0,
            },
            AttemptState::default(),
        ),
        None => (
            Check {
                allowed: true,
                remaining_block_seconds: 0,
            },
            state.clone(),
        ),
    }
}

pub fn apply_failure(state: &AttemptState, now: DateTime<Utc>) -> (GuardDecision, AttemptState) {
    let (check, mut next) = check_allowed(state, now);

    if !check.allowed {
        if let Some(blocked_until) = next.blocked_until {
            return (
                GuardDecision::Blocked {
                    blocked_until,
                    remaining_seconds: check.remaining_block_seconds,
                },
                next,
            );
        }
    }

    next.attempt_count = next.attempt_count.saturating_add(1);

    if next.attempt_count >= MAX_FAILED_ATTEMPTS {
        let blocked_until = now + lockout_delta();
        next.blocked_until = Some(blocked_until);
        (
            GuardDecision::Blocked {
                blocked_until,
                remaining_seconds: LOCKOUT_DURATION.as_secs() as i64,
            },
            next,
        )
    } else {
        (
            GuardDecision::StillOpen {
                attempts_remaining: MAX_FAILED_ATTEMPTS - next.attempt_count,
            },
            next,
        )
    }
}

pub fn apply_success() -> AttemptState {
    AttemptState::default()
}
