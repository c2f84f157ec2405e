//! Optional stage timing.
//!
//! A [`TimingGuard`] measures a scope and logs its duration on drop, but only
//! when telemetry was switched on through [`configure`] and the requested level
//! passes both the telemetry threshold and the logger's filter for [`TARGET`].

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Instant,
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target used for all timing output.
pub const TARGET: &str = "emotive::telemetry";

static ENABLED: AtomicBool = AtomicBool::new(false);
static THRESHOLD: AtomicUsize = AtomicUsize::new(0);

/// Scope timer; logs `"<label> completed in <duration>"` when dropped.
pub struct TimingGuard {
    label: &'static str,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Start timing a scope.
pub fn timing_guard(label: &'static str, level: Level) -> TimingGuard {
    let active = allows(level) && log_enabled!(target: TARGET, level);
    TimingGuard {
        label,
        level,
        start: Instant::now(),
        active,
    }
}

/// Switch telemetry on or off and set its maximum level.
pub fn configure(enabled: bool, level: LevelFilter) {
    ENABLED.store(enabled, Ordering::Relaxed);
    THRESHOLD.store(level as usize, Ordering::Relaxed);
}

fn allows(level: Level) -> bool {
    ENABLED.load(Ordering::Relaxed) && (level as usize) <= THRESHOLD.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_stays_inactive_when_disabled_or_above_threshold() {
        configure(false, LevelFilter::Trace);
        assert!(!timing_guard("off", Level::Error).is_active());

        configure(true, LevelFilter::Info);
        assert!(!allows(Level::Debug));
        assert!(allows(Level::Info));
        configure(false, LevelFilter::Off);
    }
}
