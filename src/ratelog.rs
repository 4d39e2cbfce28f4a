use std::fmt::Display;
use tracing::{info, warn};

/// Lets the first `limit` events through and counts the rest.
///
/// One instance per entity and event kind, so a flood of failures on one
/// table never hides the first few on another.
#[derive(Debug, Clone)]
pub struct FirstN {
    limit: u32,
    seen: u32,
}

impl FirstN {
    pub fn new(limit: u32) -> Self {
        Self { limit, seen: 0 }
    }

    /// Records one event; returns whether it should be logged in detail.
    pub fn allow(&mut self) -> bool {
        self.seen = self.seen.saturating_add(1);
        self.seen <= self.limit
    }

    pub fn seen(&self) -> u32 {
        self.seen
    }

    pub fn suppressed(&self) -> u32 {
        self.seen.saturating_sub(self.limit)
    }

    /// `logFirstN` for warnings.
    pub fn warn(&mut self, entity: &str, message: impl Display) {
        if self.allow() {
            warn!(entity, "{message}");
        }
    }

    /// `logFirstN` for informational notices.
    pub fn info(&mut self, entity: &str, message: impl Display) {
        if self.allow() {
            info!(entity, "{message}");
        }
    }

    /// Emits the "additional … suppressed" line if anything was held back.
    pub fn summarize(&self, entity: &str, what: &str) {
        let suppressed = self.suppressed();
        if suppressed > 0 {
            warn!(entity, suppressed, "{suppressed} additional {what} suppressed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_exactly_limit() {
        let mut log = FirstN::new(5);
        let allowed = (0..12).filter(|_| log.allow()).count();
        assert_eq!(allowed, 5);
        assert_eq!(log.seen(), 12);
        assert_eq!(log.suppressed(), 7);
    }

    #[test]
    fn nothing_suppressed_under_limit() {
        let mut log = FirstN::new(5);
        log.allow();
        log.allow();
        assert_eq!(log.suppressed(), 0);
    }

    #[test]
    fn zero_limit_suppresses_everything() {
        let mut log = FirstN::new(0);
        assert!(!log.allow());
        assert_eq!(log.suppressed(), 1);
    }

    #[test]
    fn warn_counts_like_allow() {
        let mut log = FirstN::new(2);
        for i in 0..4 {
            log.warn("seat", format!("failure {i}"));
        }
        assert_eq!(log.seen(), 4);
        assert_eq!(log.suppressed(), 2);
        log.summarize("seat", "errors");
    }
}
