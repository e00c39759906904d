use std::sync::atomic::{AtomicBool, Ordering};

/// Process health as seen by probe endpoints.
///
/// `live` starts `true`, `ready` starts `false` and turns `true` after the first
/// successful reconcile. Once a flag is forced to `false` it stays `false`
/// until the process restarts.
#[derive(Debug)]
pub struct Health {
    live: AtomicBool,
    ready: AtomicBool,
    not_ready_forced: AtomicBool,
}

impl Health {
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(false),
            not_ready_forced: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// No-op if readiness has been forced off.
    pub fn mark_ready(&self) {
        if !self.not_ready_forced.load(Ordering::Acquire) {
            self.ready.store(true, Ordering::Release);
        }
    }

    pub fn mark_not_ready(&self) {
        self.not_ready_forced.store(true, Ordering::Release);
        self.ready.store(false, Ordering::Release);
    }

    pub fn mark_not_live(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_values() {
        let health = Health::new();
        assert!(health.is_live());
        assert!(!health.is_ready());
    }

    #[test]
    fn ready_after_mark() {
        let health = Health::new();
        health.mark_ready();
        assert!(health.is_ready());
    }

    #[test]
    fn forced_not_ready_is_sticky() {
        let health = Health::new();
        health.mark_ready();
        health.mark_not_ready();
        health.mark_ready();
        assert!(!health.is_ready());
    }

    #[test]
    fn not_live_is_sticky() {
        let health = Health::new();
        health.mark_not_live();
        assert!(!health.is_live());
    }
}
