//! Haptic feedback port.
//!
//! The session calls [`HapticPort::pulse`] once per phase entry while haptics
//! are enabled. Implementations must not block and must swallow their own
//! failures: a missing vibration motor degrades to no pulse, never to an
//! interrupted breathing cycle.

use std::sync::Arc;

/// Capability to fire a single haptic pulse.
pub trait HapticPort: Send + Sync {
    fn pulse(&self);
}

/// Device without haptic hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticPort for NoHaptics {
    fn pulse(&self) {}
}

/// Records pulses in the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHaptics;

impl HapticPort for TracingHaptics {
    fn pulse(&self) {
        tracing::debug!("haptic pulse");
    }
}

impl<T: HapticPort + ?Sized> HapticPort for Arc<T> {
    fn pulse(&self) {
        (**self).pulse()
    }
}

impl<T: HapticPort + ?Sized> HapticPort for Box<T> {
    fn pulse(&self) {
        (**self).pulse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl HapticPort for Counter {
        fn pulse(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn arc_forwards_to_inner() {
        let counter = Arc::new(Counter::default());
        let port: Box<dyn HapticPort> = Box::new(Arc::clone(&counter));
        port.pulse();
        port.pulse();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_capability_is_silent() {
        NoHaptics.pulse();
        TracingHaptics.pulse();
    }
}
