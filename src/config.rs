//! Centralized engine configuration constants.
//!
//! Mirrors the normative values from the external interface spec (§6): frame
//! cadence, resize debounce/poll windows, and render failure backoff. Tests
//! construct a [`EngineConfig`] with compressed windows instead of patching
//! production constants.

use std::time::Duration;

/// Tunable timing knobs for the coordinator and renderer.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Target tick period for the render coordinator (~60 Hz).
    pub frame_period: Duration,
    /// Leading-edge debounce window applied to resize events.
    pub resize_debounce: Duration,
    /// Poll interval used while the signal-delivery path is unconfirmed.
    pub resize_poll_interval: Duration,
    /// Observation window used to decide whether SIGWINCH delivery works.
    pub signal_test_window: Duration,
    /// Consecutive render failures before a container is marked `ERROR`.
    pub render_failure_threshold: u32,
    /// Window within which consecutive failures count toward the threshold.
    pub render_failure_reset: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_period: Duration::from_nanos(16_000_000),
            resize_debounce: Duration::from_millis(80),
            resize_poll_interval: Duration::from_millis(100),
            signal_test_window: Duration::from_millis(2000),
            render_failure_threshold: 3,
            render_failure_reset: Duration::from_nanos(5_000_000_000),
        }
    }
}
