//! Office timing and sizing.
//!
//! The defaults reproduce a small post office: three senders, an eight second
//! day, a worker that looks at the queue once a second, and shipments that
//! take a second and a half.

use core::time::Duration;

/// Number of producer sessions started by [`Office::open`](crate::Office::open).
pub const DEFAULT_PRODUCER_COUNT: usize = 3;

/// How long the office stays open.
pub const DEFAULT_SERVICE_WINDOW: Duration = Duration::from_secs(8);

/// Delay between two looks at the submission log by the worker. Also the bound
/// on how long the worker takes to notice closure.
pub const DEFAULT_WORKER_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Longest single wait for the counter.
pub const DEFAULT_GATE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Simulated work done by a producer after passing the counter.
pub const DEFAULT_SHIPPING_DURATION: Duration = Duration::from_millis(1500);

/// Pause before a producer retries a timed-out acquire.
pub const DEFAULT_PRODUCER_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// When a producer gives the counter back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum HandOff {
    /// Release right after the open-check, so the next producer can be served
    /// while this one ships.
    #[default]
    ReleaseAfterCheck,
    /// Hold the counter through shipping and recording; producers are served
    /// strictly one whole shipment at a time.
    HoldThroughShipping,
}

/// Configuration for an [`Office`](crate::Office).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OfficeConfig {
    pub producer_count: usize,
    pub service_window: Duration,
    pub worker_poll_interval: Duration,
    pub gate_acquire_timeout: Duration,
    pub shipping_duration: Duration,
    pub producer_retry_backoff: Duration,
    pub hand_off: HandOff,
    /// Consecutive acquire timeouts a producer tolerates while the office is
    /// open. `None` retries until the office closes.
    pub max_admission_attempts: Option<u32>,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            producer_count: DEFAULT_PRODUCER_COUNT,
            service_window: DEFAULT_SERVICE_WINDOW,
            worker_poll_interval: DEFAULT_WORKER_POLL_INTERVAL,
            gate_acquire_timeout: DEFAULT_GATE_ACQUIRE_TIMEOUT,
            shipping_duration: DEFAULT_SHIPPING_DURATION,
            producer_retry_backoff: DEFAULT_PRODUCER_RETRY_BACKOFF,
            hand_off: HandOff::default(),
            max_admission_attempts: None,
        }
    }
}
