use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use wicket::{HandOff, OfficeConfig};

/// Runtime configuration for the `wicket-sim` binary.
///
/// Every value can come from a CLI flag or an environment variable (a `.env`
/// file is loaded first). Defaults describe the classic small post office:
/// three senders and an eight second day.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wicket-sim",
    version,
    about = "Simulates a post office day: senders, one counter, one postal worker"
)]
pub struct CliArgs {
    /// Number of sender sessions started when the office opens.
    ///
    /// Environment variable: `PRODUCER_COUNT`
    #[arg(long, env = "PRODUCER_COUNT", default_value_t = 3)]
    pub producer_count: usize,

    /// How long the office stays open, in milliseconds. Ctrl+C or SIGTERM
    /// close it early.
    ///
    /// Environment variable: `SERVICE_WINDOW_MS`
    #[arg(long, env = "SERVICE_WINDOW_MS", default_value_t = 8_000)]
    pub service_window_ms: u64,

    /// Delay between two looks at the submission log by the postal worker, in
    /// milliseconds. Also bounds how long the worker takes to notice closing.
    ///
    /// Environment variable: `WORKER_POLL_MS`
    #[arg(long, env = "WORKER_POLL_MS", default_value_t = 1_000)]
    pub worker_poll_ms: u64,

    /// Longest single wait for the counter, in milliseconds.
    ///
    /// Environment variable: `GATE_TIMEOUT_MS`
    #[arg(long, env = "GATE_TIMEOUT_MS", default_value_t = 1_000)]
    pub gate_timeout_ms: u64,

    /// Time a sender spends shipping after passing the counter, in
    /// milliseconds.
    ///
    /// Environment variable: `SHIPPING_MS`
    #[arg(long, env = "SHIPPING_MS", default_value_t = 1_500)]
    pub shipping_ms: u64,

    /// Pause before a sender retries a timed-out counter wait, in milliseconds.
    ///
    /// Environment variable: `RETRY_BACKOFF_MS`
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// When a sender gives the counter back.
    ///
    /// Environment variable: `HAND_OFF`
    #[arg(long, env = "HAND_OFF", value_enum, default_value_t = HandOffArg::ReleaseAfterCheck)]
    pub hand_off: HandOffArg,

    /// Consecutive counter timeouts a sender tolerates before leaving. Unset
    /// means retry until closing time.
    ///
    /// Environment variable: `MAX_ADMISSION_ATTEMPTS`
    #[arg(long, env = "MAX_ADMISSION_ATTEMPTS")]
    pub max_admission_attempts: Option<u32>,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOffArg {
    /// Release the counter right after the open-check.
    ReleaseAfterCheck,
    /// Keep the counter through shipping and recording.
    HoldThroughShipping,
}

impl From<HandOffArg> for HandOff {
    fn from(arg: HandOffArg) -> Self {
        match arg {
            HandOffArg::ReleaseAfterCheck => Self::ReleaseAfterCheck,
            HandOffArg::HoldThroughShipping => Self::HoldThroughShipping,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub office: OfficeConfig,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.worker_poll_ms == 0 {
            bail!("WORKER_POLL_MS must be greater than 0");
        }

        if args.gate_timeout_ms == 0 {
            bail!("GATE_TIMEOUT_MS must be greater than 0");
        }

        if args.max_admission_attempts == Some(0) {
            bail!("MAX_ADMISSION_ATTEMPTS must be at least 1 when set");
        }

        Ok(Self {
            office: OfficeConfig {
                producer_count: args.producer_count,
                service_window: Duration::from_millis(args.service_window_ms),
                worker_poll_interval: Duration::from_millis(args.worker_poll_ms),
                gate_acquire_timeout: Duration::from_millis(args.gate_timeout_ms),
                shipping_duration: Duration::from_millis(args.shipping_ms),
                producer_retry_backoff: Duration::from_millis(args.retry_backoff_ms),
                hand_off: args.hand_off.into(),
                max_admission_attempts: args.max_admission_attempts,
            },
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> CliArgs {
        let args = ["wicket-sim"].iter().chain(extra);
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_match_the_library() {
        let config = SimConfig::try_from(parse(&[])).unwrap();
        assert_eq!(config.office, OfficeConfig::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn flags_override_defaults() {
        let config = SimConfig::try_from(parse(&[
            "--producer-count",
            "7",
            "--shipping-ms",
            "20",
            "--hand-off",
            "hold-through-shipping",
            "--max-admission-attempts",
            "2",
            "--log-format",
            "json",
        ]))
        .unwrap();

        assert_eq!(config.office.producer_count, 7);
        assert_eq!(config.office.shipping_duration, Duration::from_millis(20));
        assert_eq!(config.office.hand_off, HandOff::HoldThroughShipping);
        assert_eq!(config.office.max_admission_attempts, Some(2));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = SimConfig::try_from(parse(&["--worker-poll-ms", "0"])).unwrap_err();
        assert!(err.to_string().contains("WORKER_POLL_MS"));
    }

    #[test]
    fn rejects_zero_gate_timeout() {
        assert!(SimConfig::try_from(parse(&["--gate-timeout-ms", "0"])).is_err());
    }

    #[test]
    fn rejects_zero_attempts() {
        assert!(SimConfig::try_from(parse(&["--max-admission-attempts", "0"])).is_err());
    }
}
