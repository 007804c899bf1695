//! Subscriber installation

use std::str::FromStr;

use courier_domain::{CourierError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the console layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CourierError::config(format!("unknown log format: {other}"))),
        }
    }
}

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns [`CourierError::Configuration`] if a global subscriber is already
/// installed. The existing subscriber stays in place.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = match format {
        LogFormat::Pretty => fmt::layer().with_target(true).pretty().with_filter(filter()).boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(true)
            .json()
            .with_current_span(true)
            .with_filter(filter())
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| CourierError::config(format!("logging already initialised: {e}")))?;

    tracing::debug!(format = ?format, "logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn second_init_fails_without_replacing_subscriber() {
        // Only this test installs a subscriber in this binary.
        init_logging(LogFormat::Json).expect("first install succeeds");
        let second = init_logging(LogFormat::Pretty);
        assert!(matches!(second, Err(CourierError::Configuration(_))));
    }
}
