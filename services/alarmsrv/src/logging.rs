//! Console logging for AlarmSrv
//!
//! Output format: `timestamp [LEVEL] module: message`, filtered by `RUST_LOG` when set
//! and by the configured level otherwise.

use std::fmt::Write as _;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Last path segment of an event target: `voltage_alarms::cache` -> `cache`
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Event formatter: `2025-12-02T00:50:44.809123Z [INFO] cache: Alarm cache restored`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let metadata = event.metadata();
        let level = *metadata.level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(
                writer,
                "{}{}\x1b[0m \x1b[2m{}:\x1b[0m ",
                color,
                format_level(&level),
                short_target(metadata.target())
            )?;
        } else {
            write!(
                writer,
                "{} {}: ",
                format_level(&level),
                short_target(metadata.target())
            )?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise `level` for everything plus
/// the engine crate.
pub fn build_filter(level: &str) -> EnvFilter {
    if let Ok(env_str) = std::env::var("RUST_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&env_str) {
            return filter;
        }
    }
    EnvFilter::try_new(format!("{level},voltage_alarms={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let console_layer = fmt::layer().event_format(BracketedLevelFormat);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer)
        .try_init()?;

    Ok(())
}
