//! Console line format
//!
//! `2024-05-01 12:00:00 UTC - INF - [collector:1] - message key=value`

use std::fmt;

use chrono::Utc;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::LogLevel;

/// Timestamp layout used on console and file output
pub const CONSOLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Tag written for a tracing level
pub fn level_tag(level: &tracing::Level) -> &'static str {
    if *level == tracing::Level::TRACE {
        "TRC"
    } else {
        LogLevel::from_tracing(level).abbreviation()
    }
}

/// Event formatter prefixing every line with the worker identity
#[derive(Debug, Clone)]
pub struct ConsoleFormat {
    worker_name: String,
}

impl ConsoleFormat {
    pub fn new(service_name: &str, worker_id: u32) -> Self {
        Self {
            worker_name: format!("{}:{}", service_name, worker_id),
        }
    }

    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }

    fn write_prefix(&self, writer: &mut Writer<'_>, level: &tracing::Level) -> fmt::Result {
        write!(
            writer,
            "{} - {} - [{}] - ",
            Utc::now().format(CONSOLE_TIME_FORMAT),
            level_tag(level),
            self.worker_name
        )
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.write_prefix(&mut writer, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_name_includes_id() {
        let format = ConsoleFormat::new("collector", 3);
        assert_eq!(format.worker_name(), "collector:3");
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(&tracing::Level::TRACE), "TRC");
        assert_eq!(level_tag(&tracing::Level::DEBUG), "DBG");
        assert_eq!(level_tag(&tracing::Level::INFO), "INF");
        assert_eq!(level_tag(&tracing::Level::WARN), "WRN");
        assert_eq!(level_tag(&tracing::Level::ERROR), "ERR");
    }

    #[test]
    fn test_prefix_layout() {
        let format = ConsoleFormat::new("svc", 1);
        let mut out = String::new();
        format
            .write_prefix(&mut Writer::new(&mut out), &tracing::Level::WARN)
            .unwrap();

        assert!(out.ends_with(" UTC - WRN - [svc:1] - "));
        // "YYYY-mm-dd HH:MM:SS" is 19 characters
        assert_eq!(&out[4..5], "-");
        assert_eq!(&out[19..23], " UTC");
    }
}
