//! Tracing subscriber setup and custom formatters.

use std::fs::File;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::error::{ExporterError, Result};

// Custom time formatter for logs: "YYYY-MM-DD HH:MM:SS" (local time)
pub struct LocalTimeFormatter;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        #[cfg(unix)]
        unsafe {
            let now = libc::time(std::ptr::null_mut());
            let mut tm: libc::tm = std::mem::zeroed();
            libc::localtime_r(&now, &mut tm);

            write!(w, "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                tm.tm_year + 1900,
                tm.tm_mon + 1,
                tm.tm_mday,
                tm.tm_hour,
                tm.tm_min,
                tm.tm_sec)
        }

        #[cfg(not(unix))]
        {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
        }
    }
}

// Custom event formatter for logs: "YYYY-MM-DD HH:MM:SS [LEVEL] message"
pub struct CustomEventFormat {
    /// Colour the level tag; off for log files
    pub ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CustomEventFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        use tracing_subscriber::fmt::time::FormatTime;

        LocalTimeFormatter.format_time(&mut writer)?;
        write!(writer, " ")?;

        let level = event.metadata().level();
        if self.ansi {
            let level_color = match *level {
                tracing::Level::TRACE => "\x1b[2m",  // Dim/gray
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::ERROR => "\x1b[31m", // Red
            };
            write!(writer, "{}[{}]\x1b[0m ", level_color, level)?;
        } else {
            write!(writer, "[{}] ", level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over `filter` when set.
/// With `log_file`, events are also written (uncoloured) to that file, which
/// is truncated first.
pub fn init_tracing(filter: &str, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| ExporterError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .fmt_fields(tracing_subscriber::fmt::format::DefaultFields::new())
                    .event_format(CustomEventFormat { ansi: false }),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false) // Hide the target (crate name)
                .fmt_fields(tracing_subscriber::fmt::format::DefaultFields::new())
                .event_format(CustomEventFormat { ansi: true }),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("exporter.log");
        let err = init_tracing("info", Some(&path)).unwrap_err();
        assert!(matches!(err, ExporterError::LogFile { .. }));
    }
}
