use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

struct CmdsetLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: LevelFilter,
    start: Instant,
}

impl CmdsetLogger {
    fn format(&self, record: &Record) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        format!(
            "[{elapsed:.3}s] [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for CmdsetLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record);
        // Handlers own stdout, keep logs on stderr
        eprintln!("{line}");

        if let Some(ref file) = self.file {
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Level filter from a `RUST_LOG`-style value, `Info` if absent or invalid
#[must_use]
pub fn filter_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Initialize the global logger. Must be called once before any logging.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), SetLoggerError> {
    let filter = filter_from(std::env::var("RUST_LOG").ok().as_deref());

    let logger = CmdsetLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from() {
        assert_eq!(filter_from(None), LevelFilter::Info);
        assert_eq!(filter_from(Some("debug")), LevelFilter::Debug);
        assert_eq!(filter_from(Some("TRACE")), LevelFilter::Trace);
        assert_eq!(filter_from(Some("nonsense")), LevelFilter::Info);
    }

    #[test]
    fn test_disabled_levels() {
        let logger = CmdsetLogger {
            file: None,
            filter: LevelFilter::Warn,
            start: Instant::now(),
        };
        let debug = Metadata::builder().level(log::Level::Debug).build();
        let error = Metadata::builder().level(log::Level::Error).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&error));
    }

    #[test]
    fn test_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmdset.log");
        let logger = CmdsetLogger {
            file: Some(Mutex::new(std::fs::File::create(&path).unwrap())),
            filter: LevelFilter::Debug,
            start: Instant::now(),
        };
        logger.log(
            &Record::builder()
                .level(log::Level::Debug)
                .target("cmdset::commands")
                .args(format_args!("Selected command 'build'"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[DEBUG] cmdset::commands: Selected command 'build'"));
    }
}
