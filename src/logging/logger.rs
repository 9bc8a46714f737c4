//! Metadata-prefixed leveled logger.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::context::{ContextStore, RequestMetadata};

/// Logger construction options.
#[derive(Debug, Clone, Default)]
pub struct LoggerOptions {
    /// Write straight to stdout/stderr instead of the `tracing` sink.
    pub console_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Console destinations: debug/info go to `out`, warn/error to `err`.
struct ConsoleWriters {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl ConsoleWriters {
    fn std() -> Self {
        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
        }
    }

    fn write_line(&mut self, level: Level, line: &str) {
        let writer = match level {
            Level::Debug | Level::Info => &mut self.out,
            Level::Warn | Level::Error => &mut self.err,
        };
        let _ = writeln!(writer, "{}", line).and_then(|()| writer.flush());
    }
}

/// Named logger that tags every line with the current unit's metadata.
///
/// Lines look like `[requestId=abc;tenant=7] message`. Logging never fails:
/// sink and console write errors are swallowed, which is what lets the
/// collector report its own failures through a `Logger`.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    console: Option<Arc<Mutex<ConsoleWriters>>>,
    store: Arc<ContextStore>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("console_output", &self.console.is_some())
            .finish()
    }
}

impl Logger {
    /// Create a logger bound to the process-wide [`ContextStore`].
    pub fn new(name: &str, options: LoggerOptions) -> Self {
        Self::with_store(name, options, ContextStore::global())
    }

    /// Create a logger bound to a specific store.
    pub fn with_store(name: &str, options: LoggerOptions, store: Arc<ContextStore>) -> Self {
        let console = options
            .console_output
            .then(|| Arc::new(Mutex::new(ConsoleWriters::std())));
        Self {
            name: Arc::from(name),
            console,
            store,
        }
    }

    /// Write console output to `out` (debug/info) and `err` (warn/error)
    /// instead of stdout and stderr. Enables console output.
    pub fn with_console<O, E>(mut self, out: O, err: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        self.console = Some(Arc::new(Mutex::new(ConsoleWriters {
            out: Box::new(out),
            err: Box::new(err),
        })));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current metadata, for attaching to externally reported errors.
    pub fn metadata(&self) -> RequestMetadata {
        self.store.get_metadata()
    }

    /// Replace the current unit's metadata.
    pub fn set_metadata(&self, metadata: RequestMetadata) {
        self.store.set_metadata(metadata);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn log(&self, level: Level, message: &str) {
        let line = format!("{}{}", self.metadata().log_prefix(), message);

        if let Some(console) = &self.console {
            let formatted = format!("{} {} {}", self.name, level.as_str(), line);
            console
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_line(level, &formatted);
            return;
        }

        match level {
            Level::Debug => tracing::debug!(logger = %self.name, "{}", line),
            Level::Info => tracing::info!(logger = %self.name, "{}", line),
            Level::Warn => tracing::warn!(logger = %self.name, "{}", line),
            Level::Error => tracing::error!(logger = %self.name, "{}", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::scope;
    use crate::testing::{capture_logs, CapturedLogs};

    fn isolated(name: &str) -> Logger {
        Logger::with_store(name, LoggerOptions::default(), Arc::new(ContextStore::new()))
    }

    #[tokio::test]
    async fn test_lines_carry_scoped_metadata() {
        let (logs, _guard) = capture_logs();
        let logger = isolated("orders");

        scope(async {
            logger.set_metadata(RequestMetadata::new().with("orderId", 42).with("vip", true));
            logger.info("order accepted");
            logger.error("payment declined");
        })
        .await;

        let output = logs.contents();
        assert!(output.contains("INFO"));
        assert!(output.contains("[orderId=42;vip=true] order accepted"));
        assert!(output.contains("[orderId=42;vip=true] payment declined"));
        assert!(output.contains("logger=orders"));
    }

    #[test]
    fn test_empty_metadata_has_no_prefix() {
        let (logs, _guard) = capture_logs();
        let logger = isolated("bare");

        logger.warn("disk almost full");

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("disk almost full"));
        assert!(!output.contains('['));
    }

    #[test]
    fn test_metadata_is_exposed() {
        let (_logs, _guard) = capture_logs();
        let logger = isolated("script");
        logger.set_metadata(RequestMetadata::new().with("job", "backfill"));

        assert_eq!(
            logger.metadata().get("job").map(ToString::to_string),
            Some("backfill".to_string())
        );
    }

    #[tokio::test]
    async fn test_console_output_splits_streams_by_level() {
        let (logs, _guard) = capture_logs();
        let (out, err) = (CapturedLogs::default(), CapturedLogs::default());
        let logger = isolated("console").with_console(out.clone(), err.clone());

        scope(async {
            logger.set_metadata(RequestMetadata::new().with("job", 7));
            logger.debug("starting");
            logger.info("working");
            logger.warn("slow");
            logger.error("failed");
        })
        .await;

        assert_eq!(
            out.contents(),
            "console DEBUG [job=7] starting\nconsole INFO [job=7] working\n"
        );
        assert_eq!(
            err.contents(),
            "console WARN [job=7] slow\nconsole ERROR [job=7] failed\n"
        );
        // Nothing reaches the tracing sink.
        assert!(logs.contents().is_empty());
    }

    #[test]
    fn test_console_option_selects_std_streams() {
        let console = Logger::with_store(
            "console",
            LoggerOptions { console_output: true },
            Arc::new(ContextStore::new()),
        );
        assert!(console.console.is_some());
        assert!(isolated("sink").console.is_none());
    }
}
