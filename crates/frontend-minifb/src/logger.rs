use log::{set_logger, set_max_level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/* set_logger wants a 'static reference, so keep one instance per level
around instead of leaking a boxed logger. */

static OFF_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Off);
static ERROR_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Error);
static WARN_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Warn);
static INFO_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Info);
static DEBUG_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Debug);
static TRACE_LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Trace);

/// Simple logger that writes `LEVEL:target -- message` lines to stderr.
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub const fn new(level: LevelFilter) -> Self {
        StderrLogger { level }
    }

    pub fn init(log_level: LevelFilter) -> Result<(), SetLoggerError> {
        set_max_level(log_level);
        let logger: &'static dyn Log = match log_level {
            LevelFilter::Off => &OFF_LOGGER,
            LevelFilter::Error => &ERROR_LOGGER,
            LevelFilter::Warn => &WARN_LOGGER,
            LevelFilter::Info => &INFO_LOGGER,
            LevelFilter::Debug => &DEBUG_LOGGER,
            LevelFilter::Trace => &TRACE_LOGGER,
        };
        set_logger(logger)
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}:{} -- {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
