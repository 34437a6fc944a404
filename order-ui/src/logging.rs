//! Logging setup for the order form binaries.
//!
//! Records go to stderr (so stdout stays free for payloads and summaries) and,
//! once [`enable_file_logging`] has been called, to an append-mode file. A
//! single reloadable [`EnvFilter`] is the ceiling for both outputs.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, reload};

use crate::config::LoggingConfig;

/// `<local time> <LEVEL> <file:line> <fields>`, coloured on a terminal.
struct LocalTimeFormat;

fn level_colour(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

impl<S, N> FormatEvent<S, N> for LocalTimeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if ansi {
            write!(
                writer,
                "\x1b[2m{now}\x1b[0m {}{:>5}\x1b[0m ",
                level_colour(meta.level()),
                meta.level()
            )?;
        } else {
            write!(writer, "{now} {:>5} ", meta.level())?;
        }

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = file.rsplit(['/', '\\']).next().unwrap_or(file);
            if ansi {
                write!(writer, "\x1b[36m{file}:{line}\x1b[0m ")?;
            } else {
                write!(writer, "{file}:{line} ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writer target for the file layer. Discards records while no file is set.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

type SetLevelFn = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;
type SetConsoleFn = Box<dyn Fn(bool) -> Result<()> + Send + Sync>;

static SET_LEVEL: OnceLock<SetLevelFn> = OnceLock::new();
static SET_CONSOLE: OnceLock<SetConsoleFn> = OnceLock::new();
static LOG_FILE: OnceLock<SharedFile> = OnceLock::new();

/// `RUST_LOG` if set, the configured level otherwise.
fn initial_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn reload_error(e: reload::Error) -> anyhow::Error {
    anyhow!("log filter reload failed: {e}")
}

/// Changes the active filter. Accepts a bare level or any `EnvFilter`
/// directive.
pub fn set_log_level(level: &str) -> Result<()> {
    match SET_LEVEL.get() {
        Some(set) => set(level),
        None => bail!("logging not initialized"),
    }
}

/// Shows or hides stderr output without affecting the log file.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    match SET_CONSOLE.get() {
        Some(set) => set(enabled),
        None => bail!("logging not initialized"),
    }
}

/// Starts appending records to `path`, replacing any file already open.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    match LOG_FILE.get() {
        Some(slot) => {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
            Ok(())
        }
        None => bail!("logging not initialized"),
    }
}

/// Installs the global subscriber on the first call. Later calls apply
/// `config`'s level, console and file settings to it, so logging can start
/// with defaults before the config file is read.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let shared: SharedFile = Arc::new(Mutex::new(None));

    if LOG_FILE.set(shared.clone()).is_ok() {
        let (level_filter, level_handle) = reload::Layer::new(initial_filter(&config.level));
        let (console_gate, console_handle) = reload::Layer::new(EnvFilter::new("trace"));

        let console_layer = tracing_subscriber::fmt::layer()
            .event_format(LocalTimeFormat)
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .with_filter(console_gate);

        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(LocalTimeFormat)
            .with_ansi(false)
            .with_writer(LogFile(shared));

        tracing_subscriber::registry()
            .with(level_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow!("cannot install log subscriber: {e}"))?;

        let _ = SET_LEVEL.set(Box::new(move |level: &str| {
            let filter = EnvFilter::try_new(level)
                .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;
            level_handle.reload(filter).map_err(reload_error)
        }));
        let _ = SET_CONSOLE.set(Box::new(move |enabled: bool| {
            let filter = EnvFilter::new(if enabled { "trace" } else { "off" });
            console_handle.reload(filter).map_err(reload_error)
        }));
    } else if std::env::var_os("RUST_LOG").is_none() {
        set_log_level(&config.level)?;
    }

    set_console_enabled(config.console)?;
    if let Some(file) = &config.file {
        enable_file_logging(file)?;
    }
    Ok(())
}
