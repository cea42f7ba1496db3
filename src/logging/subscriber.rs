//! Tracing subscriber: styled console output and an appended log file.
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::field::Visit;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Target marking stage headers.
pub(super) const STAGE_TARGET: &str = "dotpilot::stage";
/// Target marking dry-run reports.
pub(super) const DRY_RUN_TARGET: &str = "dotpilot::dry_run";

/// Environment variable overriding the console filter (`EnvFilter` syntax).
const FILTER_ENV: &str = "DOTPILOT_LOG";

/// Location of the log file: `$XDG_STATE_HOME/dotpilot/dotpilot.log`, else
/// `~/.local/state/dotpilot/dotpilot.log`.
#[must_use]
pub fn log_file_path() -> Option<PathBuf> {
    let state = std::env::var_os("XDG_STATE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/state")))?;
    Some(state.join("dotpilot").join("dotpilot.log"))
}

fn message(event: &Event<'_>) -> String {
    #[derive(Default)]
    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

/// Layer appending every event to the log file, one timestamped line each.
#[derive(Debug)]
struct LogFile {
    file: Mutex<File>,
}

impl LogFile {
    /// Open `path` for appending and write a header for this run.
    fn open(path: &Path, command: &str) -> Option<Self> {
        fs::create_dir_all(path.parent()?).ok()?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()?;
        writeln!(
            file,
            "\n--- dotpilot {} {command} {} ---",
            crate::version(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z"),
        )
        .ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: Subscriber> Layer<S> for LogFile {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        let tag = match (*meta.level(), meta.target()) {
            (Level::INFO, STAGE_TARGET) => "==>",
            (Level::INFO, DRY_RUN_TARGET) => "DRY",
            (Level::ERROR, _) => "ERR",
            (Level::WARN, _) => "WRN",
            (Level::DEBUG | Level::TRACE, _) => "DBG",
            _ => "   ",
        };
        let ts = chrono::Local::now().format("%H:%M:%S");
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{ts} {tag} {}", message(event));
        }
    }
}

/// Console layout: bold stage headers, indented messages, coloured
/// warnings and errors.
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let msg = message(event);
        match (*meta.level(), meta.target()) {
            (Level::ERROR, _) => writeln!(writer, "\x1b[1;31merror:\x1b[0m {msg}"),
            (Level::WARN, _) => writeln!(writer, "\x1b[1;33mwarning:\x1b[0m {msg}"),
            (Level::INFO, STAGE_TARGET) => writeln!(writer, "\x1b[1;36m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            (Level::INFO, DRY_RUN_TARGET) => writeln!(writer, "  \x1b[35m[dry-run]\x1b[0m {msg}"),
            (Level::INFO, _) => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber.  Call once at startup.
///
/// Console verbosity is `info`, or `debug` with `verbose`; `$DOTPILOT_LOG`
/// overrides both.  Warnings and errors go to stderr, the rest to stdout.
/// The log file receives every event from `debug` up, headed by `command`.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(FILTER_ENV)
        .from_env_lossy();

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);
    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(writer)
        .with_filter(console_filter);

    let file = log_file_path()
        .and_then(|path| LogFile::open(&path, command))
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
}
