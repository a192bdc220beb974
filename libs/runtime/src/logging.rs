//! Logging bootstrap.
//!
//! Every `logging.<name>` section claims the tracing targets under `<name>`
//! (`user_records` covers `user_records::domain::service`); `default` takes the
//! rest. Each section has its own console level, and a JSON file with its own
//! level, rotated by size.

use crate::config::{LoggingConfig, Section};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::FilterFn, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// Unknown names fall back to `info`; an empty file level means "same as console".
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn claims(prefix: &str, target: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).flush()
    }
}

/// Resolved settings for one section.
struct Route {
    prefix: Option<String>,
    console: LevelFilter,
    file: LevelFilter,
    writer: Option<RotWriter>,
}

/// Target → section lookup shared by the console and file layers.
struct Routes {
    claimed: Vec<Route>,
    fallback: Route,
}

impl Routes {
    fn build(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let mut claimed: Vec<Route> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| Route::new(Some(name.clone()), section, base_dir))
            .collect();
        // longest prefix wins: `user_records::infra` before `user_records`
        claimed.sort_by_key(|r| std::cmp::Reverse(r.prefix.as_ref().map_or(0, String::len)));

        let fallback = match cfg.get(DEFAULT_SECTION) {
            Some(section) => Route::new(None, section, base_dir),
            None => Route {
                prefix: None,
                console: LevelFilter::INFO,
                file: LevelFilter::OFF,
                writer: None,
            },
        };
        Self { claimed, fallback }
    }

    fn route_for(&self, target: &str) -> &Route {
        self.claimed
            .iter()
            .find(|r| r.prefix.as_deref().is_some_and(|p| claims(p, target)))
            .unwrap_or(&self.fallback)
    }

    fn has_files(&self) -> bool {
        self.fallback.writer.is_some() || self.claimed.iter().any(|r| r.writer.is_some())
    }
}

impl Route {
    fn new(prefix: Option<String>, section: &Section, base_dir: &Path) -> Self {
        let console = parse_level(&section.console_level);
        let file = if section.file_level.trim().is_empty() {
            console
        } else {
            parse_level(&section.file_level)
        };
        let name = prefix.as_deref().unwrap_or(DEFAULT_SECTION);
        let writer = open_section_file(name, section, base_dir);
        Self {
            prefix,
            console,
            file,
            writer,
        }
    }
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

/// Delete rotated siblings of `log_path` (`<name>.<suffix>`) older than `max_age`.
fn prune_rotated(log_path: &Path, max_age: Duration) -> std::io::Result<usize> {
    let name = log_path.file_name().and_then(|n| n.to_str());
    let (Some(dir), Some(name)) = (log_path.parent(), name) else {
        return Ok(0);
    };
    let rotated_prefix = format!("{name}.");
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if !file_name.to_string_lossy().starts_with(&rotated_prefix) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);

    // No subscriber exists yet; stderr is the only channel for these.
    let writer = match open_rotating(&log_path, max_bytes as usize, max_backups) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("log section '{name}': cannot open {}: {e}", log_path.display());
            return None;
        }
    };
    if let Some(days) = section.max_age_days {
        let max_age = Duration::from_secs(u64::from(days) * 24 * 60 * 60);
        if let Err(e) = prune_rotated(&log_path, max_age) {
            eprintln!("log section '{name}': pruning old files failed: {e}");
        }
    }
    Some(writer)
}

/// `MakeWriter` that picks the file of the section owning the event's target.
#[derive(Clone)]
struct FileRouter(Arc<Routes>);

enum RoutedWriter {
    File(RotWriter),
    Discard,
}

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            RoutedWriter::File(w) => w.write(buf),
            RoutedWriter::Discard => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            RoutedWriter::File(w) => w.flush(),
            RoutedWriter::Discard => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .fallback
            .writer
            .clone()
            .map_or(RoutedWriter::Discard, RoutedWriter::File)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        self.0
            .route_for(meta.target())
            .writer
            .clone()
            .map_or(RoutedWriter::Discard, RoutedWriter::File)
    }
}

/// Install the global subscriber.
///
/// Relative `file` paths are resolved against `base_dir` (the server home).
/// Calling this twice is harmless; the second subscriber is not installed.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    let _ = tracing_log::LogTracer::init();

    let routes = Arc::new(Routes::build(cfg, base_dir));

    let console_routes = routes.clone();
    let console = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(FilterFn::new(move |meta: &tracing::Metadata<'_>| {
            *meta.level() <= console_routes.route_for(meta.target()).console
        }));

    let files = routes.has_files().then(|| {
        let file_routes = routes.clone();
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(FileRouter(routes.clone()))
            .with_filter(FilterFn::new(move |meta: &tracing::Metadata<'_>| {
                let route = file_routes.route_for(meta.target());
                route.writer.is_some() && *meta.level() <= route.file
            }))
    });

    let _ = Registry::default().with(console).with(files).try_init();
}
