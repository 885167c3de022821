//! Logging init: `$XDG_STATE_HOME/ismdl/ismdl.log`, or stderr when that fails.
//!
//! A single fragment run can log thousands of per-fragment lines, so the file
//! is rotated to `ismdl.log.1` once it passes `ROTATE_BYTES`.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,ismdl=debug,ismdl_core=debug";
const LOG_FILE: &str = "ismdl.log";
const ROTATE_BYTES: u64 = 8 * 1024 * 1024;

/// Per-event writer: a clone of the log file handle, or stderr if cloning fails.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedLogFile(fs::File);

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Moves `path` to `<path>.1` when it has grown past `limit` bytes.
/// Returns true if a rotation happened.
fn rotate_if_large(path: &Path, limit: u64) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() >= limit => {
            let mut rotated = path.as_os_str().to_owned();
            rotated.push(".1");
            fs::rename(path, &rotated)
                .with_context(|| format!("rotate {}", path.display()))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Opens (rotating first if needed) the log file inside `dir`.
fn open_log_file(dir: &Path) -> Result<(PathBuf, fs::File, bool)> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let rotated = rotate_if_large(&path, ROTATE_BYTES)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok((path, file, rotated))
}

/// Initialize structured logging to the XDG state log file.
/// On failure (e.g. log dir unwritable) returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ismdl")?;
    let (path, file, rotated) = open_log_file(&xdg_dirs.get_state_home())?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_writer(BoxMakeWriter::new(SharedLogFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init: {}", e))?;

    tracing::info!(log = %path.display(), rotated, "ismdl logging initialized");
    Ok(path)
}

/// Stderr-only logging at `warn`, for when `init_logging` fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_log_is_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        fs::write(&path, b"line\n").unwrap();
        assert!(!rotate_if_large(&path, 1024).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn large_log_moves_to_dot_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        fs::write(&path, vec![b'x'; 2048]).unwrap();
        assert!(rotate_if_large(&path, 1024).unwrap());
        assert!(!path.exists());
        assert_eq!(fs::read(dir.path().join("ismdl.log.1")).unwrap().len(), 2048);
    }

    #[test]
    fn missing_log_is_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!rotate_if_large(&dir.path().join(LOG_FILE), 0).unwrap());
    }

    #[test]
    fn open_log_file_creates_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state").join("ismdl");
        let (path, _file, rotated) = open_log_file(&state).unwrap();
        assert_eq!(path, state.join(LOG_FILE));
        assert!(path.exists());
        assert!(!rotated);
    }
}
