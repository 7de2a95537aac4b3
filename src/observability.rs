// In: src/observability.rs

//! Logger setup for applications that do not install their own `log` backend.
//!
//! The library itself only emits through the `log` facade: run-state transitions
//! at `info`, kind mismatches and shape warnings at `warn`, solver failures at
//! `error`. Solver console lines go to `LogSink` under the `kwave::solver` target.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `info` level printing `[LEVEL] message`.
///
/// With `log_file`, records are appended to that file instead of stderr. If
/// the file cannot be opened, logging stays on stderr and the failure is
/// reported there. Only the first call has any effect, and a logger installed
/// by someone else is left in place.
pub fn enable_verbose_logging(log_file: Option<PathBuf>) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        let mut open_failure = None;
        if let Some(path) = log_file {
            match OpenOptions::new().append(true).create(true).open(&path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => open_failure = Some((path, e)),
            }
        }

        if builder.try_init().is_ok() {
            if let Some((path, e)) = open_failure {
                log::warn!("Could not open log file {}: {}. Logging to stderr", path.display(), e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_verbose_logging_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("kwave.log");

        enable_verbose_logging(Some(log_path.clone()));
        // Second call is a no-op, even with an unusable path.
        enable_verbose_logging(Some(dir.path().join("missing").join("x.log")));

        // Another test may have installed a logger first; the file is only
        // created when ours won the race.
        if log::max_level() == LevelFilter::Info && log_path.exists() {
            log::info!("observability smoke test");
            log::logger().flush();
            let text = std::fs::read_to_string(&log_path).unwrap();
            assert!(text.contains("[INFO] observability smoke test"));
        }
    }
}
