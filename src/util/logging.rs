use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initializes tracing/logging based on environment variables.
///
/// Events go to stderr and, when `log_file` is given, are appended to that file
/// without ANSI colours. Only the first call in a process installs the
/// subscriber; it returns `true` then and `false` on every later call.
pub fn init_tracing(log_file: Option<&Path>) -> bool {
    let mut installed = false;

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // stdout carries command output only
        let console = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(io::stderr);

        let file_layer = log_file.and_then(open_log_file).map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
        });

        installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .with(file_layer)
            .try_init()
            .is_ok();
    });

    installed
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create log directory {}: {}", parent.display(), e);
            return None;
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            None
        }
    }
}
