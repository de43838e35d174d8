//! Logging seam for the state core and the router.
//!
//! Core log lines are built lazily and pass through a process-wide gate
//! before reaching `tracing`. The gate is set once at startup; when it is
//! closed no message string is ever constructed.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var naming a log file; when set, output goes there instead of stderr.
pub const LOG_FILE_ENV: &str = "STAGEHAND_LOG";

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Set the log gate. Only the first call has any effect.
///
/// Returns `false` if the gate was already set to a different value.
pub fn set_enabled(enabled: bool) -> bool {
    *ENABLED.get_or_init(|| enabled) == enabled
}

/// Whether core log lines are forwarded. Defaults to open.
pub fn enabled() -> bool {
    *ENABLED.get().unwrap_or(&true)
}

/// Forward a lazily built message to `tracing` if the gate is open.
pub fn log<F>(message: F)
where
    F: FnOnce() -> String,
{
    log_if(enabled(), message);
}

fn log_if<F>(enabled: bool, message: F) -> bool
where
    F: FnOnce() -> String,
{
    if !enabled {
        return false;
    }
    tracing::debug!(target: "stagehand", "{}", message());
    true
}

/// Log through the gate with `format!` syntax.
///
/// The arguments are only evaluated when the gate is open.
#[macro_export]
macro_rules! stagehand_log {
    ($($arg:tt)+) => {
        $crate::logging::log(|| format!($($arg)+))
    };
}

/// Initialize tracing for the CLI.
///
/// Logs go to stderr by default. Set `STAGEHAND_LOG` to a file path to log
/// to `{path}.{timestamp}.{pid}` instead, so concurrent runs never share a
/// file. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let Some(log_path) = std::env::var(LOG_FILE_ENV).ok() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    };

    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let unique_path = format!("{}.{}.{}", log_path, timestamp, pid);

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {}", unique_path);
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn closed_gate_never_builds_the_message() {
        let built = Cell::new(false);
        let forwarded = log_if(false, || {
            built.set(true);
            "never".to_string()
        });
        assert!(!forwarded);
        assert!(!built.get());
    }

    #[test]
    fn open_gate_builds_the_message_once() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::sink)
            .finish();
        let calls = Cell::new(0);

        let forwarded = tracing::subscriber::with_default(subscriber, || {
            log_if(true, || {
                calls.set(calls.get() + 1);
                "state change".to_string()
            })
        });

        assert!(forwarded);
        assert_eq!(calls.get(), 1);
    }
}
