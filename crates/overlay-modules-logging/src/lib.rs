use env_logger::{Builder, Env};
use log::debug;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Install the process logger.
///
/// `RUST_LOG` overrides `default_filter`. Returns `false` if a logger was
/// already installed; calling this more than once is harmless.
pub fn init(default_filter: &str) -> bool {
    let installed = Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .format_target(true)
        .is_test(false)
        .try_init()
        .is_ok();

    if installed {
        debug!(target: "logging", "logger.installed default_filter='{}'", default_filter);
    }
    installed
}

/// Logger for tests: output captured by the test harness.
pub fn init_for_tests() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
