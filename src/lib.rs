pub mod config;
pub mod models;
pub mod pipeline;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the host process.
///
/// `RUST_LOG` wins over the built-in filter. Safe to call more than once;
/// only the first call installs a subscriber.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} triage core v{}", config::APP_NAME, config::APP_VERSION);
    }
}
