use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "mlb_features=info";

/// Console logging for the binaries. `RUST_LOG` overrides the default
/// `mlb_features=info`. Safe to call more than once.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
