use amtconfig::Config;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
///
/// `-v` flags win over the configured level: `-v` debug, `-vv` and more trace.
pub fn default_directive(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber, logs go to stderr so stdout stays JSON
pub fn init_tracing(verbose: u8, config: &Config) {
    let configured = config
        .get_log_min_level()
        .unwrap_or_else(|_| "INFO".to_string());
    let directive = default_directive(verbose, &configured);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(config.get_log_ansi().unwrap_or(true))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
