use tracing_subscriber::EnvFilter;

use roundfsm_config::{LogFormat, LogLevel};

/// Install the global subscriber. `RUST_LOG` takes precedence over `log_level`.
pub fn init(log_level: LogLevel, log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match log_format {
        LogFormat::Plaintext => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if let Err(e) = result {
        eprintln!("Failed to install the logger: {e}");
    }
}

/// Directive applied to the roundfsm crates, other crates only log warnings.
pub fn default_directive(log_level: LogLevel) -> String {
    format!("warn,roundfsm={log_level}")
}
