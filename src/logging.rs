use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to compact output with a warning on stderr
    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "compact" | "text" => Self::Compact,
            _ => {
                eprintln!(
                    "WARN: Invalid log format '{}', defaulting to 'pretty'. Valid options: json, pretty",
                    name
                );
                Self::Compact
            }
        }
    }
}

/// Installs the global subscriber writing to stderr. Stdout only carries the
/// check result line.
pub fn init(log_format: &str, log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let format = LogFormat::from_name(log_format);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_target(true)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    tracing::debug!(format = ?format, level = log_level, "Logging initialized");
}
