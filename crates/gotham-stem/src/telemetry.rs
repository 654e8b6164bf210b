use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events follow `APP_LOG_LEVEL`; every other target stays at `warn`.
const SITE_TARGETS: [&str; 2] = ["gotham_stem", "gotham_stem_api"];
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directive: String, source: ParseError },
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directive, .. } => {
                write!(f, "log filter '{}' could not be parsed", directive)
            }
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// Directive applied when `RUST_LOG` is absent.
///
/// A bare level (`debug`) is scoped to the site crates. Anything containing a
/// target or a comma is taken verbatim so operators can still write full filters.
pub fn site_directive(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    std::iter::once(DEPENDENCY_LEVEL.to_string())
        .chain(SITE_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = site_directive(&config.log_level);
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::Filter { directive, source })
}

/// Installs the process-wide fmt subscriber used by the server and the CLI jobs.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
