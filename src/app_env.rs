use anyhow::{Context, anyhow};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// URL for accessing the PostrgeSQL database (should contain a database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Address the HTTP server binds to. Defaults to [DEFAULT_LISTEN_ADDR]
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";

/// Secret used to sign session cookies. Must be at least 32 bytes long unless [LEGACY_AUTH] is enabled
pub const SESSION_SECRET: &str = "SESSION_SECRET";
/// Lifetime of a signed session cookie in seconds. Defaults to one day
pub const SESSION_TTL_SECS: &str = "SESSION_TTL_SECS";
/// When "true", login ignores passwords and the session cookie is the plaintext username.
/// Only meant for compatibility testing against clients of the old service
pub const LEGACY_AUTH: &str = "LEGACY_AUTH";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// How session cookies get issued and read
#[derive(Debug, PartialEq, Eq)]
pub enum SessionSettings {
    Signed { secret: Vec<u8>, ttl: Duration },
    Legacy,
}

/// Endpoints for exporting OpenTelemetry data
#[derive(Debug, PartialEq, Eq)]
pub struct OtelSettings {
    pub span_export_url: String,
    pub metric_export_url: String,
}

/// Everything the service reads from its environment on startup
#[derive(Debug)]
pub struct AppSettings {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub session: SessionSettings,
    pub otel: Option<OtelSettings>,
}

impl AppSettings {
    /// Reads settings from the process environment. Fails with the name of the first
    /// variable which is missing or malformed.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let database_url = lookup(DB_URL).ok_or_else(|| anyhow!("{DB_URL} must be set"))?;

        let listen_addr = lookup(LISTEN_ADDR)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned())
            .parse::<SocketAddr>()
            .with_context(|| format!("{LISTEN_ADDR} is not a valid socket address"))?;

        let legacy_auth = match lookup(LEGACY_AUTH) {
            None => false,
            Some(flag) => flag
                .trim()
                .parse::<bool>()
                .with_context(|| format!("{LEGACY_AUTH} must be \"true\" or \"false\""))?,
        };

        let session = if legacy_auth {
            SessionSettings::Legacy
        } else {
            let secret = lookup(SESSION_SECRET)
                .ok_or_else(|| anyhow!("{SESSION_SECRET} must be set unless {LEGACY_AUTH} is enabled"))?;
            let ttl = match lookup(SESSION_TTL_SECS) {
                None => DEFAULT_SESSION_TTL,
                Some(secs) => Duration::from_secs(
                    secs.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{SESSION_TTL_SECS} must be a number of seconds"))?,
                ),
            };

            SessionSettings::Signed {
                secret: secret.into_bytes(),
                ttl,
            }
        };

        let otel = match (lookup(OTEL_SPAN_EXPORT_URL), lookup(OTEL_METRIC_EXPORT_URL)) {
            (Some(span_export_url), Some(metric_export_url)) => Some(OtelSettings {
                span_export_url,
                metric_export_url,
            }),
            _ => None,
        };

        Ok(AppSettings {
            database_url,
            listen_addr,
            session,
            otel,
        })
    }
}
