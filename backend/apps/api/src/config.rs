//! Environment Configuration
//!
//! Builds `AuthConfig` from environment variables once at startup.

use anyhow::{Context, bail};
use auth::application::config::HashCost;
use auth::{AuthConfig, MailConfig};
use base64::Engine;
use base64::engine::general_purpose;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

/// Ten years
const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("{name} is invalid")))
        .transpose()
}

/// Decode a base64 (standard alphabet) 32-byte secret
pub fn decode_secret(secret_b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .context("AUTH_TOKEN_SECRET is not valid base64")?;
    let Ok(secret) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!("AUTH_TOKEN_SECRET must decode to 32 bytes (got {})", bytes.len());
    };
    Ok(secret)
}

/// Bound the token lifetime so expiry timestamps stay representable
pub fn token_ttl(secs: Option<u64>) -> anyhow::Result<Option<Duration>> {
    match secs {
        Some(secs) if secs > MAX_TOKEN_TTL_SECS => {
            bail!("AUTH_TOKEN_TTL_SECS must be at most {MAX_TOKEN_TTL_SECS} (got {secs})")
        }
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    addr.parse().with_context(|| format!("BIND_ADDR {addr} is invalid"))
}

pub fn auth_config() -> anyhow::Result<AuthConfig> {
    let base = match var("AUTH_TOKEN_SECRET") {
        Some(secret) => AuthConfig {
            token_secret: decode_secret(&secret)?,
            ..AuthConfig::default()
        },
        None if cfg!(debug_assertions) => {
            tracing::warn!("AUTH_TOKEN_SECRET not set, using a random secret");
            AuthConfig::with_random_secret()
        }
        None => bail!("AUTH_TOKEN_SECRET must be set in production"),
    };

    let mut config = base.with_token_ttl(token_ttl(parse_var("AUTH_TOKEN_TTL_SECS")?)?);

    if let Some(header) = var("AUTH_TOKEN_HEADER") {
        config = config.with_token_header(header.trim().to_ascii_lowercase());
    }

    let default_cost = HashCost::default();
    config = config.with_password_cost(HashCost {
        memory_kib: parse_var("AUTH_ARGON2_MEMORY_KIB")?.unwrap_or(default_cost.memory_kib),
        iterations: parse_var("AUTH_ARGON2_ITERATIONS")?.unwrap_or(default_cost.iterations),
        parallelism: parse_var("AUTH_ARGON2_PARALLELISM")?.unwrap_or(default_cost.parallelism),
    });
    // Reject bad cost at startup rather than on the first signup
    config
        .password_cost
        .params()
        .context("Argon2 cost parameters are invalid")?;

    config.password_pepper = var("AUTH_PASSWORD_PEPPER").map(String::into_bytes);

    match (var("MAIL_API_BASE_URL"), var("MAIL_API_KEY"), var("MAIL_FROM")) {
        (Some(api_base_url), Some(api_key), Some(from)) => {
            config = config.with_mail(MailConfig {
                api_base_url,
                api_key,
                from,
            });
        }
        (None, None, None) => {}
        _ => tracing::warn!(
            "MAIL_API_BASE_URL, MAIL_API_KEY and MAIL_FROM must be set together, falling back to log mailer"
        ),
    }

    Ok(config)
}
