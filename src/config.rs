//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Runtime configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the document store.
    pub storage_path: PathBuf,
    /// Default TTL applied by the cleanup sweep.
    pub storage_ttl: Duration,
    /// HTTP listen port.
    pub port: u16,
    /// Optional host of the downstream langextract service; when set, the
    /// readiness probe checks its `/health` endpoint.
    pub langextract_host: Option<String>,
    /// Optional override for the bundled skills dictionary.
    pub skills_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./storage"),
            storage_ttl: Duration::from_secs(24 * 3600),
            port: 8080,
            langextract_host: None,
            skills_path: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// `VIBECHECK_PORT` wins over the generic `PORT`. Invalid values are
    /// startup failures.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = lookup("VIBECHECK_STORAGE_PATH") {
            if path.is_empty() {
                bail!("VIBECHECK_STORAGE_PATH must not be empty");
            }
            config.storage_path = PathBuf::from(path);
        }

        if let Some(ttl) = lookup("VIBECHECK_STORAGE_TTL") {
            config.storage_ttl = parse_duration(&ttl)
                .with_context(|| format!("invalid VIBECHECK_STORAGE_TTL: '{ttl}'"))?;
        }

        if let Some(port) = lookup("VIBECHECK_PORT").or_else(|| lookup("PORT")) {
            config.port = port
                .parse::<u16>()
                .with_context(|| format!("invalid port: '{port}'"))?;
            if config.port == 0 {
                bail!("port must be > 0");
            }
        }

        config.langextract_host = lookup("VIBECHECK_LANGEXTRACT_HOST").filter(|h| !h.is_empty());
        config.skills_path = lookup("VIBECHECK_SKILLS_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

/// Parses a Go-style duration: one or more `<int><unit>` segments, e.g.
/// `24h`, `30m`, `1h30m`, `90s`. Units: `ns`, `us`, `ms`, `s`, `m`, `h`,
/// plus `d` as a convenience for days.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        bail!("empty duration");
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            bail!("duration segment must start with a number: '{input}'");
        }
        let value: u64 = rest[..digits_end].parse()?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let segment = match unit {
            "ns" => Duration::from_nanos(value),
            "us" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            "d" => Duration::from_secs(value * 24 * 3600),
            "" => bail!("duration is missing a unit: '{input}'"),
            other => bail!("unknown duration unit '{other}' in '{input}'"),
        };
        total += segment;
    }

    Ok(total)
}

/// Parses the `cleanup_storage` TTL argument: a Go-style duration first,
/// falling back to a bare integer meaning hours.
pub fn parse_ttl_arg(input: &str) -> Option<Duration> {
    if let Ok(d) = parse_duration(input) {
        return Some(d);
    }
    input
        .trim()
        .parse::<u64>()
        .ok()
        .map(|hours| Duration::from_secs(hours * 3600))
}
