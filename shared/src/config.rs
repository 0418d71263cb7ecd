use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Longest expiry any cache backend accepts.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Memory, // moka, lost on restart
    Sled,   // durable, swept in the background
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "moka" => Ok(CacheBackend::Memory),
            "sled" | "disk" => Ok(CacheBackend::Sled),
            other => Err(format!(
                "Invalid cache backend '{}'. Must be 'memory' or 'sled'",
                other
            )),
        }
    }
}

/// Settings consumed by the cache store backends.
#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    /// Logical freshness window checked on every read.
    pub ttl: Duration,
    /// Storage-level reclamation bound. Never shorter than `ttl`.
    pub physical_ttl: Duration,
    pub data_dir: PathBuf,
    pub sweep_interval: Duration,
}

impl CacheSettings {
    pub fn ttl_minutes(&self) -> u64 {
        self.ttl.as_secs() / 60
    }

    /// Raises the physical bound to the logical TTL if it was configured lower.
    pub fn normalized(mut self) -> Self {
        if self.physical_ttl < self.ttl {
            warn!(
                "Physical cache expiry ({}s) is shorter than the logical TTL ({}s); raising it to match",
                self.physical_ttl.as_secs(),
                self.ttl.as_secs()
            );
            self.physical_ttl = self.ttl;
        }
        self
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Sled,
            ttl: Duration::from_secs(Config::DEFAULT_CACHE_TTL_MINUTES * 60),
            physical_ttl: Duration::from_secs(Config::DEFAULT_PHYSICAL_TTL_HOURS * 3600),
            data_dir: PathBuf::from(Config::DEFAULT_DATA_DIR),
            sweep_interval: Duration::from_secs(Config::DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

/// Settings consumed by the upstream HTTP client.
#[derive(Clone, Debug)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_UPSTREAM_BASE_URL.to_string(),
            timeout: Duration::from_millis(Config::DEFAULT_UPSTREAM_TIMEOUT_MS),
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub cache: CacheSettings,
    pub upstream: UpstreamSettings,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 3000;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_UPSTREAM_BASE_URL: &str = "https://phimapi.com";
    const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 15_000;
    const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;
    const DEFAULT_PHYSICAL_TTL_HOURS: u64 = 24;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

    const CACHE_TTL_MINUTES_RANGE: RangeInclusive<u64> = 0..=365 * 24 * 60;
    const PHYSICAL_TTL_HOURS_RANGE: RangeInclusive<u64> = 0..=365 * 24;
    const SWEEP_INTERVAL_SECS_RANGE: RangeInclusive<u64> = 1..=24 * 3600;
    const UPSTREAM_TIMEOUT_MS_RANGE: RangeInclusive<u64> = 1..=600_000;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("CACHE_BACKEND") {
            Some(raw) => raw.parse::<CacheBackend>().unwrap_or_else(|e| {
                warn!("{}; falling back to sled", e);
                CacheBackend::Sled
            }),
            None => CacheBackend::Sled,
        };

        let cache = CacheSettings {
            backend,
            ttl: duration_or(
                &lookup,
                "CACHE_TTL_MINUTES",
                Self::DEFAULT_CACHE_TTL_MINUTES,
                Self::CACHE_TTL_MINUTES_RANGE,
                |minutes| Duration::from_secs(minutes * 60),
            ),
            physical_ttl: duration_or(
                &lookup,
                "CACHE_PHYSICAL_TTL_HOURS",
                Self::DEFAULT_PHYSICAL_TTL_HOURS,
                Self::PHYSICAL_TTL_HOURS_RANGE,
                |hours| Duration::from_secs(hours * 3600),
            ),
            data_dir: PathBuf::from(
                lookup("REEL_DATA_DIR").unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
            ),
            sweep_interval: duration_or(
                &lookup,
                "CACHE_SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL_SECS,
                Self::SWEEP_INTERVAL_SECS_RANGE,
                Duration::from_secs,
            ),
        }
        .normalized();

        let upstream = UpstreamSettings {
            base_url: lookup("PHIM_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| Self::DEFAULT_UPSTREAM_BASE_URL.to_string()),
            timeout: duration_or(
                &lookup,
                "UPSTREAM_TIMEOUT_MS",
                Self::DEFAULT_UPSTREAM_TIMEOUT_MS,
                Self::UPSTREAM_TIMEOUT_MS_RANGE,
                Duration::from_millis,
            ),
        };

        Self {
            host: lookup("REEL_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", Self::DEFAULT_PORT),
            cache,
            upstream,
            allowed_origins: lookup("REEL_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{}='{}' is not valid, using default {}", name, raw, default);
            default
        }),
        None => default,
    }
}

/// Like [`parse_or`], but values outside `range` also fall back to `default`.
/// The range bounds keep `to_duration` from overflowing.
fn duration_or<F>(
    lookup: &F,
    name: &str,
    default: u64,
    range: RangeInclusive<u64>,
    to_duration: fn(u64) -> Duration,
) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, name, default);
    if range.contains(&value) {
        return to_duration(value);
    }

    warn!(
        "{}={} is outside {}..={}, using default {}",
        name,
        value,
        range.start(),
        range.end(),
        default
    );
    to_duration(default)
}
