use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

/// Longest selectable look-back window (31 days).
pub const MAX_HOURS_LIMIT: u32 = 24 * 31;

/// Half a grid slot, so a sample matches at most one slot.
pub const MAX_ALIGN_TOLERANCE_SECONDS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Fanuc telemetry API
    pub fanuc_api_url: String,
    pub machines: Vec<String>,
    pub observation_name: String,
    pub http_timeout_seconds: u64,

    // Dashboard window and polling
    pub default_hours: u32,
    pub max_hours: u32,
    pub poll_interval_seconds: u64,
    pub align_tolerance_seconds: i64,
    pub display_offset: FixedOffset,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_bytes: u64,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `FANUC_API_URL` is not set and
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable optional values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fanuc_api_url = lookup("FANUC_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("FANUC_API_URL"))?
            .trim_end_matches('/')
            .to_string();

        let machines: Vec<String> = lookup("FANUC_MACHINES")
            .unwrap_or_else(|| "datta_f2".to_string())
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToString::to_string)
            .collect();
        if machines.is_empty() {
            return Err(ConfigError::Invalid {
                key: "FANUC_MACHINES",
                reason: "at least one machine is required".to_string(),
            });
        }

        let max_hours = parse_or(&lookup, "MAX_HOURS", 168u32);
        if max_hours == 0 || max_hours > MAX_HOURS_LIMIT {
            return Err(ConfigError::Invalid {
                key: "MAX_HOURS",
                reason: format!("must be between 1 and {MAX_HOURS_LIMIT}"),
            });
        }
        let default_hours = parse_or(&lookup, "DEFAULT_HOURS", 1u32);
        if default_hours == 0 || default_hours > max_hours {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_HOURS",
                reason: format!("must be between 1 and {max_hours}"),
            });
        }

        let poll_interval_seconds = parse_or(&lookup, "POLL_INTERVAL_SECONDS", 60u64);
        if poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let align_tolerance_seconds = parse_or(&lookup, "ALIGN_TOLERANCE_SECONDS", 30i64);
        if !(0..=MAX_ALIGN_TOLERANCE_SECONDS).contains(&align_tolerance_seconds) {
            return Err(ConfigError::Invalid {
                key: "ALIGN_TOLERANCE_SECONDS",
                reason: format!("must be between 0 and {MAX_ALIGN_TOLERANCE_SECONDS}"),
            });
        }

        let offset_minutes = parse_or(&lookup, "DISPLAY_UTC_OFFSET_MINUTES", 0i32);
        let display_offset =
            FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| ConfigError::Invalid {
                key: "DISPLAY_UTC_OFFSET_MINUTES",
                reason: format!("{offset_minutes} is not a valid UTC offset"),
            })?;

        Ok(Self {
            // Fanuc telemetry API
            fanuc_api_url,
            machines,
            observation_name: lookup("FANUC_OBSERVATION_NAME")
                .unwrap_or_else(|| "production".to_string()),
            http_timeout_seconds: parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 30),

            // Dashboard window and polling
            default_hours,
            max_hours,
            poll_interval_seconds,
            align_tolerance_seconds,
            display_offset,

            // API settings
            api_host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&lookup, "API_PORT", 3000),

            // Rate limiting
            disable_rate_limiting: parse_or(&lookup, "DISABLE_RATE_LIMITING", false),
            rate_limit_per_second: parse_or(&lookup, "RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst: parse_or(&lookup, "RATE_LIMIT_BURST", 60),

            // Caching
            cache_ttl_seconds: parse_or(&lookup, "CACHE_TTL_SECONDS", 60),
            cache_max_bytes: parse_or(&lookup, "CACHE_MAX_BYTES", 52_428_800), // 50MB default

            // Application metadata
            deployment: Deployment::from_str(
                &lookup("DEPLOYMENT").unwrap_or_else(|| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
