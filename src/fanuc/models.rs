use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::timeline::Sample;

/// Program name shown for minutes without a part observation.
pub const UNAVAILABLE_PROGRAM: &str = "UNAVAILABLE";

/// Timestamp as sent by the Fanuc API.
///
/// The `feed_uptime` route sends epoch milliseconds while the observation
/// routes send ISO 8601 strings, sometimes without an offset (read as UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTimestamp")]
pub struct ApiTime(pub DateTime<Utc>);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(f64),
    Text(String),
}

impl TryFrom<RawTimestamp> for ApiTime {
    type Error = String;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        match raw {
            RawTimestamp::Millis(ms) => {
                // Fractional milliseconds are truncated
                DateTime::from_timestamp_millis(ms as i64)
                    .map(ApiTime)
                    .ok_or_else(|| format!("timestamp {ms} out of range"))
            }
            RawTimestamp::Text(text) => {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
                    return Ok(ApiTime(parsed.with_timezone(&Utc)));
                }
                NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f"))
                    .map(|naive| ApiTime(naive.and_utc()))
                    .map_err(|e| format!("invalid timestamp '{text}': {e}"))
            }
        }
    }
}

/// Element of `GET /v1/fanuc/feed_uptime/{machine}/{hours}`.
///
/// The same records feed both the uptime stream (`run`) and the feed-speed
/// stream (`feed`).
#[derive(Debug, Clone, Deserialize)]
pub struct FeedUptimeRecord {
    pub time: ApiTime,
    /// Run state: 0 = idle, 3 = productive, null = unknown
    #[serde(default)]
    pub run: Option<f64>,
    #[serde(default)]
    pub feed: Option<f64>,
}

impl FeedUptimeRecord {
    #[must_use]
    pub fn uptime_sample(&self) -> Sample<u8> {
        let run = self
            .run
            .filter(|v| v.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(v))
            .map(|v| v as u8);
        Sample::new(self.time.0, run)
    }

    #[must_use]
    pub fn feed_sample(&self) -> Sample<f64> {
        Sample::new(self.time.0, self.feed.filter(|v| v.is_finite()))
    }
}

/// Program currently loaded on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Program {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Program {
    /// Placeholder for minutes without an observation.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            name: UNAVAILABLE_PROGRAM.to_string(),
            comment: Some("default".to_string()),
        }
    }
}

/// Element of `GET /v1/fanuc/data/{machine}/{hours}/{observation}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PartObservation {
    pub observation: ObservationMeta,
    #[serde(default)]
    pub state: Option<ObservationState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationMeta {
    pub time: ApiTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationState {
    #[serde(default)]
    pub data: Option<ObservationData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationData {
    #[serde(default)]
    pub program: Option<ProgramState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramState {
    #[serde(default)]
    pub current: Option<Program>,
}

impl PartObservation {
    #[must_use]
    pub fn into_sample(self) -> Sample<Program> {
        let program = self
            .state
            .and_then(|s| s.data)
            .and_then(|d| d.program)
            .and_then(|p| p.current);
        Sample::new(self.observation.time.0, program)
    }
}

/// Response from `GET /v1/data/{option}/{date}`
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEnvelope {
    #[serde(default)]
    pub data: serde_json::Value,
}
