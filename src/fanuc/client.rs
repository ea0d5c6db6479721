use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::fanuc::models::{FeedUptimeRecord, PartObservation, Program, ReportEnvelope};
use crate::timeline::Sample;

/// Read-only client for the Fanuc telemetry API.
///
/// No authentication and no retries; a failed request surfaces as
/// `AppError::FanucApi` and the next scheduled poll tries again.
pub struct FanucClient {
    http_client: Client,
    base_url: String,
}

impl FanucClient {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.fanuc_api_url.clone(),
        })
    }

    /// Raw run/feed records for a machine over the last `hours`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::FanucApi` if the request fails or returns an error status.
    pub async fn get_feed_uptime(
        &self,
        machine: &str,
        hours: u32,
    ) -> AppResult<Vec<FeedUptimeRecord>> {
        let url = self.endpoint(&["v1", "fanuc", "feed_uptime", machine, &hours.to_string()])?;
        let items = self.get_array(url).await?;
        Ok(decode_elements(items, "feed_uptime"))
    }

    /// Run-state samples (`run`) for the uptime chart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::FanucApi` if the request fails or returns an error status.
    pub async fn get_uptime(&self, machine: &str, hours: u32) -> AppResult<Vec<Sample<u8>>> {
        let records = self.get_feed_uptime(machine, hours).await?;
        Ok(records.iter().map(FeedUptimeRecord::uptime_sample).collect())
    }

    /// Feed-speed samples (`feed`) for the feed chart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::FanucApi` if the request fails or returns an error status.
    pub async fn get_feed(&self, machine: &str, hours: u32) -> AppResult<Vec<Sample<f64>>> {
        let records = self.get_feed_uptime(machine, hours).await?;
        Ok(records.iter().map(FeedUptimeRecord::feed_sample).collect())
    }

    /// Program observations for the part timeline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::FanucApi` if the request fails or returns an error status.
    pub async fn get_part_timeline(
        &self,
        machine: &str,
        hours: u32,
        observation: &str,
    ) -> AppResult<Vec<Sample<Program>>> {
        let url = self.endpoint(&[
            "v1",
            "fanuc",
            "data",
            machine,
            &hours.to_string(),
            observation,
        ])?;
        let items = self.get_array(url).await?;
        Ok(decode_elements::<PartObservation>(items, "part_timeline")
            .into_iter()
            .map(PartObservation::into_sample)
            .collect())
    }

    /// Rows of the generic `{data: [...]}` report envelope.
    ///
    /// Never fails: transport errors and envelopes without a `data` array
    /// both yield an empty list.
    pub async fn get_report_data(&self, option: &str, date: &str) -> Vec<serde_json::Value> {
        let url = match self.endpoint(&["v1", "data", option, date]) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build report URL");
                return Vec::new();
            }
        };

        let body: ReportEnvelope = match self.get_json(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, option, date, "Error fetching report data");
                return Vec::new();
            }
        };

        match body.data {
            serde_json::Value::Array(rows) => rows,
            other => {
                tracing::error!(
                    kind = json_kind(&other),
                    option,
                    date,
                    "Invalid data in report response"
                );
                Vec::new()
            }
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid Fanuc API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("Fanuc API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON array. A body that is valid JSON but not an array is
    /// treated as an empty result.
    async fn get_array(&self, url: Url) -> AppResult<Vec<serde_json::Value>> {
        let path = url.path().to_string();
        match self.get_json::<serde_json::Value>(url).await? {
            serde_json::Value::Array(items) => Ok(items),
            other => {
                tracing::warn!(
                    path = %path,
                    kind = json_kind(&other),
                    "Expected a JSON array from Fanuc API, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        tracing::debug!(url = %url, "Fanuc API request");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::FanucApi(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::FanucApi("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::FanucApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::FanucApi(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse Fanuc API response"
            );
            AppError::FanucApi(format!("Failed to parse response: {e}"))
        })
    }
}

/// Decode array elements one by one, skipping the malformed ones.
fn decode_elements<T: DeserializeOwned>(items: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, what, "Skipping malformed element");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::warn!(
            what,
            skipped = total - decoded.len(),
            total,
            "Fanuc API returned malformed elements"
        );
    }
    decoded
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
