//! Response caching for rendered charts and report proxies.
//!
//! A chart depends on the stream generation it was rendered from, so each
//! cached entry records that generation and is dropped as soon as the
//! store has applied a newer fetch. The grid end minute is part of the key,
//! which makes entries expire naturally when the window slides.

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::common::{AppState, CachedResponse};
use crate::error::{AppError, AppResult};

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:`. Empty components are kept so different
/// queries produce different keys.
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

/// Cached bytes for `cache_key`, unless they were rendered from an older
/// generation than `generation`.
pub async fn get_cached(
    state: &AppState,
    cache_key: &str,
    generation: u64,
) -> Option<Arc<Vec<u8>>> {
    let cached = state.response_cache.get(cache_key).await?;

    if cached.generation != generation {
        tracing::debug!(cache_key = %cache_key, cached = cached.generation, generation, "cache_stale");
        state.response_cache.invalidate(cache_key).await;
        return None;
    }

    tracing::debug!(cache_key = %cache_key, "cache_hit");
    Some(cached.data)
}

pub async fn store_cached(state: &AppState, cache_key: String, data: Vec<u8>, generation: u64) {
    state
        .response_cache
        .insert(
            cache_key,
            CachedResponse {
                data: Arc::new(data),
                generation,
            },
        )
        .await;
}

/// Build a JSON response with X-Cache header
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize and cache a response, then return it
pub async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    cache_key: String,
    response: &T,
    generation: u64,
) -> AppResult<Response> {
    let json_bytes = serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    store_cached(state, cache_key, json_bytes.clone(), generation).await;

    json_response(json_bytes, false)
}
