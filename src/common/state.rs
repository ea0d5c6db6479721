use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::charts::HoverHub;
use crate::config::Config;
use crate::fanuc::FanucClient;
use crate::store::{Selections, StreamStore};

/// Cached chart response with the stream generation it was rendered from.
#[derive(Clone)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
    pub generation: u64,
}

/// Cache for rendered responses. Key is request params, value is serialized
/// response + metadata. Weighted by byte size to enforce memory limit.
pub type ResponseCache = Cache<String, CachedResponse>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fanuc_client: Arc<FanucClient>,
    pub streams: Arc<StreamStore>,
    pub selections: Arc<Selections>,
    pub hover: Arc<HoverHub>,
    pub response_cache: ResponseCache,
}

impl AppState {
    pub fn new(config: Config, fanuc_client: FanucClient) -> Self {
        // Cache weighted by byte size, not entry count
        let cache: ResponseCache = Cache::builder()
            .weigher(|_key: &String, value: &CachedResponse| -> u32 {
                value.data.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(config.cache_max_bytes)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        let selections = Selections::new(&config.machines, config.default_hours, config.max_hours);
        let hover = HoverHub::new(selections.machines());

        Self {
            config: Arc::new(config),
            fanuc_client: Arc::new(fanuc_client),
            streams: Arc::new(StreamStore::new()),
            selections: Arc::new(selections),
            hover: Arc::new(hover),
            response_cache: cache,
        }
    }
}
