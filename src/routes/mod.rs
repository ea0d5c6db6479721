pub mod cache;
pub mod charts;
pub mod health;
pub mod hover;
pub mod machines;
mod rate_limit;
pub mod reports;

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use rate_limit::ClientIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::charts::{feed, part_timeline, uptime, HoverPosition, LegendEntry, ChartMeta};
use crate::common::AppState;
use crate::store::{StreamKind, StreamStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        machines::list_machines,
        machines::list_streams,
        machines::update_selection,
        charts::get_uptime_chart,
        charts::get_feed_chart,
        charts::get_part_timeline_chart,
        hover::get_hover,
        hover::publish_hover,
        hover::clear_hover,
        hover::hover_events,
        reports::get_report,
    ),
    components(
        schemas(
            health::HealthResponse,
            machines::MachineResponse,
            machines::StreamStatusResponse,
            machines::SelectionRequest,
            machines::SelectionResponse,
            hover::HoverRequest,
            hover::HoverResponse,
            reports::ReportResponse,
            HoverPosition,
            StreamKind,
            StreamStatus,
            ChartMeta,
            LegendEntry,
            uptime::UptimeChart,
            uptime::UptimeBar,
            uptime::UptimeSummary,
            uptime::IdleTrendPoint,
            uptime::RunState,
            feed::FeedChart,
            feed::FeedBar,
            feed::FeedBand,
            part_timeline::PartTimelineChart,
            part_timeline::PartBar,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "machines", description = "Machines, stream status, and window selection"),
        (name = "charts", description = "Minute-aligned chart data"),
        (name = "hover", description = "Hover position shared between charts"),
        (name = "reports", description = "Generic report proxy"),
    ),
    info(
        title = "Fanuc Dashboard API",
        description = "Chart-ready telemetry for Fanuc CNC machines",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let api_routes_base = Router::new()
        .route("/machines", get(machines::list_machines))
        .route("/machines/{machine}/streams", get(machines::list_streams))
        .route("/machines/{machine}/selection", put(machines::update_selection))
        .route("/machines/{machine}/charts/uptime", get(charts::get_uptime_chart))
        .route("/machines/{machine}/charts/feed", get(charts::get_feed_chart))
        .route(
            "/machines/{machine}/charts/part-timeline",
            get(charts::get_part_timeline_chart),
        )
        .route(
            "/machines/{machine}/hover",
            get(hover::get_hover)
                .put(hover::publish_hover)
                .delete(hover::clear_hover),
        )
        .route("/machines/{machine}/hover/events", get(hover::hover_events))
        .route("/reports/{option}/{date}", get(reports::get_report));

    let limiter = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        None
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish();
        match limiter {
            Some(limiter) => {
                tracing::info!(
                    rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
                    "Rate limiting configured"
                );
                Some(limiter)
            }
            None => {
                tracing::warn!(
                    per_second = config.rate_limit_per_second,
                    burst = config.rate_limit_burst,
                    "Invalid rate limit settings, rate limiting DISABLED"
                );
                None
            }
        }
    };

    let api_routes = match limiter {
        Some(limiter) => api_routes_base.layer(GovernorLayer {
            config: Arc::new(limiter),
        }),
        None => api_routes_base,
    }
    .layer(RequestBodyLimitLayer::new(64 * 1024)); // 64KB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
