//! HTTP API server with observability for the fulfillment workflows.
//!
//! Exposes the shipment and return state machines, the read-side views,
//! and the on-demand reconciliation scan over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use ledger::Ledger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: Ledger + Clone + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/shipping/create", post(routes::shipping::create::<L>))
        .route(
            "/shipping/{tracking}/status",
            put(routes::shipping::update_status::<L>),
        )
        .route(
            "/shipping/{tracking}/assign-courier",
            post(routes::shipping::assign_courier::<L>),
        )
        .route(
            "/shipping/{tracking}/return",
            post(routes::shipping::create_return::<L>),
        )
        .route("/shipping/track/{tracking}", get(routes::shipping::track::<L>))
        .route(
            "/shipping/track/order/{order_id}",
            get(routes::shipping::track_by_order::<L>),
        )
        .route(
            "/shipping/customer/{customer_id}",
            get(routes::shipping::by_customer::<L>),
        )
        .route("/returns/create", post(routes::returns::create::<L>))
        .route(
            "/returns/{code}/status",
            put(routes::returns::update_status::<L>),
        )
        .route(
            "/returns/{code}/schedule-pickup",
            post(routes::returns::schedule_pickup::<L>),
        )
        .route(
            "/returns/{code}/quality-check",
            post(routes::returns::quality_check::<L>),
        )
        .route(
            "/returns/{code}/refund/initiate",
            post(routes::returns::refund_initiate::<L>),
        )
        .route(
            "/returns/{code}/refund/complete",
            post(routes::returns::refund_complete::<L>),
        )
        .route(
            "/returns/{code}/refund/fail",
            post(routes::returns::refund_fail::<L>),
        )
        .route("/returns/{code}", get(routes::returns::get::<L>))
        .route(
            "/returns/customer/{customer_id}",
            get(routes::returns::by_customer::<L>),
        )
        .route("/reconciliation/scan", get(routes::scan::run::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: services, scanner, and views
/// registered on a projection processor.
pub fn create_default_state<L: Ledger + Clone + 'static>(
    ledger: L,
    config: &Config,
) -> Arc<AppState<L>> {
    use chrono::Duration;
    use domain::returns::ReturnService;
    use domain::shipment::ShipmentService;
    use projections::{ActiveShipmentsView, OpenReturnsView, Projection, ProjectionProcessor};
    use reconciliation::{ReconciliationScanner, SlaConfig};

    let shipments = ShipmentService::new(ledger.clone());
    let returns = ReturnService::new(ledger.clone());

    let sla = SlaConfig {
        stale_after: Duration::hours(config.stale_after_hours),
    };
    let scanner = ReconciliationScanner::new(ledger.clone(), sla);

    let active_shipments = Arc::new(ActiveShipmentsView::new());
    let open_returns = Arc::new(OpenReturnsView::new());

    let mut processor = ProjectionProcessor::new(ledger);
    processor.register(Box::new(active_shipments.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(open_returns.as_ref().clone()) as Box<dyn Projection>);
    let projection_processor = Arc::new(processor);

    Arc::new(AppState {
        shipments,
        returns,
        scanner,
        active_shipments,
        open_returns,
        projection_processor,
    })
}
