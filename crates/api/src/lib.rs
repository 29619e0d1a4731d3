//! HTTP API server for the room reservation system.
//!
//! Exposes both service surfaces, availability (check/lock/confirm/release)
//! and bookings (the saga endpoints), with structured logging (tracing) and
//! Prometheus metrics. In this single-process deployment the orchestrator
//! talks to the availability service in-process through the same
//! `AvailabilityApi` boundary a remote transport would implement.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use availability::{AvailabilityConfig, AvailabilityService, RoomCatalog};
use booking::{
    BookingOrchestrator, InMemoryBookingStore, OrchestratorConfig, TracingNotificationPublisher,
};
use slot_store::SlotStore;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SlotStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/availability/check", get(routes::availability::check::<S>))
        .route(
            "/availability/rooms",
            get(routes::availability::free_rooms::<S>)
                .post(routes::availability::register_room::<S>),
        )
        .route(
            "/availability/rooms/{id}",
            get(routes::availability::get_room::<S>),
        )
        .route("/availability/lock", post(routes::availability::lock::<S>))
        .route(
            "/availability/confirm",
            post(routes::availability::confirm::<S>),
        )
        .route(
            "/availability/release",
            post(routes::availability::release::<S>),
        )
        .route("/bookings", post(routes::bookings::create::<S>))
        .route("/bookings", get(routes::bookings::list::<S>))
        .route("/bookings/{id}", get(routes::bookings::get::<S>))
        .route("/bookings/{id}/confirm", post(routes::bookings::confirm::<S>))
        .route("/bookings/{id}/cancel", post(routes::bookings::cancel::<S>))
        .route("/bookings/{id}/promote", post(routes::bookings::promote::<S>))
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

/// Creates the default application state over the given slot store.
pub fn create_default_state<S: SlotStore + Clone + 'static>(
    slot_store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let availability = AvailabilityService::new(
        slot_store,
        RoomCatalog::new(),
        AvailabilityConfig {
            lock_ttl: config.lock_ttl(),
        },
    );

    let orchestrator = BookingOrchestrator::new(
        availability.clone(),
        InMemoryBookingStore::new(),
        TracingNotificationPublisher,
        OrchestratorConfig {
            confirm_mode: booking::ConfirmMode::Immediate,
            promotion_lead: config.promotion_lead(),
        },
    );

    Arc::new(AppState {
        availability,
        orchestrator,
    })
}
