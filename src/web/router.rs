//! Web application router and middleware setup.

use crate::web::handlers;
use crate::web::state::AppState;
use crate::web::websocket;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the main axum application with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/health", get(handlers::health_check))
        .route("/api/controls/heat", post(handlers::heat))
        .route("/api/controls/cool", post(handlers::cool))
        .route("/api/controls/reset", post(handlers::reset))
        .route("/api/controls/auto", post(handlers::set_auto))
        .route("/ws", get(websocket::websocket_handler));

    let custom_index = config
        .static_path
        .as_ref()
        .map(PathBuf::from)
        .filter(|path| {
            let usable = path.join("index.html").exists();
            if !usable {
                warn!("Static path {:?} has no index.html, serving the built-in dashboard", path);
            }
            usable
        });

    app = match custom_index {
        Some(static_path) => {
            info!("Serving static files from: {:?}", static_path);
            app.nest_service("/static", ServeDir::new(static_path))
                .route("/", get(handlers::serve_index))
        }
        None => app.route("/", get(handlers::default_index)),
    };

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{DashboardSnapshot, Offsets, SensorControls, Thresholds};
    use crate::web::config::WebConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn state() -> (AppState, watch::Sender<DashboardSnapshot>, SensorControls) {
        let (tx, rx) = watch::channel(DashboardSnapshot::empty(Thresholds::default()));
        let controls = SensorControls::new();
        let state = AppState::new(WebConfig::default(), rx, controls.clone());
        (state, tx, controls)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_endpoint_returns_latest() {
        let (state, tx, _) = state();
        let mut snapshot = DashboardSnapshot::empty(Thresholds::default());
        snapshot.ticks = 7;
        tx.send_replace(snapshot);

        let response = create_app(state)
            .oneshot(Request::get("/api/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: DashboardSnapshot = body_json(response).await;
        assert_eq!(body.ticks, 7);
    }

    #[tokio::test]
    async fn test_controls_update_offsets() {
        let (state, _tx, controls) = state();
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(Request::post("/api/controls/heat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let offsets: Offsets = body_json(response).await;
        assert_eq!(offsets.temperature_c, 5.0);

        let response = app
            .oneshot(
                Request::post("/api/controls/auto")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"enabled":true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(controls.current().unwrap().auto);
    }

    #[tokio::test]
    async fn test_non_finite_step_is_bad_request() {
        let (_tx, rx) = watch::channel(DashboardSnapshot::empty(Thresholds::default()));
        let controls = SensorControls::new();
        let config = WebConfig::default().with_control_step(f64::INFINITY);
        let app = create_app(AppState::new(config, rx, controls.clone()));

        for route in ["/api/controls/heat", "/api/controls/cool"] {
            let response = app
                .clone()
                .oneshot(Request::post(route).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(controls.current().unwrap(), Offsets::default());
    }

    #[tokio::test]
    async fn test_index_served() {
        let (state, _tx, _) = state();
        let response = create_app(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("<canvas"));
    }
}
