use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{any, get, post},
};
use tester_core::Health;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ProbeError;

/// Kubernetes probe endpoints backed by [`Health`].
pub struct ProbeApi {
    health: Arc<Health>,
}

impl ProbeApi {
    pub fn new(health: Arc<Health>) -> Self {
        Self { health }
    }

    /// Routes:
    /// - GET /liveness - 200 while live, 503 afterwards
    /// - GET /readiness - 200 once ready, 503 before or after
    /// - POST /stop-liveness - force liveness off for good
    /// - POST /stop-readiness - force readiness off for good
    ///
    /// `/stopLiveness` and `/stopReadiness` are the same switches under their
    /// legacy names and accept any method.
    pub fn router(self) -> Router {
        Router::new()
            .route("/liveness", get(liveness))
            .route("/readiness", get(readiness))
            .route("/stop-liveness", post(stop_liveness))
            .route("/stop-readiness", post(stop_readiness))
            .route("/stopLiveness", any(stop_liveness))
            .route("/stopReadiness", any(stop_readiness))
            .with_state(self.health)
    }
}

/// Serves `router` on `addr` until `shutdown` fires.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), ProbeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ProbeError::Bind { addr, source })?;
    info!(%addr, "probe server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(ProbeError::Serve)
}

async fn liveness(State(health): State<Arc<Health>>) -> impl IntoResponse {
    if health.is_live() {
        (StatusCode::OK, "Alive\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not Alive\n")
    }
}

async fn readiness(State(health): State<Arc<Health>>) -> impl IntoResponse {
    if health.is_ready() {
        (StatusCode::OK, "Ready\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not Ready\n")
    }
}

async fn stop_liveness(State(health): State<Arc<Health>>) -> impl IntoResponse {
    warn!("liveness forced off");
    health.mark_not_live();
    (StatusCode::OK, "Liveness probe failure simulation started\n")
}

async fn stop_readiness(State(health): State<Arc<Health>>) -> impl IntoResponse {
    warn!("readiness forced off");
    health.mark_not_ready();
    (StatusCode::OK, "Readiness probe failure simulation started\n")
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use super::*;

    async fn call(router: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn liveness_reflects_health() {
        let health = Arc::new(Health::new());
        let router = ProbeApi::new(Arc::clone(&health)).router();

        let (status, body) = call(router.clone(), Method::GET, "/liveness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Alive\n");

        health.mark_not_live();
        let (status, body) = call(router, Method::GET, "/liveness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "Not Alive\n");
    }

    #[tokio::test]
    async fn readiness_starts_unavailable() {
        let health = Arc::new(Health::new());
        let router = ProbeApi::new(Arc::clone(&health)).router();

        let (status, _) = call(router.clone(), Method::GET, "/readiness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        health.mark_ready();
        let (status, body) = call(router, Method::GET, "/readiness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Ready\n");
    }

    #[tokio::test]
    async fn stop_switches_are_one_way() {
        let health = Arc::new(Health::new());
        health.mark_ready();
        let router = ProbeApi::new(Arc::clone(&health)).router();

        let (status, _) = call(router.clone(), Method::POST, "/stop-readiness").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(router.clone(), Method::POST, "/stop-liveness").await;
        assert_eq!(status, StatusCode::OK);

        health.mark_ready();
        let (status, _) = call(router.clone(), Method::GET, "/readiness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = call(router, Method::GET, "/liveness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn camel_case_switches_accept_any_method() {
        let health = Arc::new(Health::new());
        health.mark_ready();
        let router = ProbeApi::new(Arc::clone(&health)).router();

        let (status, _) = call(router.clone(), Method::GET, "/stopReadiness").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!health.is_ready());
        assert!(health.is_live());

        let (status, _) = call(router, Method::PUT, "/stopLiveness").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!health.is_live());
    }

    #[tokio::test]
    async fn probes_reject_wrong_method() {
        let router = ProbeApi::new(Arc::new(Health::new())).router();
        let (status, _) = call(router, Method::GET, "/stop-liveness").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
