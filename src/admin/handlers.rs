use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::observability::MetricsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub open_connections: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        open_connections: state.registry.open_count(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::admin::{setup_admin_router, AdminState};
    use crate::net::ConnectionRegistry;
    use crate::observability::MetricsManager;

    fn state() -> AdminState {
        AdminState::new(Arc::new(MetricsManager::new()), ConnectionRegistry::new(), "secret")
    }

    fn get(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_token() {
        let router = setup_admin_router(state());
        let resp = router.clone().oneshot(get("/admin/status", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = router.oneshot(get("/admin/status", Some("nope"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn status_reports_open_connections() {
        let state = state();
        let _guard = state.registry.register("127.0.0.1:5000".parse().unwrap());
        let router = setup_admin_router(state);

        let resp = router.oneshot(get("/admin/status", Some("secret"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "operational");
        assert_eq!(json["open_connections"], 1);
    }

    #[tokio::test]
    async fn metrics_returns_snapshot() {
        let state = state();
        state
            .metrics
            .http_metric_for_namespace("telemetry")
            .update_request_metrics("PUT", 12);
        let router = setup_admin_router(state);

        let resp = router.oneshot(get("/admin/metrics", Some("secret"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["namespaces"]["telemetry"]["requests"], 1);
        assert_eq!(json["namespaces"]["telemetry"]["request_bytes"], 12);
        assert_eq!(json["global"]["requests"], 0);
    }
}
