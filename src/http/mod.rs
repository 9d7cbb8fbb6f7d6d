//! Read API and Prometheus endpoint.
//!
//! Serves the REST surface over guild snapshots plus `/metrics`. Runs on its
//! own tokio task next to the counting service.

mod error;
mod fields;
mod handlers;

pub use error::ApiError;
pub use handlers::{ServerPatch, SettingsPatch};

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ApiConfig;
use crate::counting::CountingService;
use crate::metrics;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<CountingService>,
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    metrics::gather_metrics()
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "fallback".to_string());
    let response = next.run(request).await;
    metrics::record_api_request(&route, response.status().as_u16());
    response
}

/// Build the API router.
pub fn router(service: Arc<CountingService>, config: &ApiConfig) -> Router {
    let mut server = get(handlers::show_server);
    if config.admin {
        server = server.patch(handlers::patch_server);
    }

    let router = Router::new()
        .route("/servers", get(handlers::list_servers))
        .route("/servers/:id", server)
        .route("/servers/:id/users", get(handlers::list_members))
        .route("/servers/:id/users/:user_id", get(handlers::show_member))
        .route("/servers/:id/history", get(handlers::history))
        .route("/users/:id", get(handlers::show_user))
        .route("/metrics", get(metrics_handler));

    let router = match config.fallback_redirect.clone() {
        Some(target) => router.fallback(move || {
            let target = target.clone();
            async move { Redirect::temporary(&target).into_response() }
        }),
        None => router.fallback(not_found),
    };

    router
        .layer(middleware::from_fn(track_requests))
        .with_state(ApiState { service })
}

/// Serve `app` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}

/// Bind `addr` and serve the API.
///
/// This is a long-running task that should be spawned in the background.
pub async fn run_http_server(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "API server listening");
    serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn spawn(config: ApiConfig) -> String {
        metrics::init();
        let service = Arc::new(CountingService::new(Arc::new(MemoryStore::new())));
        let app = router(service, &config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, app));
        format!("http://{}", addr)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_routes_use_error_shape() {
        let base = spawn(ApiConfig::default()).await;
        let response = client().get(format!("{}/nope", base)).send().await.unwrap();
        assert_eq!(response.status(), 404);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], 404);
    }

    #[tokio::test]
    async fn fallback_redirect() {
        let config = ApiConfig {
            fallback_redirect: Some("https://example.com/".to_string()),
            ..ApiConfig::default()
        };
        let base = spawn(config).await;
        let response = client().get(format!("{}/nope", base)).send().await.unwrap();
        assert_eq!(response.status(), 307);
        assert_eq!(response.headers()["location"], "https://example.com/");
    }

    #[tokio::test]
    async fn patch_is_gated_by_admin_flag() {
        let body = serde_json::json!({"channelId": "c"});

        let base = spawn(ApiConfig::default()).await;
        let response = client()
            .patch(format!("{}/servers/g", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 405);

        let config = ApiConfig {
            admin: true,
            ..ApiConfig::default()
        };
        let base = spawn(config).await;
        let response = client()
            .patch(format!("{}/servers/g", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let summary: serde_json::Value = response.json().await.unwrap();
        assert_eq!(summary["id"], "g");
    }

    #[tokio::test]
    async fn metrics_endpoint_counts_requests() {
        let base = spawn(ApiConfig::default()).await;
        client().get(format!("{}/servers", base)).send().await.unwrap();
        let text = client()
            .get(format!("{}/metrics", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("tally_api_requests_total"));
    }
}
