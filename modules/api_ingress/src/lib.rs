//! HTTP host: composes module routers under one middleware stack and serves them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, response::Json, routing::get, Router};
use modkit::RestfulModule;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;

mod config;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

#[derive(OpenApi)]
#[openapi(
    info(title = "Sensus API", description = "Per-user split records with screenshots and Web Push"),
    paths(web::liveness, web::health_check),
    components(schemas(web::LivenessDto, web::HealthDto)),
    tags((name = "system", description = "Liveness and health"))
)]
struct IngressApiDoc;

/// The HTTP host.
pub struct ApiIngress {
    config: ApiIngressConfig,
    modules: Vec<Arc<dyn RestfulModule>>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: Arc<dyn RestfulModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Ingress document merged with every module's paths and schemas.
    pub fn build_openapi(&self) -> utoipa::openapi::OpenApi {
        let mut doc = IngressApiDoc::openapi();
        for module in &self.modules {
            doc.merge(module.openapi());
        }
        doc
    }

    /// Router with module routes and the full middleware stack.
    pub fn build_router(&self) -> Result<Router> {
        let mut router = Router::new()
            .route("/", get(web::liveness))
            .route("/health", get(web::health_check));

        for module in &self.modules {
            router = module
                .register_rest(router)
                .with_context(|| format!("module '{}' failed to register routes", module.name()))?;
            tracing::debug!(module = module.name(), "routes registered");
        }

        if self.config.enable_docs {
            let spec = Arc::new(serde_json::to_value(self.build_openapi())?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let spec = spec.clone();
                        async move { Json(spec.as_ref().clone()) }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        Ok(self.apply_middleware(router))
    }

    // Later layers wrap earlier ones: the request passes body limit, CORS,
    // timeout, request-id assignment and tracing before reaching handlers.
    fn apply_middleware(&self, mut router: Router) -> Router {
        let x_request_id = request_id::header();

        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(request_id::create_trace_layer());
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));
        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_secs,
        )));
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router.layer(RequestBodyLimitLayer::new(
            self.config.body_limit_mb * 1024 * 1024,
        ))
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(&self, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.serve_with_listener(listener, cancel).await
    }

    pub async fn serve_with_listener(
        &self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<()> {
        let router = self.build_router()?;
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, modules = self.modules.len(), "HTTP server bound");

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

/// Resolve the listen address: explicit `bind_addr`, else `host:port`.
pub fn resolve_bind_addr(config: &ApiIngressConfig, host: &str, port: u16) -> Result<SocketAddr> {
    let raw = match &config.bind_addr {
        Some(addr) => addr.clone(),
        None => format!("{host}:{port}"),
    };
    raw.parse()
        .with_context(|| format!("Invalid bind address '{raw}'"))
}
