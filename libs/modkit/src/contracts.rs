use axum::Router;

/// A module that contributes HTTP routes to the ingress host.
///
/// Pure wiring; must be sync. Called once, after the module's storage is ready
/// and before the server starts accepting connections.
pub trait RestfulModule: Send + Sync {
    /// Stable module name, used in logs.
    fn name(&self) -> &'static str;

    /// Attach the module's routes (and their per-route layers) to `router`.
    fn register_rest(&self, router: Router) -> anyhow::Result<Router>;

    /// OpenAPI document describing the routes added by `register_rest`.
    fn openapi(&self) -> utoipa::openapi::OpenApi;
}
