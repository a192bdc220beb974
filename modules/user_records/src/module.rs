use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use modkit::RestfulModule;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use url::Url;

use crate::api::rest::handlers::VapidPublicKey;
use crate::api::rest::openapi::UserRecordsApiDoc;
use crate::api::rest::routes;
use crate::config::UserRecordsConfig;
use crate::domain::ports::PushSender;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::assets::FsAssetStore;
use crate::infra::push::{HttpPushGateway, LogPushSender};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmUserRecordsRepository;

/// The user_records module: per-user split records, screenshots and push.
pub struct UserRecords {
    service: Arc<Service>,
    config: UserRecordsConfig,
    assets_dir: PathBuf,
}

impl UserRecords {
    /// Prepare storage and wire adapters.
    ///
    /// Runs migrations, creates the asset directory under `home_dir` and
    /// reclaims orphaned screenshots; call before serving requests.
    pub async fn init(
        config: UserRecordsConfig,
        db: DatabaseConnection,
        home_dir: &Path,
    ) -> anyhow::Result<Self> {
        Migrator::up(&db, None)
            .await
            .context("user_records migrations failed")?;

        let assets_dir = resolve_assets_dir(home_dir, &config.assets_dir);
        let assets = FsAssetStore::new(&assets_dir);
        assets.ensure_root().await?;
        let swept = assets.sweep_temp_files().await?;
        if swept > 0 {
            info!(swept, "removed interrupted screenshot writes");
        }

        let service = Arc::new(Service::new(
            Arc::new(SeaOrmUserRecordsRepository::new(db)),
            Arc::new(assets),
            build_push_sender(&config)?,
            ServiceConfig {
                max_user_id_length: config.max_user_id_length,
                max_screenshot_bytes: config.max_screenshot_bytes,
            },
        ));

        let reclaimed = service.reclaim_orphaned_assets().await?;
        info!(
            assets_dir = %assets_dir.display(),
            reclaimed,
            push_gateway = config.push.gateway_url.is_some(),
            "user_records module initialized"
        );

        Ok(Self {
            service,
            config,
            assets_dir,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }
}

impl RestfulModule for UserRecords {
    fn name(&self) -> &'static str {
        "user_records"
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        routes::register_routes(
            router,
            self.service.clone(),
            VapidPublicKey(self.config.push.vapid_public_key.clone()),
            self.config.max_screenshot_bytes,
        )
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        use utoipa::OpenApi;
        UserRecordsApiDoc::openapi()
    }
}

fn resolve_assets_dir(home_dir: &Path, assets_dir: &str) -> PathBuf {
    let p = Path::new(assets_dir);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home_dir.join(p)
    }
}

fn build_push_sender(config: &UserRecordsConfig) -> anyhow::Result<Arc<dyn PushSender>> {
    match config.push.gateway_url.as_deref() {
        Some(raw) => {
            let url = Url::parse(raw).with_context(|| format!("invalid push.gateway_url {raw:?}"))?;
            let gateway = HttpPushGateway::new(
                url,
                config.push.vapid_subject.clone(),
                Duration::from_millis(config.push.timeout_ms),
            )?;
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("push.gateway_url not set; note notifications will only be logged");
            Ok(Arc::new(LogPushSender))
        }
    }
}
