use dbunits::config::Config;
use dbunits::mapping::BeanRegistry;
use dbunits::model::ModelPackage;
use dbunits::session::{AuditorAware, FixedAuditor};
use dbunits::{Bootstrap, MODEL_PACKAGE};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Bean name under which the binary registers its fallback auditor.
const SYSTEM_AUDITOR_BEAN: &str = "system-auditor";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        write_url = %cfg.write.url,
        write_pool_max = cfg.write.pool.max_size,
        read_url = %cfg.read.as_ref().map_or("<none>", |r| r.url.as_str()),
        ddl_auto = %cfg.mapping.ddl_auto,
        bean_container = cfg.mapping.bean_container,
        auditor_ref = %cfg.mapping.auditor_ref.as_deref().unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        "configuration loaded"
    );

    let system_auditor: Arc<dyn AuditorAware> = Arc::new(FixedAuditor("system".to_string()));
    let registry = BeanRegistry::new().with(SYSTEM_AUDITOR_BEAN, system_auditor);

    let units = Bootstrap::new(&cfg)
        .model_package(ModelPackage::new(MODEL_PACKAGE))
        .bean_registry(Arc::new(registry))
        .build()
        .await?;

    for unit in std::iter::once(&units.write).chain(units.read.as_ref()) {
        let status = unit.pool().status();
        info!(
            unit = %unit.name(),
            pool_size = status.size,
            pool_idle = status.idle,
            pool_max = status.max_size,
            "persistence unit online"
        );
    }

    shutdown_signal().await;
    units.close().await;
    info!("persistence units closed; exiting.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
