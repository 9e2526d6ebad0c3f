use std::sync::Arc;

use dbunits_model::ModelPackage;
use tracing::info;

use crate::config::{Config, ConnectionSettings};
use crate::error::PersistenceError;
use crate::mapping::{BeanRegistry, MappingSettings, PropertiesCustomizer, determine_customizers};
use crate::pool::ConnectionPool;
use crate::session::{AuditorAware, SessionFactory};
use crate::transaction::TransactionManager;

/// Name of the primary unit, which owns all writes.
pub const WRITE_UNIT: &str = "write";

/// Name of the optional read unit.
pub const READ_UNIT: &str = "read";

/// Default name of the model package mapped by both units.
pub const MODEL_PACKAGE: &str = "domain";

/// Pool, session factory and transaction manager of one unit, bound together.
#[derive(Debug, Clone)]
pub struct PersistenceUnit {
    name: String,
    pool: ConnectionPool,
    session_factory: SessionFactory,
    transaction_manager: TransactionManager,
}

impl PersistenceUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn session_factory(&self) -> &SessionFactory {
        &self.session_factory
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.transaction_manager
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Every unit built at startup. `write` is the primary.
#[derive(Debug, Clone)]
pub struct PersistenceUnits {
    pub write: PersistenceUnit,
    pub read: Option<PersistenceUnit>,
}

impl PersistenceUnits {
    pub fn primary(&self) -> &PersistenceUnit {
        &self.write
    }

    /// The read unit when one is configured, the primary otherwise.
    pub fn reader(&self) -> &PersistenceUnit {
        self.read.as_ref().unwrap_or(&self.write)
    }

    pub async fn close(&self) {
        if let Some(read) = &self.read {
            read.close().await;
        }
        self.write.close().await;
    }
}

/// Startup composition: configuration in, bound persistence units out.
///
/// ```no_run
/// # async fn run() -> Result<(), dbunits::PersistenceError> {
/// use dbunits::{Bootstrap, config::Config, model::ModelPackage};
///
/// let config = Config::load()?;
/// let units = Bootstrap::new(&config)
///     .model_package(ModelPackage::new("domain"))
///     .build()
///     .await?;
/// let _tm = units.primary().transaction_manager();
/// # Ok(())
/// # }
/// ```
pub struct Bootstrap<'a> {
    config: &'a Config,
    package: ModelPackage,
    customizers: Vec<Arc<dyn PropertiesCustomizer>>,
    registry: Option<Arc<BeanRegistry>>,
    auditor: Option<Arc<dyn AuditorAware>>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            package: ModelPackage::new(MODEL_PACKAGE),
            customizers: Vec::new(),
            registry: None,
            auditor: None,
        }
    }

    pub fn model_package(mut self, package: ModelPackage) -> Self {
        self.package = package;
        self
    }

    /// Registers a customizer. Customizers run in registration order.
    pub fn customizer(mut self, customizer: impl PropertiesCustomizer + 'static) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }

    /// Supplies the bean registry; installed only when `mapping.bean_container` is on.
    pub fn bean_registry(mut self, registry: Arc<BeanRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Auditor used when `mapping.auditor_ref` is unset.
    pub fn auditor(mut self, auditor: Arc<dyn AuditorAware>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    /// Builds the write unit, then the read unit if configured.
    ///
    /// The write unit goes first so a read-only unit can open the database it created.
    pub async fn build(self) -> Result<PersistenceUnits, PersistenceError> {
        let write = self.build_unit(WRITE_UNIT, &self.config.write).await?;
        let read = match &self.config.read {
            Some(settings) => match self.build_unit(READ_UNIT, settings).await {
                Ok(unit) => Some(unit),
                Err(e) => {
                    write.close().await;
                    return Err(e);
                }
            },
            None => None,
        };
        Ok(PersistenceUnits { write, read })
    }

    /// Runs the pipeline for a single unit: pool, mapping settings, session factory,
    /// then the transaction manager.
    pub async fn build_unit(
        &self,
        name: &str,
        settings: &ConnectionSettings,
    ) -> Result<PersistenceUnit, PersistenceError> {
        let pool = ConnectionPool::connect(name, settings).await?;

        let customizers =
            determine_customizers(&self.config.mapping, self.registry.as_ref(), &self.customizers);
        let mapping = MappingSettings::builder(self.config.mapping.determine_properties())
            .customizers(customizers)
            .finalize();

        let mut builder = SessionFactory::builder(name, pool.clone())
            .package(self.package.clone())
            .settings(mapping);
        if let Some(auditor) = &self.auditor {
            builder = builder.auditor(auditor.clone());
        }
        let session_factory = match builder.build().await {
            Ok(factory) => factory,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };
        let transaction_manager = TransactionManager::new(session_factory.clone());

        info!(unit = name, "persistence unit ready");
        Ok(PersistenceUnit {
            name: name.to_string(),
            pool,
            session_factory,
            transaction_manager,
        })
    }
}
