use std::sync::Arc;

use dbunits_model::ModelPackage;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::info;

use super::audit::{AuditStamp, AuditorAware};
use super::metadata::Metadata;
use crate::config::SchemaAction;
use crate::error::PersistenceError;
use crate::mapping::{MappingProperties, MappingSettings, keys};
use crate::pool::ConnectionPool;

struct FactoryInner {
    unit: String,
    pool: ConnectionPool,
    settings: MappingSettings,
    metadata: Metadata,
    auditor: Option<Arc<dyn AuditorAware>>,
}

/// Creates sessions for one persistence unit. Cheap to clone.
#[derive(Clone)]
pub struct SessionFactory {
    inner: Arc<FactoryInner>,
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("unit", &self.inner.unit)
            .field("package", &self.inner.metadata.package())
            .field("entities", &self.inner.metadata.entities().len())
            .field("auditing", &self.inner.auditor.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionFactory {
    pub fn builder(unit: impl Into<String>, pool: ConnectionPool) -> SessionFactoryBuilder {
        SessionFactoryBuilder {
            unit: unit.into(),
            pool,
            package: None,
            settings: None,
            auditor: None,
        }
    }

    pub fn unit(&self) -> &str {
        &self.inner.unit
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.inner.pool
    }

    pub fn settings(&self) -> &MappingSettings {
        &self.inner.settings
    }

    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    pub fn auditor(&self) -> Option<&Arc<dyn AuditorAware>> {
        self.inner.auditor.as_ref()
    }

    /// Opens an autocommit session on a pooled connection.
    pub async fn open_session(&self) -> Result<Session, PersistenceError> {
        let conn = self.inner.pool.acquire().await?;
        Ok(Session {
            factory: self.clone(),
            conn,
        })
    }
}

pub struct SessionFactoryBuilder {
    unit: String,
    pool: ConnectionPool,
    package: Option<ModelPackage>,
    settings: Option<MappingSettings>,
    auditor: Option<Arc<dyn AuditorAware>>,
}

impl SessionFactoryBuilder {
    pub fn package(mut self, package: ModelPackage) -> Self {
        self.package = Some(package);
        self
    }

    pub fn settings(mut self, settings: MappingSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Auditor used when `audit.auditor_ref` is not set.
    pub fn auditor(mut self, auditor: Arc<dyn AuditorAware>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    /// Builds metadata, runs the configured schema action and resolves the auditor.
    pub async fn build(self) -> Result<SessionFactory, PersistenceError> {
        let SessionFactoryBuilder {
            unit,
            pool,
            package,
            settings,
            auditor,
        } = self;

        if pool.unit() != unit {
            return Err(PersistenceError::metadata(
                &unit,
                format!("connection pool belongs to unit `{}`", pool.unit()),
            ));
        }
        let package = package
            .ok_or_else(|| PersistenceError::metadata(&unit, "no model package registered"))?;
        let settings = settings
            .unwrap_or_else(|| MappingSettings::builder(MappingProperties::new()).finalize());

        check_autocommit_flag(&unit, &settings)?;
        let metadata = Metadata::build(&unit, &package)?;
        let action = schema_action(&unit, &settings, &pool)?;
        apply_schema_action(&unit, &pool, &metadata, action).await?;
        let auditor = resolve_auditor(&unit, &settings, auditor)?;

        info!(
            unit = %unit,
            package = %metadata.package(),
            entities = metadata.entities().len(),
            schema_action = %action,
            bean_container = settings.bean_container().is_some(),
            auditing = auditor.is_some(),
            "session factory built"
        );

        Ok(SessionFactory {
            inner: Arc::new(FactoryInner {
                unit,
                pool,
                settings,
                metadata,
                auditor,
            }),
        })
    }
}

/// Units of work run `BEGIN`/`COMMIT` on connections left in autocommit mode,
/// so the flag can only describe that.
fn check_autocommit_flag(unit: &str, settings: &MappingSettings) -> Result<(), PersistenceError> {
    let key = keys::PROVIDER_DISABLES_AUTOCOMMIT;
    match settings.get(key) {
        None => Ok(()),
        Some(_) if settings.get_bool(key) == Some(false) => Ok(()),
        Some(value) => Err(PersistenceError::metadata(
            unit,
            format!("`{key}` = {value} is not supported, pooled connections keep autocommit on"),
        )),
    }
}

fn schema_action(
    unit: &str,
    settings: &MappingSettings,
    pool: &ConnectionPool,
) -> Result<SchemaAction, PersistenceError> {
    let raw = settings.get_str(keys::DDL_AUTO).unwrap_or("none");
    let action = SchemaAction::parse(raw.trim()).ok_or_else(|| {
        PersistenceError::metadata(unit, format!("unknown `{}` value `{raw}`", keys::DDL_AUTO))
    })?;
    // A read-only unit cannot create tables; it can still check them.
    if action == SchemaAction::Create && pool.is_read_only() {
        return Ok(SchemaAction::Validate);
    }
    Ok(action)
}

async fn apply_schema_action(
    unit: &str,
    pool: &ConnectionPool,
    metadata: &Metadata,
    action: SchemaAction,
) -> Result<(), PersistenceError> {
    match action {
        SchemaAction::None => Ok(()),
        SchemaAction::Create => {
            for entity in metadata.entities() {
                sqlx::query(entity.ddl)
                    .execute(pool.as_sqlx())
                    .await
                    .map_err(|e| {
                        PersistenceError::metadata(
                            unit,
                            format!("creating table `{}` failed: {e}", entity.table),
                        )
                    })?;
            }
            Ok(())
        }
        SchemaAction::Validate => {
            for entity in metadata.entities() {
                let present: Vec<String> =
                    sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
                        .bind(entity.table)
                        .fetch_all(pool.as_sqlx())
                        .await
                        .map_err(|e| {
                            PersistenceError::metadata(
                                unit,
                                format!("inspecting table `{}` failed: {e}", entity.table),
                            )
                        })?;
                if present.is_empty() {
                    return Err(PersistenceError::metadata(
                        unit,
                        format!("table `{}` for `{}` is missing", entity.table, entity.type_name),
                    ));
                }
                if let Some(col) = entity
                    .columns
                    .iter()
                    .find(|c| !present.iter().any(|p| p == **c))
                {
                    return Err(PersistenceError::metadata(
                        unit,
                        format!("table `{}` has no column `{col}`", entity.table),
                    ));
                }
            }
            Ok(())
        }
    }
}

fn resolve_auditor(
    unit: &str,
    settings: &MappingSettings,
    explicit: Option<Arc<dyn AuditorAware>>,
) -> Result<Option<Arc<dyn AuditorAware>>, PersistenceError> {
    let Some(name) = settings.auditor_ref() else {
        return Ok(explicit);
    };
    let registry = settings.bean_container().ok_or_else(|| {
        PersistenceError::metadata(
            unit,
            format!("auditor `{name}` is referenced but no bean container is installed"),
        )
    })?;
    registry
        .resolve::<Arc<dyn AuditorAware>>(name)
        .map(Some)
        .ok_or_else(|| PersistenceError::metadata(unit, format!("auditor bean `{name}` not found")))
}

/// One pooled connection in autocommit mode. Returned to the pool on drop.
pub struct Session {
    factory: SessionFactory,
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub fn unit(&self) -> &str {
        self.factory.unit()
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub fn audit_stamp(&self) -> AuditStamp {
        AuditStamp::now(self.factory.auditor())
    }
}
