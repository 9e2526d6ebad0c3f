mod common;

use common::config_from_toml;
use dbunits::PersistenceError;
use dbunits::config::{Config, READ_NAMESPACE, SchemaAction, WRITE_NAMESPACE};
use figment::Figment;
use figment::providers::{Format, Toml};

#[test]
fn two_namespaces_load_independently() {
    let cfg = config_from_toml(
        r#"
        [write_datasource]
        url = "sqlite://write.db"
        username = "writer"

        [write_datasource.pool]
        max_size = 8
        acquire_timeout_ms = 1500

        [read_datasource]
        url = "sqlite://read.db"
        read_only = true

        [read_datasource.pool]
        max_size = 3
        "#,
    );

    assert_eq!(cfg.write.url, "sqlite://write.db");
    assert_eq!(cfg.write.username.as_deref(), Some("writer"));
    assert_eq!(cfg.write.pool.max_size, 8);
    assert_eq!(cfg.write.pool.acquire_timeout_ms, 1500);
    assert!(!cfg.write.read_only);

    let read = cfg.read.expect("read namespace configured");
    assert_eq!(read.url, "sqlite://read.db");
    assert!(read.username.is_none());
    assert!(read.read_only);
    assert_eq!(read.pool.max_size, 3);
    // Not inherited from the write namespace.
    assert_eq!(read.pool.acquire_timeout_ms, 30_000);
}

#[test]
fn unknown_keys_are_ignored() {
    let cfg = config_from_toml(
        r#"
        [write_datasource]
        url = "sqlite://write.db"
        leak_detection_threshold = 2000
        [write_datasource.pool]
        connection_test_query = "SELECT 1"
        "#,
    );
    assert_eq!(cfg.write.pool.max_size, 10);
}

#[test]
fn missing_url_fails_at_load() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [write_datasource]
        username = "writer"
        "#,
    ));
    let err = Config::from_figment(&figment).unwrap_err();
    match &err {
        PersistenceError::InvalidConfig { namespace, reason } => {
            assert_eq!(namespace, WRITE_NAMESPACE);
            assert!(reason.contains("url"), "{reason}");
        }
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
    assert!(err.is_startup_failure());
}

#[test]
fn invalid_read_namespace_fails_even_when_write_is_valid() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [write_datasource]
        url = "sqlite://write.db"

        [read_datasource]
        read_only = true
        "#,
    ));
    let err = Config::from_figment(&figment).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::InvalidConfig { ref namespace, .. } if namespace == READ_NAMESPACE
    ));
}

#[test]
fn blank_url_is_rejected() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [write_datasource]
        url = "   "
        "#,
    ));
    assert!(matches!(
        Config::from_figment(&figment),
        Err(PersistenceError::InvalidConfig { .. })
    ));
}

#[test]
fn zero_pool_size_is_rejected() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [write_datasource]
        url = "sqlite://write.db"
        [write_datasource.pool]
        max_size = 0
        "#,
    ));
    let err = Config::from_figment(&figment).unwrap_err();
    assert!(err.to_string().contains("max_size"), "{err}");
}

#[test]
fn mapping_section_and_generic_properties_are_read() {
    let cfg = config_from_toml(
        r#"
        [write_datasource]
        url = "sqlite://write.db"

        [mapping]
        ddl_auto = "validate"
        batch_size = 25
        auditor_ref = "security-auditor"
        bean_container = false

        [mapping.properties]
        "vendor.fetch_size" = 100
        "#,
    );
    assert_eq!(cfg.mapping.ddl_auto, SchemaAction::Validate);
    assert_eq!(cfg.mapping.batch_size, Some(25));
    assert_eq!(cfg.mapping.auditor_ref.as_deref(), Some("security-auditor"));
    assert!(!cfg.mapping.bean_container);

    let props = cfg.mapping.determine_properties();
    assert_eq!(props.get_u64("vendor.fetch_size"), Some(100));
    assert_eq!(props.get_str("schema.ddl_auto"), Some("validate"));
}

#[test]
fn config_file_layers_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [basic]
        loglevel = "debug"

        [write_datasource]
        url = "sqlite://from-file.db"
        "#,
    )
    .unwrap();

    let cfg = Config::from_figment(&Config::figment_with_file(&path)).unwrap();
    assert_eq!(cfg.basic.loglevel, "debug");
    assert_eq!(cfg.write.url, "sqlite://from-file.db");
    assert_eq!(cfg.mapping.ddl_auto, SchemaAction::None);
}

#[test]
fn environment_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [write_datasource]
            url = "sqlite://from-file.db"

            [write_datasource.pool]
            max_size = 8
            "#,
        )?;
        jail.set_env("DBUNITS_WRITE_DATASOURCE__POOL__MAX_SIZE", "4");
        jail.set_env("DBUNITS_MAPPING__DDL_AUTO", "create");

        let cfg = Config::from_figment(&Config::figment()).map_err(|e| e.to_string())?;
        assert_eq!(cfg.write.url, "sqlite://from-file.db");
        assert_eq!(cfg.write.pool.max_size, 4);
        assert_eq!(cfg.mapping.ddl_auto, SchemaAction::Create);
        Ok(())
    });
}
