use stratum_domain::config::Config;

#[test]
fn default_lifetime_is_thirty_minutes() {
    let config = Config::default();
    assert_eq!(config.session.lifetime_secs, 1800);
}

#[test]
fn default_variant_is_twenty_four_minutes() {
    let config = Config::default();
    assert_eq!(config.session.variant_secs, 1440);
}

#[test]
fn default_cleanup_batch_and_interval() {
    let config = Config::default();
    assert_eq!(config.cleanup.batch, 1000);
    assert_eq!(config.cleanup.interval_secs, 3600);
}

#[test]
fn default_storage_has_no_table_or_key() {
    let config = Config::default();
    assert!(config.storage.table_path.is_none());
    assert!(config.storage.encryption_key.is_none());
    assert!(config.storage.use_cache);
    assert!(!config.storage.use_options);
    assert_eq!(config.storage.cache_namespace, "sessions");
}

#[test]
fn explicit_storage_config_parses() {
    let toml_str = r#"
[storage]
table_path = "/var/lib/stratum/sessions.json"
use_cache = false
encryption_key = "hunter2"

[session]
lifetime_secs = 600
variant_secs = 480
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(
        config.storage.table_path.as_deref(),
        Some("/var/lib/stratum/sessions.json")
    );
    assert!(!config.storage.use_cache);
    assert_eq!(config.storage.encryption_key.as_deref(), Some("hunter2"));
    assert_eq!(config.session.lifetime_secs, 600);
    assert_eq!(config.session.variant_secs, 480);
}

#[test]
fn partial_config_fills_defaults() {
    let toml_str = r#"
[cleanup]
batch = 250
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.cleanup.batch, 250);
    assert_eq!(config.cleanup.interval_secs, 3600);
    assert_eq!(config.session.lifetime_secs, 1800);
}
