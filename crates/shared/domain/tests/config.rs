use beacon_domain::config::{
    ApiConfig, HubSettings, JobsConfig, OverflowMode, ProducerConfig, ServerConfig,
};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 3000);
    assert!(server.shutdown_grace_secs > 0);

    let hub = HubSettings::default();
    assert_eq!(hub.overflow, OverflowMode::Drop);
    assert!(hub.subscriber_capacity > 0 && hub.publish_capacity > 0);

    let jobs = JobsConfig::default();
    assert_eq!(jobs.step, 10);
    assert_eq!(jobs.retain_secs, 300);

    let producer = ProducerConfig::default();
    assert_eq!(producer.interval_ms, 2000);
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "port": 8080 },
        "hub": { "subscriber_capacity": 8, "overflow": "disconnect" },
        "producer": { "enabled": false },
        "log": { "level": "debug", "directory": "/tmp/beacon" }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.hub.subscriber_capacity, 8);
    assert_eq!(cfg.hub.publish_capacity, 1024);
    assert_eq!(cfg.hub.overflow, OverflowMode::Disconnect);
    assert!(!cfg.producer.enabled);
    assert_eq!(cfg.jobs.step_interval_ms, 2000);
    assert_eq!(cfg.log.level, "debug");
    assert_eq!(cfg.log.directory.as_deref(), Some(std::path::Path::new("/tmp/beacon")));
}

#[test]
fn unknown_overflow_mode_is_rejected() {
    let raw = json!({ "hub": { "overflow": "block" } });
    assert!(serde_json::from_value::<ApiConfig>(raw).is_err());
}

#[test]
fn mutation_does_not_leak_into_clones() {
    let original = ApiConfig::default();
    let mut changed = original.clone();
    changed.server.port = 9000;

    assert_eq!(original.server.port, 3000);
    assert_eq!(changed.server.port, 9000);
}
