//! Configuration loading and validation.
//!
//! Run with: cargo test --test config_test

use std::collections::HashMap;

use fanuc_dashboard::config::{Config, ConfigError, Deployment, MAX_HOURS_LIMIT};

fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn upstream_url_is_required() {
    assert!(matches!(load(&[]), Err(ConfigError::Missing("FANUC_API_URL"))));
    assert!(matches!(
        load(&[("FANUC_API_URL", "  ")]),
        Err(ConfigError::Missing("FANUC_API_URL"))
    ));
}

#[test]
fn defaults_apply() {
    let config = load(&[("FANUC_API_URL", "http://fanuc.local:8000/")]).unwrap();

    assert_eq!(config.fanuc_api_url, "http://fanuc.local:8000");
    assert_eq!(config.machines, vec!["datta_f2".to_string()]);
    assert_eq!(config.default_hours, 1);
    assert_eq!(config.max_hours, 168);
    assert_eq!(config.poll_interval_seconds, 60);
    assert_eq!(config.align_tolerance_seconds, 30);
    assert_eq!(config.http_timeout_seconds, 30);
    assert_eq!(config.display_offset.local_minus_utc(), 0);
    assert_eq!(config.deployment, Deployment::Local);
    assert_eq!(config.bind_address(), "0.0.0.0:3000");
    assert!(!config.disable_rate_limiting);
}

#[test]
fn machine_list_is_trimmed() {
    let config = load(&[
        ("FANUC_API_URL", "http://fanuc.local"),
        ("FANUC_MACHINES", " datta_f2, okuma_1 ,,"),
        ("DISPLAY_UTC_OFFSET_MINUTES", "330"),
        ("DEPLOYMENT", "production"),
    ])
    .unwrap();

    assert_eq!(config.machines, vec!["datta_f2", "okuma_1"]);
    assert_eq!(config.display_offset.local_minus_utc(), 330 * 60);
    assert_eq!(config.deployment, Deployment::Prod);

    assert!(matches!(
        load(&[("FANUC_API_URL", "http://fanuc.local"), ("FANUC_MACHINES", " , ")]),
        Err(ConfigError::Invalid { key: "FANUC_MACHINES", .. })
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    let url = ("FANUC_API_URL", "http://fanuc.local");

    assert!(matches!(
        load(&[url, ("DEFAULT_HOURS", "0")]),
        Err(ConfigError::Invalid { key: "DEFAULT_HOURS", .. })
    ));
    assert!(matches!(
        load(&[url, ("DEFAULT_HOURS", "48"), ("MAX_HOURS", "24")]),
        Err(ConfigError::Invalid { key: "DEFAULT_HOURS", .. })
    ));
    assert!(matches!(
        load(&[url, ("POLL_INTERVAL_SECONDS", "0")]),
        Err(ConfigError::Invalid { key: "POLL_INTERVAL_SECONDS", .. })
    ));
    assert!(matches!(
        load(&[url, ("MAX_HOURS", "4294967295")]),
        Err(ConfigError::Invalid { key: "MAX_HOURS", .. })
    ));
    assert!(matches!(
        load(&[url, ("MAX_HOURS", "0")]),
        Err(ConfigError::Invalid { key: "MAX_HOURS", .. })
    ));
    assert!(matches!(
        load(&[url, ("ALIGN_TOLERANCE_SECONDS", "9223372036854775807")]),
        Err(ConfigError::Invalid { key: "ALIGN_TOLERANCE_SECONDS", .. })
    ));
    assert!(matches!(
        load(&[url, ("ALIGN_TOLERANCE_SECONDS", "31")]),
        Err(ConfigError::Invalid { key: "ALIGN_TOLERANCE_SECONDS", .. })
    ));
    assert!(matches!(
        load(&[url, ("ALIGN_TOLERANCE_SECONDS", "-5")]),
        Err(ConfigError::Invalid { key: "ALIGN_TOLERANCE_SECONDS", .. })
    ));
    assert!(matches!(
        load(&[url, ("DISPLAY_UTC_OFFSET_MINUTES", "100000")]),
        Err(ConfigError::Invalid { key: "DISPLAY_UTC_OFFSET_MINUTES", .. })
    ));
}

#[test]
fn unparseable_optional_values_fall_back() {
    let config = load(&[
        ("FANUC_API_URL", "http://fanuc.local"),
        ("API_PORT", "not-a-port"),
        ("ALIGN_TOLERANCE_SECONDS", "soon"),
    ])
    .unwrap();
    assert_eq!(config.api_port, 3000);
    assert_eq!(config.align_tolerance_seconds, 30);
}

#[test]
fn largest_accepted_limits_still_load() {
    let config = load(&[
        ("FANUC_API_URL", "http://fanuc.local"),
        ("MAX_HOURS", "744"),
        ("DEFAULT_HOURS", "744"),
        ("ALIGN_TOLERANCE_SECONDS", "0"),
    ])
    .unwrap();
    assert_eq!(config.max_hours, MAX_HOURS_LIMIT);
    assert_eq!(config.align_tolerance_seconds, 0);
}
