use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SHRINE_API_URL", "https://api.example.test");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "SHRINE_ENV"));
}

#[test]
fn build_app_config_fails_without_api_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHRINE_API_URL"),
        "expected MissingEnvVar(SHRINE_API_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_api_url_as_missing() {
    let mut map = HashMap::new();
    map.insert("SHRINE_API_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_rejects_non_http_api_url() {
    let mut map = HashMap::new();
    map.insert("SHRINE_API_URL", "ftp://api.example.test");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHRINE_API_URL"),
        "expected InvalidEnvVar(SHRINE_API_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(cfg.api_url, "https://api.example.test");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.state_dir, std::path::PathBuf::from("./.shrine"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "shrine/0.1 (storefront)");
}

#[test]
fn request_timeout_override() {
    let mut map = full_env();
    map.insert("SHRINE_REQUEST_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 5);
}

#[test]
fn request_timeout_invalid() {
    let mut map = full_env();
    map.insert("SHRINE_REQUEST_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHRINE_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(SHRINE_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn request_timeout_zero_is_rejected() {
    let mut map = full_env();
    map.insert("SHRINE_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn state_dir_and_user_agent_overrides() {
    let mut map = full_env();
    map.insert("SHRINE_STATE_DIR", "/tmp/shrine-state");
    map.insert("SHRINE_USER_AGENT", "custom-agent/2.0");
    map.insert("SHRINE_ENV", "production");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.state_dir, std::path::PathBuf::from("/tmp/shrine-state"));
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
    assert_eq!(cfg.env, Environment::Production);
}
