//! Integration tests for configuration loading

use std::io::Write;
use tempfile::NamedTempFile;
use valentine_relay::infra::Config;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[server]
bind_address = "127.0.0.1"
port = 8080
public_dir = "/srv/site"
trust_forwarded_for = true

[telegram]
bot_token = "123456:test-token"
chat_id = "-100500"
api_base = "http://127.0.0.1:8081"
timeout_ms = 2500

[notify]
utc_offset_minutes = 180
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1");
    assert_eq!(config.port(), 8080);
    assert_eq!(config.public_dir().to_str(), Some("/srv/site"));
    assert!(config.trust_forwarded_for());
    assert_eq!(config.telegram_credentials(), Some(("123456:test-token", "-100500")));
    assert_eq!(config.telegram_api_base(), "http://127.0.0.1:8081");
    assert_eq!(config.telegram_timeout_ms(), 2500);
    assert_eq!(config.utc_offset().local_minus_utc(), 180 * 60);
}

#[test]
fn test_partial_file_uses_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server]\nport = 4000\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.port(), 4000);
    assert_eq!(config.bind_address(), "0.0.0.0");
    assert_eq!(config.telegram_credentials(), None);
    assert_eq!(config.telegram_api_base(), "https://api.telegram.org");
    assert_eq!(config.utc_offset_minutes(), 120);
}

#[test]
fn test_blank_credentials_count_as_missing() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[telegram]\nbot_token = \"123:abc\"\nchat_id = \"   \"\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.telegram_credentials(), None);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server\nport = ").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    // Port and credentials may come from the environment; the rest are defaults
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.bind_address(), "0.0.0.0");
    assert_eq!(config.public_dir().to_str(), Some("public"));
    assert!(!config.trust_forwarded_for());
}

#[test]
fn test_config_file_env_selects_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server]\npublic_dir = \"/srv/from-env\"\n").unwrap();
    temp_file.flush().unwrap();
    let env_path = temp_file.path().to_str().unwrap().to_string();

    let path = Config::resolve_config_path(None, |key| {
        (key == "CONFIG_FILE").then(|| env_path.clone())
    });
    let config = Config::load_from_path(&path);

    assert_eq!(config.config_file(), env_path);
    assert_eq!(config.public_dir().to_str(), Some("/srv/from-env"));
}

#[test]
fn test_shipped_configs() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config");

    // The default file must reach the real Bot API
    let dev = Config::from_file(root.join("dev.toml")).unwrap();
    assert_eq!(dev.telegram_api_base(), "https://api.telegram.org");

    let mock = Config::from_file(root.join("mock.toml")).unwrap();
    assert_eq!(mock.telegram_api_base(), "http://127.0.0.1:8081");
}
