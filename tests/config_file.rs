use academy_cms::config::Config;
use academy_cms::EditorOptions;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_config_is_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config, Config::default());
    assert!(path.exists());

    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_saved_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.api.base_url = "https://academy.example.org".to_string();
    config.api.session_cookie = Some("session=abc123".to_string());
    config.editor.autosave_delay_ms = 750;
    config.editor.confirm_discard = false;
    config.logging.level = "debug".to_string();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let options = EditorOptions::from(&loaded.editor);
    assert_eq!(options.autosave_delay, Duration::from_millis(750));
    assert!(!options.generate_ai_content);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[editor]\nautosave_delay_ms = \"soon\"\n").unwrap();

    assert!(Config::load_from(&path).is_err());
}
