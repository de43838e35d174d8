use stagehand::config::{Config, ConfigError};
use stagehand::contract::ViolationPolicy;
use stagehand::director::{QueryParameter, Scene};
use std::fs;
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config");
    (temp_dir, path)
}

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.director.scheme, "stagehand");
}

#[test]
fn full_config_is_parsed() {
    let (_dir, path) = write_config(
        r#"
[logging]
enabled = false
filter = "debug"

[contracts]
on_violation = "report"

[director]
scheme = "reader"
scenes = ["home", "favorites", "post"]
query_parameters = ["q", "id"]
"#,
    );

    let config = Config::load_from(&path).unwrap();

    assert!(!config.logging.enabled);
    assert_eq!(config.logging.filter, "debug");
    assert_eq!(config.contracts.on_violation, ViolationPolicy::Report);
    assert_eq!(config.director.scheme, "reader");
    assert_eq!(config.director.scenes[2], Scene::new("post"));
    assert_eq!(
        config.director.query_parameters,
        vec![QueryParameter::new("q"), QueryParameter::new("id")]
    );
}

#[test]
fn partial_config_fills_defaults() {
    let (_dir, path) = write_config("[director]\nquery_parameters = [\"q\"]\n");

    let config = Config::load_from(&path).unwrap();

    assert!(config.logging.enabled);
    assert_eq!(config.logging.filter, "info");
    assert_eq!(
        config.director.scenes,
        vec![Scene::new("home"), Scene::new("favorites")]
    );
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[director\nscheme = ");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn invalid_scheme_fails_validation() {
    let (_dir, path) = write_config("[director]\nscheme = \"two words\"\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
    assert!(err.to_string().contains("Invalid URL scheme"));
}

#[test]
fn dot_segment_scene_fails_validation() {
    let (_dir, path) = write_config("[director]\nscenes = [\"home\", \"..\"]\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}
