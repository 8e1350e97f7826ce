//! Configuration loading and validation tests.

use camview::config::{load_config, load_config_or_default, parse_config, Config};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert!(config.server.static_dir.is_none());
    assert_eq!(config.probe.timeout(), Duration::from_millis(5000));
    assert!(config.tools.ffmpeg_path.is_none());
}

#[test]
fn full_config_parses() {
    let config = parse_config(
        r#"
        [server]
        host = "127.0.0.1"
        port = 3000
        static_dir = "/srv/camview"

        [probe]
        timeout_ms = 1500

        [tools]
        ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
        "#,
    )
    .unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.static_dir, Some(PathBuf::from("/srv/camview")));
    assert_eq!(config.probe.timeout_ms, 1500);
    assert_eq!(
        config.tools.ffmpeg_path,
        Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
    );
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = parse_config("[server]\nport = 9000\n").unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.probe.timeout_ms, 5000);
}

#[test]
fn zero_port_is_rejected() {
    let err = parse_config("[server]\nport = 0\n").unwrap_err();
    assert!(err.to_string().contains("port"));
}

#[test]
fn zero_probe_timeout_is_rejected() {
    let err = parse_config("[probe]\ntimeout_ms = 0\n").unwrap_err();
    assert!(err.to_string().contains("timeout"));
}

#[test]
fn missing_ffmpeg_path_only_warns() {
    let config = parse_config("[tools]\nffmpeg_path = \"/nonexistent/ffmpeg\"\n").unwrap();
    assert!(config.tools.ffmpeg_path.is_some());
}

#[test]
fn invalid_toml_is_an_error() {
    assert!(parse_config("[server\nport = 1").is_err());
}

#[test]
fn load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camview.toml");
    std::fs::write(&path, "[probe]\ntimeout_ms = 250\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.probe.timeout(), Duration::from_millis(250));
}

#[test]
fn load_config_missing_file_names_path() {
    let err = load_config(std::path::Path::new("/nonexistent/camview.toml")).unwrap_err();
    assert!(err.to_string().contains("camview.toml"));
}

#[test]
fn explicit_path_wins_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config.server.port, 4242);
}

#[test]
fn default_config_round_trips_through_toml() {
    let text = toml::to_string(&Config::default()).unwrap();
    let config = parse_config(&text).unwrap();
    assert_eq!(config.server.port, 8080);
}
