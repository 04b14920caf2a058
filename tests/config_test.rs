//! Configuration loading and validation.

use std::path::PathBuf;
use std::time::Duration;

use posterwall::config::{
    load_config, load_config_or_default, validate_config, Config, MAX_SCAN_INTERVAL_MINUTES,
};
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    validate_config(&config).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.library.movies_root(), PathBuf::from("/mnt/media/movies"));
    assert_eq!(config.library.tv_root(), PathBuf::from("/mnt/media/tv"));
    assert_eq!(config.library.scan_interval(), Some(Duration::from_secs(30 * 60)));
    assert_eq!(config.library.resolver_concurrency, 4);
    assert_eq!(config.catalog.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.catalog.min_request_interval(), Duration::from_millis(250));
    assert_eq!(config.retry.max_attempts, 3);
}

#[test]
fn partial_file_fills_in_defaults() {
    let (_dir, path) = write_config(
        r#"
[library]
share_root = "/srv/share"
scan_interval_minutes = 0
resolver_concurrency = 8

[catalog]
api_key = "secret"
"#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.library.share_root, PathBuf::from("/srv/share"));
    assert_eq!(config.library.scan_interval(), None);
    assert_eq!(config.library.resolver_concurrency, 8);
    assert_eq!(config.library.tv_subpath, "tv");
    assert_eq!(config.catalog.api_key, "secret");
    assert_eq!(config.catalog.language, "en-US");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn invalid_values_are_rejected() {
    for content in [
        "[library]\nresolver_concurrency = 0\n",
        "[library]\nmovies_subpath = \"media\"\ntv_subpath = \"media\"\n",
        "[catalog]\nconfidence_threshold = 1.5\n",
        "[catalog]\nrequest_timeout_secs = 0\n",
        "[retry]\nmax_attempts = 0\n",
        "[server]\nport = 0\n",
        "[library]\nscan_interval_minutes = 10081\n",
        "[library]\nscan_interval_minutes = 9223372036854775807\n",
    ] {
        let (_dir, path) = write_config(content);
        assert!(load_config(&path).is_err(), "accepted: {content}");
    }
}

#[test]
fn scan_interval_never_overflows() {
    let mut config = Config::default();
    config.library.scan_interval_minutes = MAX_SCAN_INTERVAL_MINUTES;
    validate_config(&config).unwrap();
    assert_eq!(
        config.library.scan_interval(),
        Some(Duration::from_secs(7 * 24 * 60 * 60))
    );

    config.library.scan_interval_minutes = u64::MAX;
    assert!(validate_config(&config).is_err());
    assert_eq!(
        config.library.scan_interval(),
        Some(Duration::from_secs(MAX_SCAN_INTERVAL_MINUTES * 60))
    );
}

#[test]
fn unparseable_file_is_an_error() {
    let (_dir, path) = write_config("[library\nshare_root = ");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn explicit_path_must_exist() {
    let dir = TempDir::new().unwrap();
    assert!(load_config_or_default(Some(&dir.path().join("missing.toml"))).is_err());
}
