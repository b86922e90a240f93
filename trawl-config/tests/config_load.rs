use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use trawl_config::TrawlConfigLoader;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: 0.1
twitter:
  bearer_token: "${TWITTER_BEARER_TOKEN}"
tiktok:
  browser: firefox
collect:
  output_dir: "collected"
  format: json
  language: en
filter:
  relevance_threshold: 0.6
storage:
  bucket: trawl-archive
  prefix: runs/
  s3_only: true
logging:
  format: json
  "#;
    let p = write_yaml(&tmp, "trawl.yaml", file_yaml);

    temp_env::with_var("TWITTER_BEARER_TOKEN", Some("file-token"), || {
        let config = TrawlConfigLoader::new()
            .with_file(p.clone())
            .load()
            .expect("load config");

        assert_eq!(config.twitter.bearer_token.as_deref(), Some("file-token"));
        assert_eq!(config.tiktok.browser, "firefox");
        assert_eq!(config.collect.output_dir, "collected");
        assert_eq!(config.collect.format, "json");
        assert_eq!(config.collect.language, "en");
        assert_eq!(config.filter.relevance_threshold, 0.6);
        assert_eq!(config.storage.bucket.as_deref(), Some("trawl-archive"));
        assert!(config.storage.s3_only);
        assert_eq!(config.logging.format, "json");
        // Untouched sections keep their defaults.
        assert_eq!(config.filter.min_desc_length, 10);
        assert_eq!(config.collect.batch_pause_secs, 1.0);
    });
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "trawl.yaml",
        "collect:\n  output_dir: from-file\n  language: it\n",
    );

    temp_env::with_vars(
        [
            ("TRAWL__COLLECT__OUTPUT_DIR", Some("from-env")),
            ("TRAWL__FILTER__MIN_TEXT_LENGTH", Some("25")),
        ],
        || {
            let config = TrawlConfigLoader::new()
                .with_file(p.clone())
                .load()
                .expect("load config");

            assert_eq!(config.collect.output_dir, "from-env");
            assert_eq!(config.collect.language, "it");
            assert_eq!(config.filter.min_text_length, 25);
        },
    );
}
