//! Loader for collector configuration with YAML + environment overlays.
//!
//! Precedence, later wins: built-in defaults, then an optional YAML file
//! (`TRAWL_CONFIG` path override, else `trawl.yaml` in the working
//! directory, else `~/.config/trawl/config.yaml`), then `TRAWL__`-prefixed
//! environment variables (`__` separates sections, e.g.
//! `TRAWL__STORAGE__BUCKET`). After merging, every string value undergoes
//! recursive `${VAR}` expansion.
//!
//! Credentials additionally honour the conventional bare env vars
//! (`TWITTER_BEARER_TOKEN`, `MS_TOKEN`) when the sectioned keys are
//! absent. A missing credential is only an error once the platform that
//! needs it is actually invoked; see [`TrawlConfig::require_bearer_token`].
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct TrawlConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub twitter: TwitterSection,
    #[serde(default)]
    pub tiktok: TikTokSection,
    #[serde(default)]
    pub collect: CollectSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct TwitterSection {
    /// App-only bearer token for the v2 search API.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TikTokSection {
    /// Session token the feed API expects as a query parameter.
    pub ms_token: Option<String>,
    /// Browser identity presented to the feed API.
    #[serde(default = "default_browser")]
    pub browser: String,
    pub proxy: Option<String>,
    /// Key for the secondary transcription API.
    pub transcript_api_key: Option<String>,
}

impl Default for TikTokSection {
    fn default() -> Self {
        Self {
            ms_token: None,
            browser: default_browser(),
            proxy: None,
            transcript_api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CollectSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// json | jsonl | parquet
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Fixed sleep between pagination batches, in seconds.
    #[serde(default = "default_batch_pause")]
    pub batch_pause_secs: f64,
}

impl Default for CollectSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: default_format(),
            language: default_language(),
            batch_pause_secs: default_batch_pause(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    #[serde(default = "default_min_len")]
    pub min_text_length: usize,
    #[serde(default = "default_min_len")]
    pub min_desc_length: usize,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            min_text_length: default_min_len(),
            min_desc_length: default_min_len(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageSection {
    pub bucket: Option<String>,
    /// Key prefix prepended to uploaded objects.
    pub prefix: Option<String>,
    /// Custom endpoint for S3-compatible stores (forces path-style).
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    /// Delete the local file after a verified upload.
    #[serde(default)]
    pub s3_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub dir: Option<String>,
    /// text | json
    #[serde(default = "default_log_format")]
    pub format: String,
    pub level: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            format: default_log_format(),
            level: None,
        }
    }
}

fn default_browser() -> String {
    "chromium".into()
}
fn default_output_dir() -> String {
    "data".into()
}
fn default_format() -> String {
    "jsonl".into()
}
fn default_language() -> String {
    "it".into()
}
fn default_batch_pause() -> f64 {
    1.0
}
fn default_relevance_threshold() -> f64 {
    0.45
}
fn default_min_len() -> usize {
    10
}
fn default_log_format() -> String {
    "text".into()
}

impl TrawlConfig {
    /// Bearer token for the search API, or a field-naming error.
    pub fn require_bearer_token(&self) -> Result<&str, ConfigError> {
        self.twitter
            .bearer_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Message(
                    "twitter.bearer_token is not set (or export TWITTER_BEARER_TOKEN)".into(),
                )
            })
    }

    /// Session token for the feed API, or a field-naming error.
    pub fn require_ms_token(&self) -> Result<&str, ConfigError> {
        self.tiktok
            .ms_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Message("tiktok.ms_token is not set (or export MS_TOKEN)".into())
            })
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Start with sensible defaults: `TRAWL__` env overrides only.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let config = TrawlConfigLoader::new().load().expect("valid config");
    ///
    /// assert_eq!(config.collect.language, "it");
    /// assert_eq!(config.filter.relevance_threshold, 0.45);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()));
        self
    }

    /// Attach the first config file found by the standard search order, if
    /// any: `TRAWL_CONFIG` (must exist when set), `./trawl.yaml`,
    /// `~/.config/trawl/config.yaml`.
    pub fn with_discovered_file(self) -> Self {
        if let Ok(explicit) = std::env::var("TRAWL_CONFIG") {
            return self.with_file(PathBuf::from(explicit));
        }
        let cwd = PathBuf::from("trawl.yaml");
        if cwd.is_file() {
            return self.with_file(cwd);
        }
        if let Some(home) = dirs::config_dir() {
            let candidate = home.join("trawl").join("config.yaml");
            if candidate.is_file() {
                return self.with_file(candidate);
            }
        }
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let cfg = TrawlConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// collect:
    ///   language: "en"
    ///   output_dir: "out"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.collect.language, "en");
    /// assert_eq!(cfg.collect.output_dir, "out");
    /// assert_eq!(cfg.collect.format, "jsonl");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// The loader combines YAML with `TRAWL__`-prefixed environment variables,
    /// expands `${VAR}` placeholders, and finally applies the bare credential
    /// env fallbacks.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// unsafe { std::env::set_var("SEKRIT", "injected-from-env"); }
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// twitter:
    ///   bearer_token: "${SEKRIT}"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.twitter.bearer_token.as_deref(), Some("injected-from-env"));
    ///
    /// unsafe { std::env::remove_var("SEKRIT"); }
    /// ```
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        // Env goes in last so `TRAWL__...` always beats file values.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("TRAWL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        // Recursively expand environment variables
        expand_env_in_value(&mut v);

        // Deserialize into the strongly-typed config
        let mut typed: TrawlConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        // Conventional bare env vars fill in missing credentials
        if typed.twitter.bearer_token.is_none() {
            typed.twitter.bearer_token = std::env::var("TWITTER_BEARER_TOKEN").ok();
        }
        if typed.tiktok.ms_token.is_none() {
            typed.tiktok.ms_token = std::env::var("MS_TOKEN").ok();
        }
        if typed.tiktok.proxy.is_none() {
            typed.tiktok.proxy = std::env::var("PROXY_URL").ok();
        }
        if typed.tiktok.transcript_api_key.is_none() {
            typed.tiktok.transcript_api_key = std::env::var("RAPIDAPI_KEY")
                .or_else(|_| std::env::var("TIKTOK_TRANSCRIPT_API_KEY"))
                .ok();
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use temp_env;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                // BAR references BAZ; FOO references BAR: two hops.
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                // Without recursive expansion this would stop at "X=start-${BAR}-end".
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // We don't care about exact final string, only that the function terminates
            // and doesn't loop forever. With the depth cap, this will stop.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            // And we expect it to still contain unresolved ${...} due to the cycle.
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    #[serial]
    fn bare_credential_fallbacks_apply() {
        temp_env::with_vars(
            [
                ("TWITTER_BEARER_TOKEN", Some("tw-tok")),
                ("MS_TOKEN", Some("tt-tok")),
                ("RAPIDAPI_KEY", Some("ra-key")),
            ],
            || {
                let cfg = TrawlConfigLoader::new().load().unwrap();
                assert_eq!(cfg.twitter.bearer_token.as_deref(), Some("tw-tok"));
                assert_eq!(cfg.tiktok.ms_token.as_deref(), Some("tt-tok"));
                assert_eq!(cfg.tiktok.transcript_api_key.as_deref(), Some("ra-key"));
            },
        );
    }

    #[test]
    #[serial]
    fn sectioned_key_beats_bare_fallback() {
        temp_env::with_var("TWITTER_BEARER_TOKEN", Some("fallback"), || {
            let cfg = TrawlConfigLoader::new()
                .with_yaml_str("twitter:\n  bearer_token: \"primary\"\n")
                .load()
                .unwrap();
            assert_eq!(cfg.twitter.bearer_token.as_deref(), Some("primary"));
        });
    }

    #[test]
    fn require_helpers_name_the_field() {
        let cfg = TrawlConfig::default();
        let err = cfg.require_bearer_token().unwrap_err().to_string();
        assert!(err.contains("twitter.bearer_token"));
        let err = cfg.require_ms_token().unwrap_err().to_string();
        assert!(err.contains("tiktok.ms_token"));
    }
}
