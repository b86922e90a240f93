//! Resolved run plans: CLI flags merged over the config file.
//!
//! A plan is everything a run needs, validated and with every default
//! applied. `--dry-run` prints the plan through its `Display` impl, so the
//! rendering doubles as the documented behaviour of a run. Session tokens
//! are never rendered, only whether one is set.

use crate::cli::{CommonArgs, TikTokArgs, TwitterArgs};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use trawl_common::{OutputFormat, TrawlError, check_range};
use trawl_config::TrawlConfig;
use trawl_filter::VideoFilter;
use trawl_social::tiktok::{Browser, Feed};
use trawl_social::window::{DateWindow, parse_day};

#[derive(Debug)]
pub struct TwitterPlan {
    pub hashtag: String,
    pub lang: String,
    pub count: usize,
    pub window: Option<DateWindow>,
    pub min_text_length: usize,
    pub check_content: bool,
    pub batch_pause: Duration,
    pub sink: SinkPlan,
}

#[derive(Debug)]
pub struct TikTokPlan {
    pub feed: Feed,
    pub count: usize,
    pub relevance_threshold: f64,
    pub filter: VideoFilter,
    /// The `--created-after` day as given, kept for plan rendering; the
    /// filter carries the unix floor.
    pub created_after_day: Option<String>,
    pub add_transcript: bool,
    pub transcript_language: String,
    pub add_comments: bool,
    pub max_comments: usize,
    pub include_replies: bool,
    pub browser: Browser,
    pub ms_token: Option<String>,
    pub proxy: Option<String>,
    pub batch_pause: Duration,
    pub sink: SinkPlan,
}

#[derive(Debug)]
pub struct SinkPlan {
    pub format: OutputFormat,
    pub output_dir: PathBuf,
    /// `None` falls back to `<platform>_scraper`.
    pub output_prefix: Option<String>,
    pub s3: Option<S3Plan>,
}

#[derive(Debug)]
pub struct S3Plan {
    pub bucket: String,
    pub prefix: String,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub s3_only: bool,
}

impl TwitterPlan {
    pub fn resolve(args: &TwitterArgs, cfg: &TrawlConfig) -> Result<Self, TrawlError> {
        let hashtag = args.hashtag.trim_start_matches('#').to_string();
        if hashtag.is_empty() {
            return Err(TrawlError::InvalidArg("--hashtag cannot be empty".into()));
        }
        let count = check_range("count", args.common.count, 10, 500)?;

        let start = args.start_date.as_deref().map(parse_day).transpose()?;
        let end = args.end_date.as_deref().map(parse_day).transpose()?;
        let window = DateWindow::resolve(start, end, args.last_days)?;

        Ok(Self {
            hashtag,
            lang: args
                .lang
                .clone()
                .unwrap_or_else(|| cfg.collect.language.clone()),
            count,
            window,
            min_text_length: args
                .common
                .min_text_length
                .unwrap_or(cfg.filter.min_text_length),
            check_content: !args.common.no_filter,
            batch_pause: batch_pause(cfg),
            sink: resolve_sink(&args.common, cfg)?,
        })
    }
}

impl TikTokPlan {
    pub fn resolve(args: &TikTokArgs, cfg: &TrawlConfig) -> Result<Self, TrawlError> {
        let feed = resolve_feed(args)?;
        let count = check_range("count", args.common.count, 5, 100)?;
        let max_comments = check_range("max-comments", args.max_comments, 1, 50)?;
        let relevance_threshold = check_range(
            "relevance-threshold",
            args.relevance_threshold
                .unwrap_or(cfg.filter.relevance_threshold),
            0.0,
            1.0,
        )?;

        if let (Some(min), Some(max)) = (args.min_duration, args.max_duration) {
            if min >= max {
                return Err(TrawlError::InvalidArg(format!(
                    "--min-duration ({min}) must be below --max-duration ({max})"
                )));
            }
        }
        let created_after = args
            .created_after
            .as_deref()
            .map(|day| {
                parse_day(day).map(|d| {
                    d.with_hms(0, 0, 0)
                        .expect("valid midnight time")
                        .assume_utc()
                        .unix_timestamp()
                })
            })
            .transpose()?;

        if args.include_replies && !args.add_comments {
            tracing::warn!("--include-replies has no effect without --add-comments");
        }

        let browser: Browser = args
            .browser
            .as_deref()
            .unwrap_or(&cfg.tiktok.browser)
            .parse()
            .map_err(TrawlError::InvalidArg)?;

        let proxy = if args.use_proxy {
            let proxy = cfg.tiktok.proxy.clone().filter(|p| !p.is_empty());
            if proxy.is_none() {
                tracing::warn!("--use-proxy set but no proxy configured (PROXY_URL or tiktok.proxy)");
            }
            proxy
        } else {
            None
        };

        let filter = VideoFilter {
            search_term: feed.term().to_string(),
            min_duration_secs: args.min_duration,
            max_duration_secs: args.max_duration,
            min_views: args.min_views,
            created_after,
            min_desc_length: args.min_desc_length.unwrap_or(cfg.filter.min_desc_length),
            check_description: !args.common.no_filter,
        };

        Ok(Self {
            feed,
            count,
            relevance_threshold,
            filter,
            created_after_day: args.created_after.clone(),
            add_transcript: args.add_transcript,
            transcript_language: args.transcript_language.clone(),
            add_comments: args.add_comments,
            max_comments,
            include_replies: args.include_replies,
            browser,
            ms_token: args
                .ms_token
                .clone()
                .or_else(|| cfg.tiktok.ms_token.clone())
                .filter(|t| !t.is_empty()),
            proxy,
            batch_pause: batch_pause(cfg),
            sink: resolve_sink(&args.common, cfg)?,
        })
    }
}

fn resolve_feed(args: &TikTokArgs) -> Result<Feed, TrawlError> {
    if let Some(tag) = &args.hashtag {
        let tag = tag.trim_start_matches('#');
        if tag.is_empty() {
            return Err(TrawlError::InvalidArg("--hashtag cannot be empty".into()));
        }
        return Ok(Feed::Hashtag(tag.to_string()));
    }
    if let Some(user) = &args.user {
        let user = user.trim_start_matches('@');
        if user.is_empty() {
            return Err(TrawlError::InvalidArg("--user cannot be empty".into()));
        }
        return Ok(Feed::User(user.to_string()));
    }
    if args.trending {
        return Ok(Feed::Trending);
    }
    // clap's source group enforces this; kept for programmatic callers.
    Err(TrawlError::InvalidArg(
        "one of --hashtag, --user or --trending is required".into(),
    ))
}

fn resolve_sink(common: &CommonArgs, cfg: &TrawlConfig) -> Result<SinkPlan, TrawlError> {
    let format: OutputFormat = common
        .format
        .as_deref()
        .unwrap_or(&cfg.collect.format)
        .parse()?;

    let output_dir = common
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.collect.output_dir));
    std::fs::create_dir_all(&output_dir).map_err(|err| {
        TrawlError::Config(format!(
            "cannot create output dir {}: {err}",
            output_dir.display()
        ))
    })?;

    let bucket = common
        .s3_bucket
        .clone()
        .or_else(|| cfg.storage.bucket.clone())
        .filter(|b| !b.is_empty());
    let s3_only = common.s3_only || cfg.storage.s3_only;
    if s3_only && bucket.is_none() {
        return Err(TrawlError::InvalidArg(
            "--s3-only requires --s3-bucket (or storage.bucket)".into(),
        ));
    }
    let s3 = bucket.map(|bucket| S3Plan {
        bucket,
        prefix: common
            .s3_prefix
            .clone()
            .or_else(|| cfg.storage.prefix.clone())
            .unwrap_or_default(),
        endpoint: cfg.storage.endpoint_url.clone(),
        region: cfg.storage.region.clone(),
        s3_only,
    });

    Ok(SinkPlan {
        format,
        output_dir,
        output_prefix: Some(common.output_prefix.clone()).filter(|p| !p.is_empty()),
        s3,
    })
}

fn batch_pause(cfg: &TrawlConfig) -> Duration {
    Duration::from_secs_f64(cfg.collect.batch_pause_secs.max(0.0))
}

fn feed_label(feed: &Feed) -> String {
    match feed {
        Feed::Hashtag(tag) => format!("#{tag}"),
        Feed::User(name) => format!("@{name}"),
        Feed::Trending => "trending".into(),
    }
}

fn filter_label(on: bool, min_len: usize) -> String {
    if on {
        format!("on (min {min_len} chars)")
    } else {
        "off".into()
    }
}

impl fmt::Display for TwitterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "twitter run plan")?;
        writeln!(f, "  {:<18}#{}", "hashtag:", self.hashtag)?;
        writeln!(f, "  {:<18}{}", "language:", self.lang)?;
        writeln!(f, "  {:<18}{}", "count:", self.count)?;
        match &self.window {
            Some(window) => writeln!(f, "  {:<18}{}", "window:", window)?,
            None => writeln!(f, "  {:<18}most recent (about 7 days)", "window:")?,
        }
        writeln!(
            f,
            "  {:<18}{}",
            "content filter:",
            filter_label(self.check_content, self.min_text_length)
        )?;
        write!(f, "{}", self.sink)
    }
}

impl fmt::Display for TikTokPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tiktok run plan")?;
        writeln!(f, "  {:<18}{}", "feed:", feed_label(&self.feed))?;
        writeln!(f, "  {:<18}{}", "count:", self.count)?;
        if matches!(self.feed, Feed::Hashtag(_)) {
            writeln!(f, "  {:<18}threshold {}", "relevance:", self.relevance_threshold)?;
        }
        match (self.filter.min_duration_secs, self.filter.max_duration_secs) {
            (Some(min), Some(max)) => writeln!(f, "  {:<18}{min}s to {max}s", "duration:")?,
            (Some(min), None) => writeln!(f, "  {:<18}at least {min}s", "duration:")?,
            (None, Some(max)) => writeln!(f, "  {:<18}at most {max}s", "duration:")?,
            (None, None) => {}
        }
        if let Some(min) = self.filter.min_views {
            writeln!(f, "  {:<18}{min}", "min views:")?;
        }
        if let Some(day) = &self.created_after_day {
            writeln!(f, "  {:<18}{day} or later", "posted:")?;
        }
        writeln!(
            f,
            "  {:<18}{}",
            "content filter:",
            filter_label(self.filter.check_description, self.filter.min_desc_length)
        )?;
        if self.add_transcript {
            writeln!(
                f,
                "  {:<18}on (language {})",
                "transcripts:", self.transcript_language
            )?;
        }
        if self.add_comments {
            let replies = if self.include_replies {
                ", with replies"
            } else {
                ""
            };
            writeln!(
                f,
                "  {:<18}up to {} per video{replies}",
                "comments:", self.max_comments
            )?;
        }
        writeln!(f, "  {:<18}{}", "browser:", self.browser)?;
        writeln!(
            f,
            "  {:<18}{}",
            "session token:",
            if self.ms_token.is_some() {
                "set"
            } else {
                "not set"
            }
        )?;
        if self.proxy.is_some() {
            writeln!(f, "  {:<18}configured", "proxy:")?;
        }
        write!(f, "{}", self.sink)
    }
}

impl fmt::Display for SinkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<18}{}", "format:", self.format)?;
        writeln!(f, "  {:<18}{}", "output dir:", self.output_dir.display())?;
        if let Some(prefix) = &self.output_prefix {
            writeln!(f, "  {:<18}{}", "output prefix:", prefix)?;
        }
        match &self.s3 {
            Some(s3) => {
                let tail = if s3.s3_only {
                    " (local copy removed)"
                } else {
                    ""
                };
                writeln!(f, "  {:<18}s3://{}/{}{}", "upload:", s3.bucket, s3.prefix, tail)
            }
            None => writeln!(f, "  {:<18}off", "upload:"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn twitter_args(extra: &[&str]) -> TwitterArgs {
        let mut argv = vec!["trawl", "twitter", "--hashtag", "#cucina"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Twitter(args) => args,
            _ => unreachable!(),
        }
    }

    fn tiktok_args(extra: &[&str]) -> TikTokArgs {
        let mut argv = vec!["trawl", "tiktok"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Tiktok(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn twitter_plan_applies_defaults_and_strips_hash() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let args = twitter_args(&["--output-dir", out.to_str().unwrap()]);

        let plan = TwitterPlan::resolve(&args, &TrawlConfig::default()).unwrap();
        assert_eq!(plan.hashtag, "cucina");
        assert_eq!(plan.lang, "it");
        assert_eq!(plan.count, 20);
        assert_eq!(plan.min_text_length, 10);
        assert!(plan.check_content);
        assert!(plan.window.is_none());
        assert_eq!(plan.sink.format, OutputFormat::Jsonl);
        assert_eq!(plan.sink.output_prefix, None);
        assert!(plan.sink.s3.is_none());
        assert!(out.is_dir());
    }

    #[test]
    fn count_ranges_are_per_platform() {
        let err = TwitterPlan::resolve(
            &twitter_args(&["--count", "7"]),
            &TrawlConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("between 10 and 500"));

        let err = TikTokPlan::resolve(
            &tiktok_args(&["--trending", "--count", "4"]),
            &TrawlConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("between 5 and 100"));
    }

    #[test]
    fn duration_bounds_must_be_ordered() {
        let args = tiktok_args(&["--trending", "--min-duration", "60", "--max-duration", "30"]);
        let err = TikTokPlan::resolve(&args, &TrawlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--min-duration"));
    }

    #[test]
    fn relevance_threshold_is_bounded() {
        let args = tiktok_args(&["--hashtag", "cucina", "--relevance-threshold", "1.5"]);
        let err = TikTokPlan::resolve(&args, &TrawlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("relevance-threshold"));
    }

    #[test]
    fn created_after_becomes_a_unix_floor() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let args = tiktok_args(&[
            "--trending",
            "--created-after",
            "2026-08-01",
            "--output-dir",
            out.to_str().unwrap(),
        ]);

        let plan = TikTokPlan::resolve(&args, &TrawlConfig::default()).unwrap();
        // 2026-08-01T00:00:00Z
        assert_eq!(plan.filter.created_after, Some(1_785_542_400));
        assert_eq!(plan.created_after_day.as_deref(), Some("2026-08-01"));
    }

    #[test]
    fn s3_only_requires_a_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let err = TwitterPlan::resolve(
            &twitter_args(&["--s3-only", "--output-dir", out.to_str().unwrap()]),
            &TrawlConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--s3-only"));

        let plan = TwitterPlan::resolve(
            &twitter_args(&[
                "--s3-only",
                "--s3-bucket",
                "archive",
                "--output-dir",
                out.to_str().unwrap(),
            ]),
            &TrawlConfig::default(),
        )
        .unwrap();
        let s3 = plan.sink.s3.unwrap();
        assert_eq!(s3.bucket, "archive");
        assert!(s3.s3_only);
    }

    #[test]
    fn cli_ms_token_beats_config() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut cfg = TrawlConfig::default();
        cfg.tiktok.ms_token = Some("from-config".into());

        let plan = TikTokPlan::resolve(
            &tiktok_args(&["--trending", "--output-dir", out.to_str().unwrap()]),
            &cfg,
        )
        .unwrap();
        assert_eq!(plan.ms_token.as_deref(), Some("from-config"));

        let plan = TikTokPlan::resolve(
            &tiktok_args(&[
                "--trending",
                "--ms-token",
                "from-cli",
                "--output-dir",
                out.to_str().unwrap(),
            ]),
            &cfg,
        )
        .unwrap();
        assert_eq!(plan.ms_token.as_deref(), Some("from-cli"));
    }

    #[test]
    fn dry_run_plan_renders_without_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let args = tiktok_args(&[
            "--hashtag",
            "#cucina",
            "--add-comments",
            "--include-replies",
            "--ms-token",
            "super-secret",
            "--output-dir",
            out.to_str().unwrap(),
        ]);

        let plan = TikTokPlan::resolve(&args, &TrawlConfig::default()).unwrap();
        let rendered = plan.to_string();
        assert!(rendered.contains("#cucina"));
        assert!(rendered.contains("threshold 0.45"));
        assert!(rendered.contains("up to 10 per video, with replies"));
        assert!(rendered.contains("session token:"));
        assert!(!rendered.contains("super-secret"));

        let args = twitter_args(&[
            "--last-days",
            "3",
            "--output-dir",
            out.to_str().unwrap(),
        ]);
        let plan = TwitterPlan::resolve(&args, &TrawlConfig::default()).unwrap();
        let rendered = plan.to_string();
        assert!(rendered.contains("#cucina"));
        assert!(rendered.contains("jsonl"));
    }
}
