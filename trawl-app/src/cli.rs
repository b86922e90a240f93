//! Command-line surface of the `trawl` binary.
//!
//! Flags whose type is `Option` fall back to the config file when omitted;
//! the merge happens in [`crate::plan`]. Range checks that span several
//! flags live there too, so everything clap can enforce on its own is
//! declared here and nothing else.

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "trawl",
    version,
    about = "Collect social-media posts and write them as JSON, JSONL or Parquet"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect recent tweets matching a hashtag
    Twitter(TwitterArgs),
    /// Collect videos from a hashtag, a user, or the trending feed
    Tiktok(TikTokArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Twitter(args) => &args.common,
            Command::Tiktok(args) => &args.common,
        }
    }
}

#[derive(Debug, Args)]
pub struct TwitterArgs {
    /// Hashtag to search, with or without the leading '#'
    #[arg(long)]
    pub hashtag: String,

    /// Tweet language filter [default: it]
    #[arg(long, value_parser = ["it", "en", "es", "fr", "de", "pt", "ja", "ko", "ar"])]
    pub lang: Option<String>,

    /// First day of the search window (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day of the search window (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Shortcut for a window covering the last N days (1-7)
    #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
    pub last_days: Option<i64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).multiple(false)))]
pub struct TikTokArgs {
    /// Hashtag feed, with or without the leading '#'
    #[arg(long, group = "source")]
    pub hashtag: Option<String>,

    /// A user's posts, with or without the leading '@'
    #[arg(long, group = "source")]
    pub user: Option<String>,

    /// The logged-out trending feed
    #[arg(long, group = "source")]
    pub trending: bool,

    /// Relevance cut-off for hashtag runs, 0.0-1.0 [default: 0.45]
    #[arg(long)]
    pub relevance_threshold: Option<f64>,

    /// Fetch a transcript for each collected video
    #[arg(long)]
    pub add_transcript: bool,

    /// Language hint for the transcription service
    #[arg(long, default_value = "auto")]
    pub transcript_language: String,

    /// Fetch top comments for each collected video
    #[arg(long)]
    pub add_comments: bool,

    /// Comments to keep per video (1-50)
    #[arg(long, default_value_t = 10)]
    pub max_comments: usize,

    /// Also fetch one page of replies per commented thread
    #[arg(long)]
    pub include_replies: bool,

    /// Shortest acceptable video, in seconds
    #[arg(long)]
    pub min_duration: Option<u32>,

    /// Longest acceptable video, in seconds
    #[arg(long)]
    pub max_duration: Option<u32>,

    /// Minimum view count
    #[arg(long)]
    pub min_views: Option<u64>,

    /// Keep only videos posted on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub created_after: Option<String>,

    /// Minimum description length for the content check [default: 10]
    #[arg(long)]
    pub min_desc_length: Option<usize>,

    /// Session token; falls back to MS_TOKEN or the config file
    #[arg(long)]
    pub ms_token: Option<String>,

    /// Browser identity presented to the feed API [default: chromium]
    #[arg(long, value_parser = ["chromium", "firefox", "webkit"])]
    pub browser: Option<String>,

    /// Route requests through the proxy named by PROXY_URL
    #[arg(long)]
    pub use_proxy: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// How many records to keep
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    /// Output format: json, jsonl or parquet [default: jsonl]
    #[arg(long, value_parser = ["json", "jsonl", "parquet"])]
    pub format: Option<String>,

    /// Directory for output files [default: data]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// File-name prefix; empty means "<platform>_scraper"
    #[arg(long, default_value = "")]
    pub output_prefix: String,

    /// Minimum cleaned-text length for the content check [default: 10]
    #[arg(long)]
    pub min_text_length: Option<usize>,

    /// Keep everything, skipping the meaningful-content check
    #[arg(long)]
    pub no_filter: bool,

    /// Log level: debug, info, warning or error [default: info]
    #[arg(long, value_parser = ["debug", "info", "warning", "error"])]
    pub log_level: Option<String>,

    /// Only errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the resolved run plan and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Upload the saved file to this bucket
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// Key prefix for uploaded objects
    #[arg(long)]
    pub s3_prefix: Option<String>,

    /// Remove the local file after a verified upload
    #[arg(long)]
    pub s3_only: bool,

    /// Explicit config file instead of the standard search order
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(argv)
    }

    #[test]
    fn twitter_defaults() {
        let cli = parse(&["trawl", "twitter", "--hashtag", "cucina"]).unwrap();
        let Command::Twitter(args) = cli.command else {
            panic!("expected twitter subcommand");
        };
        assert_eq!(args.hashtag, "cucina");
        assert_eq!(args.lang, None);
        assert_eq!(args.common.count, 20);
        assert_eq!(args.common.format, None);
        assert_eq!(args.common.output_prefix, "");
        assert!(!args.common.no_filter);
        assert!(!args.common.dry_run);
    }

    #[test]
    fn tiktok_defaults() {
        let cli = parse(&["trawl", "tiktok", "--trending"]).unwrap();
        let Command::Tiktok(args) = cli.command else {
            panic!("expected tiktok subcommand");
        };
        assert!(args.trending);
        assert_eq!(args.transcript_language, "auto");
        assert_eq!(args.max_comments, 10);
        assert_eq!(args.browser, None);
        assert!(!args.add_transcript);
    }

    #[test]
    fn tiktok_requires_exactly_one_source() {
        assert!(parse(&["trawl", "tiktok"]).is_err());
        assert!(parse(&["trawl", "tiktok", "--hashtag", "a", "--user", "b"]).is_err());
        assert!(parse(&["trawl", "tiktok", "--hashtag", "a", "--trending"]).is_err());
        assert!(parse(&["trawl", "tiktok", "--user", "b"]).is_ok());
    }

    #[test]
    fn last_days_excludes_explicit_dates() {
        let err = parse(&[
            "trawl",
            "twitter",
            "--hashtag",
            "a",
            "--last-days",
            "3",
            "--start-date",
            "2026-08-01",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(parse(&["trawl", "twitter", "--hashtag", "a", "-q", "-v"]).is_err());
        assert!(parse(&["trawl", "twitter", "--hashtag", "a", "-q"]).is_ok());
        assert!(parse(&["trawl", "twitter", "--hashtag", "a", "-v"]).is_ok());
    }

    #[test]
    fn choice_flags_reject_unknown_values() {
        assert!(parse(&["trawl", "twitter", "--hashtag", "a", "--lang", "xx"]).is_err());
        assert!(parse(&["trawl", "tiktok", "--trending", "--browser", "opera"]).is_err());
        assert!(parse(&["trawl", "tiktok", "--trending", "--format", "csv"]).is_err());
    }
}
