//! Common types and utilities shared across Trawl crates.
//!
//! This crate defines the shared vocabulary of the collector (which
//! platform a run targets, what kind of search it performs, and the output
//! format it writes) plus observability helpers and the shared error
//! type. It is intentionally lightweight and dependency-minimal so that
//! all crates can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`Platform`], [`SearchMode`], [`OutputFormat`]: run vocabulary
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TrawlError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use trawl_common::{OutputFormat, SearchMode};
//!
//! let fmt: OutputFormat = "jsonl".parse().unwrap();
//! assert_eq!(fmt.extension(), "jsonl");
//! assert_eq!(SearchMode::Hashtag.to_string(), "hashtag");
//! ```
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod observability;

/// Which upstream platform a run collects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    TikTok,
}

impl Platform {
    /// Lowercase name as stamped into saved metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::TikTok => "tiktok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of search a run performs.
///
/// `Trending` carries no term; the other modes carry the hashtag or
/// username they target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Hashtag,
    User,
    Trending,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Hashtag => "hashtag",
            SearchMode::User => "user",
            SearchMode::Trending => "trending",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk serialization format for collected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Jsonl,
    Parquet,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// MIME type used for uploads.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Jsonl => "application/x-ndjson",
            OutputFormat::Parquet => "application/octet-stream",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TrawlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(TrawlError::InvalidArg(format!(
                "unknown output format `{other}` (expected json, jsonl or parquet)"
            ))),
        }
    }
}

/// Error types used across the Trawl system.
#[derive(thiserror::Error, Debug)]
pub enum TrawlError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A flag or parameter failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// A date string did not match the accepted format.
    #[error("Invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A collection stage failed downstream.
    #[error("Collection failed: {0}")]
    Collect(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`TrawlError`].
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Check that `value` lies in `lo..=hi`, naming the flag on failure.
///
/// Shared by the CLI and by library entry points that accept the same
/// parameters programmatically.
pub fn check_range<T: PartialOrd + fmt::Display>(
    flag: &str,
    value: T,
    lo: T,
    hi: T,
) -> Result<T> {
    if value < lo || value > hi {
        return Err(TrawlError::InvalidArg(format!(
            "--{flag} must be between {lo} and {hi}, got {value}"
        )));
    }
    Ok(value)
}
