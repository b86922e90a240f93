//! Persistence for collected records: local files, object storage, reports.
//!
//! A run hands this crate its records plus a [`RunMeta`] stamp; the crate
//! picks the output path, writes JSON/JSONL/Parquet, optionally uploads to
//! S3, and logs the closing summary.

pub mod path;
pub mod record;
pub mod report;
pub mod s3;
pub mod writer;

pub use record::{CommentRecord, MusicInfo, RunMeta, TweetRecord, VideoRecord, VideoStats};
pub use writer::{write_records, SavedFile};
