//! TikTok collection: feed paging, extraction, filtering, and enrichment.
//!
//! The client talks to the unofficial web API, so responses are treated as
//! hostile: every field is optional on the wire and extraction degrades to
//! placeholder values instead of failing a whole batch.

pub mod client;
pub mod collect;
pub mod extract;
pub mod transcript;
pub mod types;

pub use client::{Browser, TikTokApi};
pub use collect::{Feed, VideoQuery, collect_videos};
pub use transcript::TranscriptClient;
