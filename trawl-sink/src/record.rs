//! Flattened output records and the per-run stamp written alongside them.
//!
//! These are the shapes that land on disk (and in object storage), not the
//! wire shapes the platform clients deserialize. Collection code in
//! `trawl-social` builds them; the writers in this crate serialize them.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use trawl_common::{Platform, SearchMode};

/// One collected tweet, cleaned and joined with its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetRecord {
    pub id: String,
    pub text: String,
    pub clean_text: String,
    /// Character count of `clean_text`.
    pub text_length: usize,
    /// Character count of the raw `text`.
    pub original_length: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    pub author_id: String,
    pub author_username: String,
    pub author_name: String,
    /// The hashtag the run searched for, without `#`.
    pub hashtag: String,
    pub lang: String,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
    /// Whether the raw text carried a `https://t.co/` short link.
    pub has_links: bool,
    pub meaningful_content: bool,
    pub language_filter: String,
    pub date_filter_applied: bool,
    pub content_filter_applied: bool,
    pub min_text_length_used: usize,
}

/// One collected video with optional transcript and comment enrichment.
///
/// The relevance quartet is present only for hashtag searches; user and
/// trending feeds carry no meaningful term to grade against. Comment and
/// pagination fields are populated only when the run asked for comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub description: String,
    pub clean_description: String,
    /// Character count of `clean_description`.
    pub desc_length: usize,
    /// Character count of the raw `description`.
    pub original_desc_length: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    pub author_username: String,
    pub author_nickname: String,
    pub author_id: String,
    /// Video length in seconds.
    pub duration: u32,
    pub stats: VideoStats,
    pub music: MusicInfo,
    pub hashtags: Vec<String>,
    /// Public watch URL, `https://www.tiktok.com/@{user}/video/{id}`.
    pub tiktok_url: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_relevant: Option<bool>,

    #[serde(default)]
    pub transcript_text: Option<String>,
    pub transcript_available: bool,

    pub comments: Vec<CommentRecord>,
    pub comments_count: usize,
    pub comments_retrieved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_replies_count: Option<u64>,
}

/// Engagement counters, renamed from the vendor's play/digg vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStats {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicInfo {
    pub id: String,
    pub title: String,
    pub author: String,
}

/// One video comment, with replies nested when the run fetched them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub text: String,
    pub likes: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentRecord>,
    pub reply_count: u64,
}

/// Traceability stamp merged into everything a run writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub platform: Platform,
    pub search_type: SearchMode,
    pub search_term: String,
    pub collection_time: String,
    #[serde(default)]
    pub file_number: Option<u32>,
}

impl RunMeta {
    pub fn new(platform: Platform, search_type: SearchMode, search_term: impl Into<String>) -> Self {
        Self {
            platform,
            search_type,
            search_term: search_term.into(),
            collection_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            file_number: None,
        }
    }

    /// File-name prefix when `--output-prefix` is empty.
    pub fn default_prefix(&self) -> String {
        format!("{}_scraper", self.platform)
    }

    /// Merge the stamp keys into a serialized record.
    ///
    /// Non-object values pass through untouched, which only happens if a
    /// caller hands us something that is not a record.
    pub fn stamp(&self, mut value: serde_json::Value, format: &str) -> serde_json::Value {
        if let Some(map) = value.as_object_mut() {
            map.insert("collection_time".into(), self.collection_time.clone().into());
            map.insert("search_type".into(), self.search_type.as_str().into());
            map.insert("search_term".into(), self.search_term.clone().into());
            map.insert("platform".into(), self.platform.as_str().into());
            if let Some(n) = self.file_number {
                map.insert("file_number".into(), n.into());
            }
            map.insert("format".into(), format.into());
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamp_merges_run_keys_into_objects() {
        let mut meta = RunMeta::new(Platform::TikTok, SearchMode::Hashtag, "cucina");
        meta.file_number = Some(3);

        let stamped = meta.stamp(json!({"id": "v1"}), "jsonl");
        assert_eq!(stamped["id"], "v1");
        assert_eq!(stamped["platform"], "tiktok");
        assert_eq!(stamped["search_type"], "hashtag");
        assert_eq!(stamped["search_term"], "cucina");
        assert_eq!(stamped["file_number"], 3);
        assert_eq!(stamped["format"], "jsonl");
        assert!(stamped["collection_time"].as_str().is_some());
    }

    #[test]
    fn default_prefix_names_the_platform() {
        let meta = RunMeta::new(Platform::Twitter, SearchMode::Hashtag, "pasta");
        assert_eq!(meta.default_prefix(), "twitter_scraper");
    }

    #[test]
    fn video_record_omits_ungraded_relevance() {
        let record = VideoRecord {
            id: "1".into(),
            description: "d".into(),
            clean_description: "d".into(),
            desc_length: 1,
            original_desc_length: 1,
            created_at: None,
            author_username: "u".into(),
            author_nickname: "n".into(),
            author_id: "a".into(),
            duration: 30,
            stats: VideoStats::default(),
            music: MusicInfo::default(),
            hashtags: vec![],
            tiktok_url: "https://www.tiktok.com/@u/video/1".into(),
            video_url: None,
            cover_url: None,
            relevance_score: None,
            hashtag_score: None,
            description_score: None,
            is_relevant: None,
            transcript_text: None,
            transcript_available: false,
            comments: vec![],
            comments_count: 0,
            comments_retrieved: false,
            pagination_used: None,
            collection_duration_seconds: None,
            total_replies_count: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("relevance_score").is_none());
        assert!(value.get("is_relevant").is_none());
        assert!(value.get("pagination_used").is_none());
        // Transcript keys stay present so consumers see an explicit null.
        assert!(value.get("transcript_text").is_some());
        assert_eq!(value["transcript_available"], false);
    }
}
