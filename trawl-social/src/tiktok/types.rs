//! Wire shapes for the unofficial TikTok web API.
//!
//! Field names mirror the JSON payloads (camelCase on the wire, renamed
//! per field). Everything below the response envelope is optional or
//! defaulted; the API omits whole objects freely.

use serde::{Deserialize, Serialize};

/// Envelope for the item-list endpoints (challenge, user posts, trending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListResponse {
    #[serde(default, rename = "itemList")]
    pub item_list: Option<Vec<VideoItem>>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default, rename = "hasMore")]
    pub has_more: bool,
    #[serde(default, rename = "statusCode")]
    pub status_code: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeDetailResponse {
    #[serde(default, rename = "challengeInfo")]
    pub challenge_info: Option<ChallengeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default)]
    pub challenge: Option<ChallengeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetailResponse {
    #[serde(default, rename = "userInfo")]
    pub user_info: Option<UserInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub user: Option<UserData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    #[serde(rename = "secUid")]
    pub sec_uid: String,
    #[serde(default, rename = "uniqueId")]
    pub unique_id: Option<String>,
}

/// One video as it appears inside an item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub desc: String,
    /// Post time as Unix seconds; zero when the API withheld it.
    #[serde(default, rename = "createTime")]
    pub create_time: i64,
    #[serde(default)]
    pub author: Option<AuthorInfo>,
    #[serde(default)]
    pub stats: Option<StatsInfo>,
    #[serde(default)]
    pub video: Option<VideoInfo>,
    #[serde(default)]
    pub music: Option<MusicData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "uniqueId")]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsInfo {
    #[serde(default, rename = "playCount")]
    pub play_count: u64,
    #[serde(default, rename = "diggCount")]
    pub digg_count: u64,
    #[serde(default, rename = "commentCount")]
    pub comment_count: u64,
    #[serde(default, rename = "shareCount")]
    pub share_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Length in seconds.
    #[serde(default)]
    pub duration: u32,
    #[serde(default, rename = "playAddr")]
    pub play_addr: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "authorName")]
    pub author_name: Option<String>,
}

/// Envelope for the comment-list endpoints.
///
/// Unlike the item lists this one speaks snake_case and signals `has_more`
/// as 0/1 rather than a boolean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    #[serde(default)]
    pub comments: Option<Vec<CommentItem>>,
    #[serde(default)]
    pub cursor: i64,
    #[serde(default)]
    pub has_more: i64,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentItem {
    pub cid: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub digg_count: u64,
    /// Comment time as Unix seconds; zero when withheld.
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub user: Option<CommentUser>,
    #[serde(default)]
    pub reply_comment_total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentUser {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}
