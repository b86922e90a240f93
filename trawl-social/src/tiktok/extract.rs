//! Flatten wire items into output records.
//!
//! Missing author or stats objects degrade to placeholder values so one
//! malformed item never sinks a page. Enrichment fields (transcript,
//! comments, pagination counters) start empty; the collect loop fills them.
use crate::tiktok::types::{CommentItem, VideoItem};
use chrono::SecondsFormat;
use trawl_filter::Relevance;
use trawl_filter::clean;
use trawl_sink::{CommentRecord, MusicInfo, VideoRecord, VideoStats};

/// Render Unix seconds as RFC 3339, `None` when the API withheld the time.
fn timestamp_to_rfc3339(secs: i64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Flatten one feed item into a [`VideoRecord`].
///
/// `relevance` is the grade against the search term, already computed by
/// the caller for hashtag runs and `None` for user and trending feeds.
pub fn video_to_record(item: &VideoItem, relevance: Option<&Relevance>) -> VideoRecord {
    let clean_description = clean::clean_description(&item.desc);
    let desc_length = clean_description.chars().count();
    let original_desc_length = item.desc.chars().count();

    let author = item.author.as_ref();
    let author_username = author
        .and_then(|a| a.unique_id.clone())
        .unwrap_or_else(|| "unknown".into());
    let author_nickname = author
        .and_then(|a| a.nickname.clone())
        .unwrap_or_else(|| "unknown".into());
    let author_id = author
        .and_then(|a| a.id.clone())
        .unwrap_or_else(|| "unknown".into());

    let stats = item.stats.clone().unwrap_or_default();
    let music = item.music.clone().unwrap_or_default();
    let video = item.video.clone().unwrap_or_default();
    let tiktok_url = format!("https://www.tiktok.com/@{author_username}/video/{}", item.id);

    VideoRecord {
        id: item.id.clone(),
        description: item.desc.clone(),
        clean_description,
        desc_length,
        original_desc_length,
        created_at: timestamp_to_rfc3339(item.create_time),
        author_username,
        author_nickname,
        author_id,
        duration: video.duration,
        stats: VideoStats {
            views: stats.play_count,
            likes: stats.digg_count,
            comments: stats.comment_count,
            shares: stats.share_count,
        },
        music: MusicInfo {
            id: music.id.unwrap_or_default(),
            title: music.title.unwrap_or_default(),
            author: music.author_name.unwrap_or_default(),
        },
        hashtags: clean::extract_hashtags(&item.desc),
        tiktok_url,
        video_url: video.play_addr,
        cover_url: video.cover,
        relevance_score: relevance.map(|r| r.score),
        hashtag_score: relevance.map(|r| r.hashtag_score),
        description_score: relevance.map(|r| r.description_score),
        is_relevant: relevance.map(|r| r.is_relevant),
        transcript_text: None,
        transcript_available: false,
        comments: vec![],
        comments_count: 0,
        comments_retrieved: false,
        pagination_used: None,
        collection_duration_seconds: None,
        total_replies_count: None,
    }
}

/// Flatten one comment, trimming the text the way the keep-filter sees it.
pub fn comment_to_record(item: &CommentItem) -> CommentRecord {
    CommentRecord {
        id: item.cid.clone(),
        text: item.text.trim().to_string(),
        likes: item.digg_count,
        created_at: timestamp_to_rfc3339(item.create_time),
        author: item
            .user
            .as_ref()
            .and_then(|u| u.unique_id.clone())
            .unwrap_or_else(|| "unknown".into()),
        replies: vec![],
        reply_count: item.reply_comment_total.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiktok::types::{AuthorInfo, CommentUser, MusicData, StatsInfo, VideoInfo};

    fn full_item() -> VideoItem {
        VideoItem {
            id: "7300000001".into(),
            desc: "Pasta fatta in casa #cucina #pasta".into(),
            create_time: 1_718_000_000,
            author: Some(AuthorInfo {
                id: Some("88".into()),
                unique_id: Some("nonna_rina".into()),
                nickname: Some("Nonna Rina".into()),
            }),
            stats: Some(StatsInfo {
                play_count: 52_000,
                digg_count: 3_100,
                comment_count: 140,
                share_count: 95,
            }),
            video: Some(VideoInfo {
                duration: 42,
                play_addr: Some("https://v16.example/play".into()),
                cover: Some("https://p16.example/cover".into()),
            }),
            music: Some(MusicData {
                id: Some("m1".into()),
                title: Some("suono originale".into()),
                author_name: Some("nonna_rina".into()),
            }),
        }
    }

    #[test]
    fn full_item_flattens() {
        let record = video_to_record(&full_item(), None);
        assert_eq!(record.author_username, "nonna_rina");
        assert_eq!(record.duration, 42);
        assert_eq!(record.stats.views, 52_000);
        assert_eq!(record.hashtags, vec!["cucina", "pasta"]);
        assert_eq!(
            record.tiktok_url,
            "https://www.tiktok.com/@nonna_rina/video/7300000001"
        );
        assert_eq!(record.created_at.as_deref(), Some("2024-06-10T06:13:20Z"));
        assert!(record.relevance_score.is_none());
        assert!(!record.transcript_available);
        assert!(record.comments.is_empty());
    }

    #[test]
    fn bare_item_degrades_to_placeholders() {
        let item = VideoItem {
            id: "1".into(),
            desc: String::new(),
            create_time: 0,
            author: None,
            stats: None,
            video: None,
            music: None,
        };
        let record = video_to_record(&item, None);
        assert_eq!(record.author_username, "unknown");
        assert_eq!(record.author_id, "unknown");
        assert_eq!(record.duration, 0);
        assert_eq!(record.stats.views, 0);
        assert!(record.created_at.is_none());
        assert_eq!(record.tiktok_url, "https://www.tiktok.com/@unknown/video/1");
        assert_eq!(record.music.title, "");
    }

    #[test]
    fn relevance_grade_lands_on_the_record() {
        let relevance = Relevance::grade(
            "cucina",
            &["cucina".to_string(), "pasta".to_string()],
            "Pasta fatta in casa",
            0.45,
        );
        let record = video_to_record(&full_item(), Some(&relevance));
        assert_eq!(record.relevance_score, Some(relevance.score));
        assert_eq!(record.is_relevant, Some(relevance.is_relevant));
    }

    #[test]
    fn comment_text_is_trimmed() {
        let comment = CommentItem {
            cid: "c1".into(),
            text: "  che buono!  ".into(),
            digg_count: 12,
            create_time: 1_718_001_000,
            user: Some(CommentUser {
                unique_id: Some("marco".into()),
                nickname: Some("Marco".into()),
            }),
            reply_comment_total: Some(3),
        };
        let record = comment_to_record(&comment);
        assert_eq!(record.text, "che buono!");
        assert_eq!(record.author, "marco");
        assert_eq!(record.reply_count, 3);
        assert!(record.replies.is_empty());
    }

    #[test]
    fn anonymous_comment_author_is_unknown() {
        let comment = CommentItem {
            cid: "c2".into(),
            text: "ok".into(),
            digg_count: 0,
            create_time: 0,
            user: None,
            reply_comment_total: None,
        };
        let record = comment_to_record(&comment);
        assert_eq!(record.author, "unknown");
        assert!(record.created_at.is_none());
        assert_eq!(record.reply_count, 0);
    }
}
