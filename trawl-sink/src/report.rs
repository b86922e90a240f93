//! Closing run summaries, logged once collection and saving are done.
//!
//! These mirror what an operator wants to eyeball after a run: how much
//! came back, how engaged it was, how well the enrichment worked, and what
//! the file on disk looks like. Everything goes through `tracing` so the
//! summaries land in the same stream (and files) as the rest of the run.

use crate::record::{TweetRecord, VideoRecord};
use crate::writer::SavedFile;
use std::collections::HashMap;

/// First `max` characters with an ellipsis, safe on multibyte text.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Compact enrichment markers for a top-video line.
fn markers(record: &VideoRecord) -> String {
    let mut out = String::new();
    if record.is_relevant == Some(true) {
        out.push_str("[R]");
    }
    if record.transcript_available {
        out.push_str("[T]");
    }
    if record.comments_retrieved && record.comments_count > 0 {
        out.push_str("[C]");
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

/// Log the tweet-run summary: totals, link split, language histogram,
/// longest tweets, and the filter settings stamped on the records.
pub fn log_tweet_summary(records: &[TweetRecord]) {
    if records.is_empty() {
        tracing::info!("no tweets collected");
        return;
    }

    let total = records.len();
    let with_links = records.iter().filter(|r| r.has_links).count();
    let avg_clean_length =
        records.iter().map(|r| r.text_length).sum::<usize>() as f64 / total as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.lang.as_str()).or_default() += 1;
    }
    let mut langs: Vec<(&str, usize)> = counts.into_iter().collect();
    langs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let languages = langs
        .iter()
        .map(|(lang, n)| format!("{lang}:{n}"))
        .collect::<Vec<_>>()
        .join(" ");

    tracing::info!(
        total,
        with_links,
        without_links = total - with_links,
        avg_clean_length = format!("{avg_clean_length:.1}"),
        languages=%languages,
        "report.tweets"
    );

    let mut by_length: Vec<&TweetRecord> = records.iter().collect();
    by_length.sort_by(|a, b| b.text_length.cmp(&a.text_length));
    for (i, record) in by_length.iter().take(3).enumerate() {
        tracing::info!(
            rank = i + 1,
            chars = record.text_length,
            author=%record.author_username,
            preview=%preview(&record.clean_text, 80),
            "report.top_tweet"
        );
    }

    // Filter settings are stamped identically onto every record.
    let first = &records[0];
    tracing::info!(
        language=%first.language_filter,
        min_text_length = first.min_text_length_used,
        date_filter = first.date_filter_applied,
        content_filter = first.content_filter_applied,
        "report.filters_applied"
    );
}

/// Log the video-run summary: totals, engagement, relevance and
/// enrichment coverage, and the most-viewed videos.
pub fn log_video_summary(records: &[VideoRecord]) {
    if records.is_empty() {
        tracing::info!("no videos collected");
        return;
    }

    let total = records.len();
    let total_duration_secs: u64 = records.iter().map(|r| u64::from(r.duration)).sum();
    let total_views: u64 = records.iter().map(|r| r.stats.views).sum();
    tracing::info!(total, total_duration_secs, total_views, "report.videos");

    let scores: Vec<f64> = records.iter().filter_map(|r| r.relevance_score).collect();
    if !scores.is_empty() {
        let relevant = records
            .iter()
            .filter(|r| r.is_relevant == Some(true))
            .count();
        let avg_score = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!(
            relevant,
            graded = scores.len(),
            avg_score = format!("{avg_score:.3}"),
            "report.relevance"
        );
    }

    let transcript_lengths: Vec<usize> = records
        .iter()
        .filter_map(|r| r.transcript_text.as_ref().map(|t| t.chars().count()))
        .collect();
    if !transcript_lengths.is_empty() {
        let avg_chars =
            transcript_lengths.iter().sum::<usize>() as f64 / transcript_lengths.len() as f64;
        tracing::info!(
            with_transcript = transcript_lengths.len(),
            total,
            avg_transcript_chars = format!("{avg_chars:.0}"),
            "report.transcripts"
        );
    }

    let fetched: Vec<&VideoRecord> = records.iter().filter(|r| r.comments_retrieved).collect();
    if !fetched.is_empty() {
        let total_comments: usize = fetched.iter().map(|r| r.comments_count).sum();
        let avg_per_video = total_comments as f64 / fetched.len() as f64;
        tracing::info!(
            total_comments,
            videos_with_comments = fetched.len(),
            avg_per_video = format!("{avg_per_video:.1}"),
            "report.comments"
        );
    }

    let mut by_views: Vec<&VideoRecord> = records.iter().collect();
    by_views.sort_by(|a, b| b.stats.views.cmp(&a.stats.views));
    for (i, record) in by_views.iter().take(3).enumerate() {
        tracing::info!(
            rank = i + 1,
            views = record.stats.views,
            author=%record.author_username,
            markers=%markers(record),
            preview=%preview(&record.clean_description, 60),
            "report.top_video"
        );
    }
}

/// Log what the saved video file contains beyond its raw size: enrichment
/// coverage, comment paging, and the time the comment collection cost.
pub fn log_video_save_stats(records: &[VideoRecord], saved: &SavedFile) {
    let with_transcript = records.iter().filter(|r| r.transcript_available).count();
    let with_comments = records.iter().filter(|r| r.comments_retrieved).count();
    let total_comments: usize = records.iter().map(|r| r.comments_count).sum();
    let paginated = records
        .iter()
        .filter(|r| r.pagination_used == Some(true))
        .count();
    let comment_secs: f64 = records
        .iter()
        .filter_map(|r| r.collection_duration_seconds)
        .sum();
    let total_replies: u64 = records.iter().filter_map(|r| r.total_replies_count).sum();

    tracing::info!(
        path=%saved.path.display(),
        size_mb = format!("{:.2}", saved.size_mb()),
        records = saved.records,
        with_transcript,
        with_comments,
        total_comments,
        paginated_videos = paginated,
        comment_collection_secs = format!("{comment_secs:.2}"),
        total_replies,
        "report.save_stats"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MusicInfo, VideoStats};

    fn video(id: &str, views: u64) -> VideoRecord {
        VideoRecord {
            id: id.into(),
            description: "Pasta #cucina".into(),
            clean_description: "Pasta #cucina".into(),
            desc_length: 13,
            original_desc_length: 13,
            created_at: None,
            author_username: "nonna_rina".into(),
            author_nickname: "Nonna Rina".into(),
            author_id: "88".into(),
            duration: 42,
            stats: VideoStats {
                views,
                likes: 1,
                comments: 2,
                shares: 3,
            },
            music: MusicInfo::default(),
            hashtags: vec!["cucina".into()],
            tiktok_url: format!("https://www.tiktok.com/@nonna_rina/video/{id}"),
            video_url: None,
            cover_url: None,
            relevance_score: Some(0.75),
            hashtag_score: Some(0.6),
            description_score: Some(1.0),
            is_relevant: Some(true),
            transcript_text: Some("parliamo di pasta".into()),
            transcript_available: true,
            comments: vec![],
            comments_count: 5,
            comments_retrieved: true,
            pagination_used: Some(true),
            collection_duration_seconds: Some(2.5),
            total_replies_count: Some(4),
        }
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("ciao", 10), "ciao");
        assert_eq!(preview("caffè per tutti", 5), "caffè...");
        assert_eq!(preview("èèèèèè", 3), "èèè...");
    }

    #[test]
    fn markers_reflect_enrichment() {
        let mut record = video("1", 10);
        assert_eq!(markers(&record), "[R][T][C]");

        record.is_relevant = Some(false);
        record.transcript_available = false;
        record.comments_count = 0;
        assert_eq!(markers(&record), "-");
    }

    #[test]
    fn summaries_handle_empty_and_full_input() {
        // Smoke: no panics on either path.
        log_video_summary(&[]);
        log_tweet_summary(&[]);
        log_video_summary(&[video("1", 100), video("2", 50)]);
    }
}
