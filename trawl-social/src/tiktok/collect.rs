//! Feed paging, filtering, and per-video enrichment.
//!
//! The feed is over-fetched relative to the requested count because the
//! filters drop an unpredictable share of each page. Enrichment (transcripts,
//! comments, replies) runs per accepted video between feed pages, which is
//! where most of a run's wall-clock time goes.
use crate::page::{BatchSource, Pager, PagerStats};
use crate::tiktok::client::TikTokApi;
use crate::tiktok::extract;
use crate::tiktok::transcript::TranscriptClient;
use crate::tiktok::types::{CommentItem, VideoItem};
use async_trait::async_trait;
use futures::{StreamExt, pin_mut};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trawl_common::SearchMode;
use trawl_filter::{Relevance, VideoFilter, clean};
use trawl_sink::{CommentRecord, VideoRecord};

/// Videos requested per feed page.
const PAGE_SIZE: u32 = 30;
/// Comments requested per page.
const COMMENT_BATCH: u32 = 20;
/// Pause between comment pages.
const COMMENT_PAUSE: Duration = Duration::from_secs(1);
/// Replies fetched per commented-on comment (one page, no paging).
const REPLY_PAGE: u32 = 10;
/// Fetch at most this multiple of the requested count from the feed.
const FETCH_MULTIPLE: usize = 3;
/// Process at most this multiple of the requested count before giving up.
const PROCESS_MULTIPLE: usize = 5;

/// Which feed a run reads.
#[derive(Clone, Debug)]
pub enum Feed {
    /// Videos under a hashtag (challenge), without the leading `#`.
    Hashtag(String),
    /// A user's posts, by username without the leading `@`.
    User(String),
    /// The logged-out trending feed.
    Trending,
}

impl Feed {
    pub fn mode(&self) -> SearchMode {
        match self {
            Feed::Hashtag(_) => SearchMode::Hashtag,
            Feed::User(_) => SearchMode::User,
            Feed::Trending => SearchMode::Trending,
        }
    }

    /// Term stamped into saved metadata.
    pub fn term(&self) -> &str {
        match self {
            Feed::Hashtag(tag) => tag,
            Feed::User(name) => name,
            Feed::Trending => "trending",
        }
    }
}

/// One video collection run's parameters.
#[derive(Clone, Debug)]
pub struct VideoQuery {
    pub feed: Feed,
    /// How many videos to keep.
    pub count: usize,
    /// Relevance cut-off for hashtag runs; ignored for other feeds.
    pub relevance_threshold: f64,
    pub filter: VideoFilter,
    pub add_comments: bool,
    pub max_comments: usize,
    pub include_replies: bool,
    /// Language hint passed to the transcription service.
    pub transcript_language: String,
    /// Pause between feed pages.
    pub batch_pause: Duration,
    pub cancel: CancellationToken,
}

/// Paging position within whichever feed the run reads.
enum FeedCursor {
    Challenge { id: String, cursor: Option<String> },
    User { sec_uid: String, cursor: Option<String> },
    Trending,
}

/// [`BatchSource`] over feed pages, capped at `limit` items total.
struct FeedSource<'a> {
    api: &'a TikTokApi,
    cursor: FeedCursor,
    page_size: u32,
    limit: usize,
    yielded: usize,
    done: bool,
}

#[async_trait]
impl BatchSource for FeedSource<'_> {
    type Item = VideoItem;

    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<VideoItem>>> {
        if self.done || self.yielded >= self.limit {
            return Ok(None);
        }

        let page = match &mut self.cursor {
            FeedCursor::Challenge { id, cursor } => {
                let page = self
                    .api
                    .challenge_items(id, self.page_size, cursor.as_deref())
                    .await?;
                *cursor = page.cursor.clone();
                page
            }
            FeedCursor::User { sec_uid, cursor } => {
                let page = self
                    .api
                    .user_items(sec_uid, self.page_size, cursor.as_deref())
                    .await?;
                *cursor = page.cursor.clone();
                page
            }
            FeedCursor::Trending => self.api.trending_items(self.page_size).await?,
        };

        if page.status_code != 0 {
            tracing::warn!(status = page.status_code, "tiktok.feed.status_error");
            return Ok(None);
        }
        self.done = !page.has_more;

        let mut items = page.item_list.unwrap_or_default();
        if items.is_empty() {
            return Ok(None);
        }
        items.truncate(self.limit - self.yielded);
        self.yielded += items.len();
        Ok(Some(items))
    }
}

/// Collect up to `q.count` videos that pass the filters.
///
/// Feed errors on the first page propagate; later ones keep the partial
/// result. Enrichment failures never drop a video, they just leave its
/// transcript or comment fields empty.
pub async fn collect_videos(
    api: &TikTokApi,
    transcripts: Option<&TranscriptClient>,
    q: &VideoQuery,
) -> anyhow::Result<Vec<VideoRecord>> {
    if transcripts.is_some() && q.count > 10 {
        tracing::warn!(
            count = q.count,
            "transcripts are fetched one video at a time; this run will be slow"
        );
    }
    if q.add_comments && q.count > 20 {
        tracing::warn!(
            count = q.count,
            "comments are fetched one video at a time; this run will be slow"
        );
    }
    tracing::info!(
        mode=%q.feed.mode(),
        term=%q.feed.term(),
        count=q.count,
        "tiktok.collect.start"
    );

    let cursor = match &q.feed {
        Feed::Hashtag(tag) => FeedCursor::Challenge {
            id: api.challenge_id(tag).await?,
            cursor: None,
        },
        Feed::User(name) => FeedCursor::User {
            sec_uid: api.user_sec_uid(name).await?,
            cursor: None,
        },
        Feed::Trending => FeedCursor::Trending,
    };
    let fetch_cap = q.count * FETCH_MULTIPLE;
    let mut source = FeedSource {
        api,
        cursor,
        page_size: PAGE_SIZE,
        limit: fetch_cap,
        yielded: 0,
        done: false,
    };

    let pager = Pager::new(
        q.batch_pause,
        fetch_cap.div_ceil(PAGE_SIZE as usize) + 1,
    )
    .with_cancel(q.cancel.clone());
    let stream = pager.stream(&mut source);
    pin_mut!(stream);

    let mut records: Vec<VideoRecord> = Vec::new();
    let mut processed = 0usize;
    let process_cap = q.count * PROCESS_MULTIPLE;

    while let Some(item) = stream.next().await {
        let item: VideoItem = item?;
        processed += 1;
        if processed > process_cap {
            tracing::warn!(
                processed,
                kept = records.len(),
                "tiktok.collect.process_cap_reached"
            );
            break;
        }
        if q.cancel.is_cancelled() {
            break;
        }

        let relevance = match &q.feed {
            Feed::Hashtag(tag) => Some(Relevance::grade(
                tag,
                &clean::extract_hashtags(&item.desc),
                &item.desc,
                q.relevance_threshold,
            )),
            _ => None,
        };

        let mut record = extract::video_to_record(&item, relevance.as_ref());
        if let Some(rejection) = q.filter.rejects(
            record.duration,
            record.stats.views,
            item.create_time,
            &record.description,
            relevance.as_ref(),
        ) {
            tracing::debug!(id=%record.id, %rejection, "tiktok.video.rejected");
            continue;
        }

        if let Some(client) = transcripts {
            // A placeholder identity would just burn transcription quota.
            if record.author_username != "unknown" && record.id != "unknown" {
                record.transcript_text = client
                    .fetch(&record.tiktok_url, &q.transcript_language)
                    .await;
                record.transcript_available = record.transcript_text.is_some();
            }
        }

        if q.add_comments {
            match fetch_comments(api, &record.id, q).await {
                Ok((comments, stats, replies_total)) => {
                    record.comments_count = comments.len();
                    record.comments = comments;
                    record.comments_retrieved = true;
                    record.pagination_used = Some(stats.pagination_used());
                    record.collection_duration_seconds = Some(round2(stats.elapsed.as_secs_f64()));
                    if q.include_replies {
                        record.total_replies_count = Some(replies_total);
                    }
                }
                Err(err) => {
                    tracing::debug!(id=%record.id, error=%err, "tiktok.comments.failed");
                }
            }
        }

        records.push(record);
        if records.len() >= q.count {
            break;
        }
    }

    tracing::info!(
        kept = records.len(),
        processed,
        "tiktok.collect.done"
    );
    Ok(records)
}

/// Comment pages for one video, capped at `limit` fetched comments.
struct CommentSource<'a> {
    api: &'a TikTokApi,
    video_id: &'a str,
    cursor: i64,
    has_more: bool,
    limit: usize,
    yielded: usize,
}

#[async_trait]
impl BatchSource for CommentSource<'_> {
    type Item = CommentItem;

    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<CommentItem>>> {
        if !self.has_more || self.yielded >= self.limit {
            return Ok(None);
        }
        let page = self
            .api
            .comments(self.video_id, COMMENT_BATCH, self.cursor)
            .await?;
        self.cursor = page.cursor;
        self.has_more = page.has_more == 1;

        let mut comments = page.comments.unwrap_or_default();
        if comments.is_empty() {
            return Ok(None);
        }
        comments.truncate(self.limit - self.yielded);
        self.yielded += comments.len();
        Ok(Some(comments))
    }
}

/// Collect up to `q.max_comments` substantive comments for one video.
///
/// Returns the comments, the paging counters (reported on the record), and
/// how many replies were attached across all of them.
async fn fetch_comments(
    api: &TikTokApi,
    video_id: &str,
    q: &VideoQuery,
) -> anyhow::Result<(Vec<CommentRecord>, PagerStats, u64)> {
    // Over-ask; one-character reactions are dropped below.
    let limit = q.max_comments * 2;
    let mut source = CommentSource {
        api,
        video_id,
        cursor: 0,
        has_more: true,
        limit,
        yielded: 0,
    };
    let pager = Pager::new(
        COMMENT_PAUSE,
        limit.div_ceil(COMMENT_BATCH as usize) + 1,
    )
    .with_cancel(q.cancel.clone());
    let (items, stats) = pager
        .collect_n(&mut source, q.max_comments, |c: &CommentItem| {
            c.text.trim().chars().count() >= 2
        })
        .await?;

    let mut replies_total = 0u64;
    let mut comments = Vec::with_capacity(items.len());
    for item in items {
        let mut record = extract::comment_to_record(&item);
        if q.include_replies && record.reply_count > 0 && !q.cancel.is_cancelled() {
            match api
                .comment_replies(&record.id, video_id, REPLY_PAGE, 0)
                .await
            {
                Ok(page) => {
                    record.replies = page
                        .comments
                        .unwrap_or_default()
                        .iter()
                        .map(extract::comment_to_record)
                        .collect();
                    replies_total += record.replies.len() as u64;
                }
                Err(err) => {
                    tracing::debug!(comment=%record.id, error=%err, "tiktok.replies.failed");
                }
            }
        }
        comments.push(record);
    }
    Ok((comments, stats, replies_total))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_maps_to_mode_and_term() {
        let feed = Feed::Hashtag("cucina".into());
        assert_eq!(feed.mode(), SearchMode::Hashtag);
        assert_eq!(feed.term(), "cucina");

        let feed = Feed::User("nonna_rina".into());
        assert_eq!(feed.mode(), SearchMode::User);
        assert_eq!(feed.term(), "nonna_rina");

        assert_eq!(Feed::Trending.mode(), SearchMode::Trending);
        assert_eq!(Feed::Trending.term(), "trending");
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(2.718), 2.72);
        assert_eq!(round2(0.0), 0.0);
    }
}
