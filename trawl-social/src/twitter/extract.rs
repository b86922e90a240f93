//! Turn API search pages into flat [`TweetRecord`]s.
//!
//! The search endpoint returns tweets and their authors in separate arrays;
//! this module joins them and stamps the run's filter settings onto each
//! record so a file read later explains how it was collected.
use crate::twitter::types::{SearchResponse, Tweet, User};
use std::collections::HashMap;
use trawl_filter::clean;
use trawl_sink::TweetRecord;

/// Run settings stamped onto every extracted record.
#[derive(Clone, Debug)]
pub struct ExtractCtx {
    /// Search hashtag without the leading `#`.
    pub hashtag: String,
    pub lang: String,
    pub date_filter_applied: bool,
    pub content_filter_applied: bool,
    pub min_text_length: usize,
}

/// Index the expanded author objects by user id.
pub fn user_index(page: &SearchResponse) -> HashMap<&str, &User> {
    page.includes
        .as_ref()
        .and_then(|inc| inc.users.as_deref())
        .unwrap_or_default()
        .iter()
        .map(|u| (u.id.as_str(), u))
        .collect()
}

/// Join one tweet with its author and flatten it into a record.
///
/// Missing author or language data degrades to `"unknown"` rather than
/// dropping the tweet; absent engagement counters read as zero.
pub fn tweet_to_record(
    tweet: &Tweet,
    users: &HashMap<&str, &User>,
    ctx: &ExtractCtx,
) -> TweetRecord {
    let clean_text = clean::clean_tweet_text(&tweet.text);
    let text_length = clean_text.chars().count();
    let original_length = tweet.text.chars().count();

    let author = tweet
        .author_id
        .as_deref()
        .and_then(|id| users.get(id).copied());
    let author_username = author.map(|u| u.username.clone());
    let author_name = author.and_then(|u| u.name.clone());

    let metrics = tweet.public_metrics.clone().unwrap_or_default();

    TweetRecord {
        id: tweet.id.clone(),
        text: tweet.text.clone(),
        clean_text,
        text_length,
        original_length,
        created_at: tweet.created_at.clone(),
        author_id: tweet.author_id.clone().unwrap_or_else(|| "unknown".into()),
        author_username: author_username.unwrap_or_else(|| "unknown".into()),
        author_name: author_name.unwrap_or_else(|| "unknown".into()),
        hashtag: ctx.hashtag.clone(),
        lang: tweet.lang.clone().unwrap_or_else(|| "unknown".into()),
        retweet_count: metrics.retweet_count.unwrap_or(0),
        reply_count: metrics.reply_count.unwrap_or(0),
        like_count: metrics.like_count.unwrap_or(0),
        quote_count: metrics.quote_count.unwrap_or(0),
        has_links: tweet.text.contains("https://t.co/"),
        // Rejected tweets are dropped before saving, so survivors are
        // meaningful by construction.
        meaningful_content: true,
        language_filter: ctx.lang.clone(),
        date_filter_applied: ctx.date_filter_applied,
        content_filter_applied: ctx.content_filter_applied,
        min_text_length_used: ctx.min_text_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::types::PublicMetrics;

    fn ctx() -> ExtractCtx {
        ExtractCtx {
            hashtag: "cucina".into(),
            lang: "it".into(),
            date_filter_applied: false,
            content_filter_applied: true,
            min_text_length: 20,
        }
    }

    #[test]
    fn record_joins_author_and_cleans_text() {
        let tweet = Tweet {
            id: "1801".into(),
            text: "La vera carbonara non ha panna #cucina https://t.co/abc123".into(),
            author_id: Some("99".into()),
            lang: Some("it".into()),
            created_at: Some("2025-06-02T10:15:00.000Z".into()),
            conversation_id: Some("1801".into()),
            public_metrics: Some(PublicMetrics {
                retweet_count: Some(4),
                reply_count: Some(2),
                like_count: Some(31),
                quote_count: Some(0),
            }),
        };
        let user = User {
            id: "99".into(),
            username: "chef_anna".into(),
            name: Some("Anna".into()),
        };
        let users = HashMap::from([("99", &user)]);

        let record = tweet_to_record(&tweet, &users, &ctx());
        assert_eq!(record.clean_text, "La vera carbonara non ha panna #cucina");
        assert_eq!(record.text_length, 38);
        assert!(record.original_length > record.text_length);
        assert_eq!(record.author_username, "chef_anna");
        assert_eq!(record.author_name, "Anna");
        assert_eq!(record.like_count, 31);
        assert!(record.has_links);
        assert_eq!(record.hashtag, "cucina");
        assert_eq!(record.min_text_length_used, 20);
    }

    #[test]
    fn missing_author_degrades_to_unknown() {
        let tweet = Tweet {
            id: "2".into(),
            text: "solo testo".into(),
            author_id: None,
            lang: None,
            created_at: None,
            conversation_id: None,
            public_metrics: None,
        };
        let record = tweet_to_record(&tweet, &HashMap::new(), &ctx());
        assert_eq!(record.author_id, "unknown");
        assert_eq!(record.author_username, "unknown");
        assert_eq!(record.author_name, "unknown");
        assert_eq!(record.lang, "unknown");
        assert_eq!(record.retweet_count, 0);
        assert!(!record.has_links);
    }
}
