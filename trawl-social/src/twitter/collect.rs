//! Paginated hashtag collection over the recent-search endpoint.
//!
//! Pages follow `meta.next_token` until the requested count is met, the
//! window is exhausted, or the page cap is hit. Records are extracted and
//! content-filtered as they arrive, so a sparse hashtag keeps paging until
//! enough tweets survive the filter.
use crate::page::{BatchSource, Pager, PagerStats};
use crate::twitter::client::{TwitterApi, hashtag_query};
use crate::twitter::extract::{self, ExtractCtx};
use crate::window::DateWindow;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trawl_filter::clean;
use trawl_http::HttpError;
use trawl_sink::TweetRecord;

/// Hard page cap per run. Ten full pages covers the largest request the
/// CLI accepts with room for filter losses.
const MAX_PAGES: usize = 10;

/// One hashtag collection run's parameters.
#[derive(Clone, Debug)]
pub struct TweetQuery {
    /// Hashtag without the leading `#`.
    pub hashtag: String,
    /// BCP-47 language filter sent with the query.
    pub lang: String,
    /// How many tweets to keep.
    pub count: usize,
    pub window: Option<DateWindow>,
    pub min_text_length: usize,
    /// When false, every extracted tweet is kept regardless of substance.
    pub check_content: bool,
    /// Pause between search pages.
    pub pause: Duration,
    pub cancel: CancellationToken,
}

/// [`BatchSource`] over recent-search pages for one query.
struct RecentSearchSource<'a> {
    api: &'a TwitterApi,
    query: String,
    page_size: u32,
    window: Option<&'a DateWindow>,
    ctx: ExtractCtx,
    next_token: Option<String>,
    started: bool,
}

#[async_trait]
impl BatchSource for RecentSearchSource<'_> {
    type Item = TweetRecord;

    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<TweetRecord>>> {
        if self.started && self.next_token.is_none() {
            return Ok(None);
        }

        let page = self
            .api
            .search_recent(
                &self.query,
                self.page_size,
                self.window,
                self.next_token.as_deref(),
            )
            .await
            .inspect_err(|err| log_api_hint(err))?;
        self.started = true;
        self.next_token = page.meta.as_ref().and_then(|m| m.next_token.clone());

        let users = extract::user_index(&page);
        let records = page
            .data
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|tweet| extract::tweet_to_record(tweet, &users, &self.ctx))
            .collect::<Vec<_>>();
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records))
    }
}

/// Translate common API failures into actionable log lines.
fn log_api_hint(err: &anyhow::Error) {
    let Some(HttpError::Api { status, .. }) = err.downcast_ref::<HttpError>() else {
        return;
    };
    match status.as_u16() {
        429 => tracing::warn!(
            "rate limited by the search API; the free tier resets in ~15 minutes"
        ),
        401 => tracing::warn!("authentication failed; check TWITTER_BEARER_TOKEN"),
        403 => tracing::warn!(
            "access forbidden; the token's access level may not cover recent search"
        ),
        422 => tracing::warn!("the API rejected the query; check hashtag and date window"),
        _ => {}
    }
}

/// Collect up to `q.count` tweets for one hashtag.
///
/// Returns the kept records plus paging counters for the run summary.
pub async fn collect_tweets(
    api: &TwitterApi,
    q: &TweetQuery,
) -> anyhow::Result<(Vec<TweetRecord>, PagerStats)> {
    let query = hashtag_query(&q.hashtag, &q.lang);
    tracing::info!(
        hashtag=%q.hashtag,
        lang=%q.lang,
        count=q.count,
        window=?q.window.as_ref().map(|w| w.to_string()),
        "twitter.collect.start"
    );

    let mut source = RecentSearchSource {
        api,
        query,
        page_size: q.count.clamp(10, 100) as u32,
        window: q.window.as_ref(),
        ctx: ExtractCtx {
            hashtag: q.hashtag.clone(),
            lang: q.lang.clone(),
            date_filter_applied: q.window.is_some(),
            content_filter_applied: q.check_content,
            min_text_length: q.min_text_length,
        },
        next_token: None,
        started: false,
    };

    let pager = Pager::new(q.pause, MAX_PAGES).with_cancel(q.cancel.clone());
    let check = q.check_content;
    let min_len = q.min_text_length;
    let term = q.hashtag.clone();
    let (records, stats) = pager
        .collect_n(&mut source, q.count, |r: &TweetRecord| {
            !check || clean::is_meaningful(&r.clean_text, &term, min_len)
        })
        .await?;

    tracing::info!(
        kept = records.len(),
        fetched = stats.fetched,
        pages = stats.batches,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "twitter.collect.done"
    );
    Ok((records, stats))
}
