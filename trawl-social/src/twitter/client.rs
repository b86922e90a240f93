//! Thin wrapper around the Twitter/X recent-search API.
//!
//! Handles auth, request parameter shaping, and pagination tokens before
//! delegating to the shared HTTP client. Date windows are validated and
//! clamped upstream in [`crate::window::DateWindow`].
use crate::twitter::types::SearchResponse;
use crate::window::DateWindow;
use anyhow::Result;
use trawl_http::{Auth, HttpClient, RequestOpts};

/// Fields requested for every tweet in a search page.
const TWEET_FIELDS: &str = "id,text,created_at,author_id,conversation_id,public_metrics,lang";
/// Fields requested for the expanded author objects.
const USER_FIELDS: &str = "id,name,username";

/// Build the recent-search query for a hashtag collection run.
///
/// Retweets are excluded so the same text is not collected many times over.
pub fn hashtag_query(hashtag: &str, lang: &str) -> String {
    format!("#{hashtag} lang:{lang} -is:retweet")
}

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(bearer_token: String) -> Self {
        let http = HttpClient::new("https://api.twitter.com").expect("twitter base url");
        Self {
            http,
            bearer: bearer_token,
        }
    }

    /// Fetch one page of `/2/tweets/search/recent`.
    ///
    /// `max_results` is clamped to the API's 10..=100 page bounds. When a
    /// `window` is given its bounds are sent as `start_time`/`end_time`
    /// (the end already clamped safely behind "now"). `next_token` continues
    /// a previous page.
    pub async fn search_recent(
        &self,
        query: &str,
        max_results: u32,
        window: Option<&DateWindow>,
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let max_results = max_results.clamp(10, 100);

        let mut params: Vec<(&str, std::borrow::Cow<'_, str>)> = vec![
            ("query", query.into()),
            ("max_results", max_results.to_string().into()),
            ("tweet.fields", TWEET_FIELDS.into()),
            ("expansions", "author_id".into()),
            ("user.fields", USER_FIELDS.into()),
        ];

        if let Some(window) = window {
            params.push(("start_time", window.start_param().into()));
            params.push(("end_time", window.end_param().into()));
        }
        if let Some(token) = next_token {
            params.push(("next_token", token.to_string().into()));
        }

        let resp: SearchResponse = self
            .http
            .get_json(
                "2/tweets/search/recent",
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(
            result_count=?resp.meta.as_ref().and_then(|m| m.result_count),
            has_next=resp.meta.as_ref().is_some_and(|m| m.next_token.is_some()),
            "twitter.search.page"
        );
        Ok(resp)
    }
}
