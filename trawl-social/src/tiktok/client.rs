//! Client for the unofficial TikTok web API.
//!
//! Every request carries a real browser user-agent and the site referer;
//! the `msToken` session cookie rides along as a query parameter when the
//! caller has one. Without a token the public endpoints still answer, just
//! with tighter limits and occasional empty pages.
use crate::tiktok::types::{ChallengeDetailResponse, CommentListResponse, ItemListResponse, UserDetailResponse};
use anyhow::{Result, bail};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use trawl_http::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use trawl_http::{Auth, HttpClient, RequestOpts};

/// Which browser identity to present upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn user_agent(&self) -> &'static str {
        match self {
            Browser::Chromium => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
            }
            Browser::Firefox => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0"
            }
            Browser::Webkit => {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.4 Safari/605.1.15"
            }
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        })
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!(
                "unknown browser `{other}` (expected chromium, firefox or webkit)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct TikTokApi {
    http: HttpClient,
    ms_token: Option<String>,
    user_agent: HeaderValue,
}

impl TikTokApi {
    pub fn new(ms_token: Option<String>, browser: Browser, proxy: Option<&str>) -> Result<Self> {
        let mut http = HttpClient::new("https://www.tiktok.com")?;
        if let Some(proxy) = proxy {
            http = http.with_proxy(proxy)?;
        }
        if ms_token.is_none() {
            tracing::warn!("no ms_token set; expect stricter rate limits and empty pages");
        }
        Ok(Self {
            http,
            ms_token,
            user_agent: HeaderValue::from_static(browser.user_agent()),
        })
    }

    /// Base request options shared by every endpoint.
    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(REFERER, HeaderValue::from_static("https://www.tiktok.com/"));

        let auth = match &self.ms_token {
            Some(token) => Auth::Query {
                name: "msToken",
                value: Cow::Borrowed(token.as_str()),
            },
            None => Auth::None,
        };

        RequestOpts {
            auth: Some(auth),
            headers: Some(headers),
            query: Some(query),
            ..Default::default()
        }
    }

    /// Resolve a hashtag name to its numeric challenge id.
    pub async fn challenge_id(&self, hashtag: &str) -> Result<String> {
        let detail: ChallengeDetailResponse = self
            .http
            .get_json(
                "api/challenge/detail/",
                self.opts(vec![("challengeName", hashtag.into())]),
            )
            .await?;

        let Some(challenge) = detail.challenge_info.and_then(|info| info.challenge) else {
            bail!("hashtag #{hashtag} not found");
        };
        tracing::debug!(id=%challenge.id, title=?challenge.title, "tiktok.challenge.resolved");
        Ok(challenge.id)
    }

    /// One page of videos for a challenge.
    pub async fn challenge_items(
        &self,
        challenge_id: &str,
        count: u32,
        cursor: Option<&str>,
    ) -> Result<ItemListResponse> {
        self.http
            .get_json(
                "api/challenge/item_list/",
                self.opts(vec![
                    ("challengeID", challenge_id.into()),
                    ("count", count.to_string().into()),
                    ("cursor", cursor.unwrap_or("0").to_string().into()),
                ]),
            )
            .await
            .map_err(Into::into)
    }

    /// Resolve a username to the `secUid` the post-list endpoint requires.
    pub async fn user_sec_uid(&self, username: &str) -> Result<String> {
        let detail: UserDetailResponse = self
            .http
            .get_json(
                "api/user/detail/",
                self.opts(vec![("uniqueId", username.into())]),
            )
            .await?;

        let Some(user) = detail.user_info.and_then(|info| info.user) else {
            bail!("user @{username} not found");
        };
        tracing::debug!(id=%user.id, "tiktok.user.resolved");
        Ok(user.sec_uid)
    }

    /// One page of a user's posts.
    pub async fn user_items(
        &self,
        sec_uid: &str,
        count: u32,
        cursor: Option<&str>,
    ) -> Result<ItemListResponse> {
        self.http
            .get_json(
                "api/post/item_list/",
                self.opts(vec![
                    ("secUid", sec_uid.into()),
                    ("count", count.to_string().into()),
                    ("cursor", cursor.unwrap_or("0").to_string().into()),
                ]),
            )
            .await
            .map_err(Into::into)
    }

    /// One page of the trending feed. The feed has no cursor; each call
    /// returns a fresh slate.
    pub async fn trending_items(&self, count: u32) -> Result<ItemListResponse> {
        self.http
            .get_json(
                "api/recommend/item_list/",
                self.opts(vec![("count", count.to_string().into())]),
            )
            .await
            .map_err(Into::into)
    }

    /// One page of top-level comments for a video.
    pub async fn comments(
        &self,
        video_id: &str,
        count: u32,
        cursor: i64,
    ) -> Result<CommentListResponse> {
        self.http
            .get_json(
                "api/comment/list/",
                self.opts(vec![
                    ("aweme_id", video_id.into()),
                    ("count", count.to_string().into()),
                    ("cursor", cursor.to_string().into()),
                ]),
            )
            .await
            .map_err(Into::into)
    }

    /// One page of replies under a comment.
    pub async fn comment_replies(
        &self,
        comment_id: &str,
        video_id: &str,
        count: u32,
        cursor: i64,
    ) -> Result<CommentListResponse> {
        self.http
            .get_json(
                "api/comment/list/reply/",
                self.opts(vec![
                    ("comment_id", comment_id.into()),
                    ("item_id", video_id.into()),
                    ("count", count.to_string().into()),
                    ("cursor", cursor.to_string().into()),
                ]),
            )
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_parses_aliases() {
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chromium);
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("safari".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn each_browser_has_a_distinct_agent() {
        let agents = [
            Browser::Chromium.user_agent(),
            Browser::Firefox.user_agent(),
            Browser::Webkit.user_agent(),
        ];
        assert!(agents[0].contains("Chrome/"));
        assert!(agents[1].contains("Firefox/"));
        assert!(agents[2].contains("Mac OS X"));
        assert_ne!(agents[0], agents[1]);
        assert_ne!(agents[1], agents[2]);
    }
}
