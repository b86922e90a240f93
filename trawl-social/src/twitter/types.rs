use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub data: Option<Vec<Tweet>>,
    pub includes: Option<Includes>,
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default)]
    pub result_count: Option<u32>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Includes {
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,

    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PublicMetrics {
    pub retweet_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub like_count: Option<u64>,
    pub quote_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "data": [
            {
                "id": "1801",
                "text": "La vera carbonara non ha panna #cucina https://t.co/abc123",
                "author_id": "99",
                "lang": "it",
                "created_at": "2025-06-02T10:15:00.000Z",
                "conversation_id": "1801",
                "public_metrics": {
                    "retweet_count": 4,
                    "reply_count": 2,
                    "like_count": 31,
                    "quote_count": 0,
                    "impression_count": 900
                }
            }
        ],
        "includes": {
            "users": [{"id": "99", "username": "chef_anna", "name": "Anna"}]
        },
        "meta": {"result_count": 1, "next_token": "b26v89c19zqg8o3f"}
    }"#;

    #[test]
    fn search_page_deserializes() {
        let page: SearchResponse = serde_json::from_str(PAGE).unwrap();
        let tweets = page.data.unwrap();
        assert_eq!(tweets.len(), 1);
        assert_eq!(
            tweets[0].public_metrics.as_ref().unwrap().like_count,
            Some(31)
        );
        assert_eq!(
            page.meta.unwrap().next_token.as_deref(),
            Some("b26v89c19zqg8o3f")
        );
        assert_eq!(page.includes.unwrap().users.unwrap()[0].username, "chef_anna");
    }

    #[test]
    fn sparse_tweets_deserialize_with_defaults() {
        let page: SearchResponse =
            serde_json::from_str(r#"{"data": [{"id": "1", "text": "ciao"}], "meta": {}}"#).unwrap();
        let tweet = &page.data.unwrap()[0];
        assert!(tweet.author_id.is_none());
        assert!(tweet.public_metrics.is_none());
        assert!(page.meta.unwrap().next_token.is_none());
    }
}
