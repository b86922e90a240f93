//! Optional transcript enrichment through a hosted transcription API.
//!
//! Transcripts are strictly best-effort: any failure logs a warning and the
//! record ships with `transcript_available: false`. The service has changed
//! its response shape more than once, so extraction probes several keys.
use serde_json::Value;
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use trawl_http::header::{HeaderName, HeaderValue};
use trawl_http::{Auth, HttpClient, HttpError, RequestOpts};

const RAPIDAPI_HOST: &str = "tiktok-video-transcript.p.rapidapi.com";

/// Env vars probed for the API key, in order.
const KEY_VARS: [&str; 2] = ["RAPIDAPI_KEY", "TIKTOK_TRANSCRIPT_API_KEY"];

/// Map our language flags to the service's locale codes.
fn normalize_language(language: &str) -> &str {
    match language {
        "en" => "eng-US",
        other => other,
    }
}

/// Pull the transcript string out of whichever shape the service returned.
///
/// Seen in the wild: a bare string body, `{"transcript": ...}`,
/// `{"text": ...}`, `{"transcription": ...}`, and the same nested under
/// `result` or `data`.
fn extract_transcript_text(body: &Value) -> Option<String> {
    if let Some(text) = body.as_str() {
        return non_empty(text);
    }
    for key in ["transcript", "text", "transcription"] {
        if let Some(found) = body.get(key).and_then(Value::as_str).and_then(non_empty) {
            return Some(found);
        }
    }
    for pointer in ["/result/transcript", "/data/transcript"] {
        if let Some(found) = body.pointer(pointer).and_then(Value::as_str).and_then(non_empty) {
            return Some(found);
        }
    }
    None
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Clone)]
pub struct TranscriptClient {
    http: HttpClient,
    api_key: String,
}

impl TranscriptClient {
    pub fn new(api_key: String) -> Self {
        let http = HttpClient::new(&format!("https://{RAPIDAPI_HOST}"))
            .expect("transcript base url")
            .with_timeout(Duration::from_secs(30));
        Self { http, api_key }
    }

    /// Build a client from the environment, `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        KEY_VARS
            .iter()
            .find_map(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    /// Fetch a transcript for one video, `None` on any failure.
    pub async fn fetch(&self, video_url: &str, language: &str) -> Option<String> {
        let key = match HeaderValue::from_str(&self.api_key) {
            Ok(key) => key,
            Err(_) => {
                tracing::warn!("transcript API key is not a valid header value");
                return None;
            }
        };
        let mut headers = trawl_http::header::HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-rapidapi-host"),
            HeaderValue::from_static(RAPIDAPI_HOST),
        );

        let result: Result<Value, HttpError> = self
            .http
            .get_json(
                "transcribe",
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static("x-rapidapi-key"),
                        value: key,
                    }),
                    headers: Some(headers),
                    query: Some(vec![
                        ("url", Cow::Borrowed(video_url)),
                        ("language", normalize_language(language).into()),
                        ("timestamps", "false".into()),
                    ]),
                    ..Default::default()
                },
            )
            .await;

        match result {
            Ok(body) => {
                let text = extract_transcript_text(&body);
                if text.is_none() {
                    tracing::debug!(video_url, "tiktok.transcript.empty");
                }
                text
            }
            Err(HttpError::Api { status, .. }) if status.as_u16() == 429 => {
                tracing::warn!("transcript API rate limited; continuing without transcripts");
                None
            }
            Err(HttpError::Api { status, .. }) if status.as_u16() == 402 => {
                tracing::warn!("transcript API quota exhausted; continuing without transcripts");
                None
            }
            Err(err) => {
                tracing::warn!(error=%err, video_url, "tiktok.transcript.failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn english_maps_to_the_service_locale() {
        assert_eq!(normalize_language("en"), "eng-US");
        assert_eq!(normalize_language("it"), "it");
        assert_eq!(normalize_language("eng-US"), "eng-US");
    }

    #[test]
    fn transcript_found_under_known_keys() {
        let cases = [
            json!("parliamo di pasta"),
            json!({"transcript": "parliamo di pasta"}),
            json!({"text": "parliamo di pasta"}),
            json!({"transcription": "parliamo di pasta"}),
            json!({"result": {"transcript": "parliamo di pasta"}}),
            json!({"data": {"transcript": "parliamo di pasta"}}),
        ];
        for body in cases {
            assert_eq!(
                extract_transcript_text(&body).as_deref(),
                Some("parliamo di pasta"),
                "body: {body}"
            );
        }
    }

    #[test]
    fn blank_or_alien_bodies_yield_none() {
        assert!(extract_transcript_text(&json!({"transcript": "   "})).is_none());
        assert!(extract_transcript_text(&json!({"status": "processing"})).is_none());
        assert!(extract_transcript_text(&json!(42)).is_none());
        assert!(extract_transcript_text(&json!(null)).is_none());
    }

    #[test]
    fn transcript_text_is_trimmed() {
        let body = json!({"text": "  ciao a tutti \n"});
        assert_eq!(extract_transcript_text(&body).as_deref(), Some("ciao a tutti"));
    }
}
