//! Text cleanup shared by both collectors.
//!
//! TikTok descriptions and tweet bodies want different treatment: descriptions
//! keep their links but lose hashtag/mention walls, tweets lose the `t.co`
//! redirects the API embeds in the body. Both end up whitespace-collapsed.

use regex::Regex;
use std::sync::OnceLock;

fn re_tco_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https://t\.co/\w+").expect("t.co regex"))
}

fn re_hashtag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").expect("hashtag regex"))
}

fn re_hashtag_wall() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(#\w+\s*){3,}").expect("hashtag wall regex"))
}

fn re_mention_wall() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(@\w+\s*){3,}").expect("mention wall regex"))
}

fn re_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn re_only_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[#@\s\W]*$").expect("noise regex"))
}

/// Strip runs of three or more hashtags or mentions, then collapse whitespace.
///
/// TikTok descriptions routinely end in a wall of tags; dropping the wall
/// keeps the sentence part worth filtering on. Up to two consecutive tags are
/// treated as content and left alone, and so are links.
pub fn clean_description(desc: &str) -> String {
    let cleaned = re_hashtag_wall().replace_all(desc, "");
    let cleaned = re_mention_wall().replace_all(&cleaned, "");
    collapse_whitespace(&cleaned)
}

/// Drop `t.co` redirect links from a tweet body and collapse whitespace.
///
/// Only the shortener form is removed; any other URL the author typed out is
/// kept as content.
pub fn clean_tweet_text(text: &str) -> String {
    let cleaned = re_tco_link().replace_all(text, "");
    collapse_whitespace(&cleaned)
}

/// Hashtags appearing anywhere in `text`, without the leading `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    re_hashtag()
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Whether `text` still says something once the search term is removed.
///
/// The verbatim and lowercased term are stripped first so a caption that is
/// nothing but the query does not count as content. What remains must be at
/// least `min_len` characters and contain something other than tags, mentions
/// and punctuation.
pub fn is_meaningful(text: &str, search_term: &str, min_len: usize) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut rest = text.to_string();
    if !search_term.is_empty() {
        rest = rest.replace(search_term, "");
        rest = rest.replace(&search_term.to_lowercase(), "");
    }
    let rest = rest.trim();
    if rest.chars().count() < min_len {
        return false;
    }
    !re_only_noise().is_match(rest)
}

fn collapse_whitespace(text: &str) -> String {
    re_whitespace().replace_all(text, " ").trim().to_string()
}
