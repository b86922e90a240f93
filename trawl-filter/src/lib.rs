//! Content filters applied between collection and persistence.
//!
//! [`clean`] normalizes raw platform text, [`relevance`] scores a video
//! against the search term, and [`VideoFilter`] strings the individual checks
//! into one accept/reject decision per video.

pub mod clean;
pub mod relevance;

pub use relevance::Relevance;

use std::fmt;

/// Per-run acceptance rules for collected videos.
///
/// Unset bounds disable the corresponding check. `check_description` is
/// turned off by `--no-filter`.
#[derive(Debug, Clone)]
pub struct VideoFilter {
    pub search_term: String,
    pub min_duration_secs: Option<u32>,
    pub max_duration_secs: Option<u32>,
    pub min_views: Option<u64>,
    /// Unix-seconds floor on the post date (`--created-after`).
    pub created_after: Option<i64>,
    pub min_desc_length: usize,
    pub check_description: bool,
}

/// Why a video was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooShort { duration: u32, min: u32 },
    TooLong { duration: u32, max: u32 },
    TooFewViews { views: u64, min: u64 },
    TooOld { created_at: i64, floor: i64 },
    ShallowDescription,
    NotRelevant { score: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort { duration, min } => write!(f, "duration {duration}s < {min}s"),
            Rejection::TooLong { duration, max } => write!(f, "duration {duration}s > {max}s"),
            Rejection::TooFewViews { views, min } => write!(f, "views {views} < {min}"),
            Rejection::TooOld { created_at, floor } => {
                write!(f, "posted {created_at} < {floor} (unix)")
            }
            Rejection::ShallowDescription => write!(f, "description not meaningful"),
            Rejection::NotRelevant { score } => write!(f, "relevance {score:.3} below threshold"),
        }
    }
}

impl VideoFilter {
    /// Returns the first rule the video violates, or `None` to keep it.
    ///
    /// Numeric floors run before the text checks so cheap rejections skip the
    /// cleanup work. `relevance` is absent outside hashtag mode and the check
    /// is then skipped.
    pub fn rejects(
        &self,
        duration_secs: u32,
        views: u64,
        created_at_secs: i64,
        description: &str,
        relevance: Option<&Relevance>,
    ) -> Option<Rejection> {
        if let Some(min) = self.min_duration_secs {
            if duration_secs < min {
                return Some(Rejection::TooShort {
                    duration: duration_secs,
                    min,
                });
            }
        }
        if let Some(max) = self.max_duration_secs {
            if duration_secs > max {
                return Some(Rejection::TooLong {
                    duration: duration_secs,
                    max,
                });
            }
        }
        if let Some(min) = self.min_views {
            if views < min {
                return Some(Rejection::TooFewViews { views, min });
            }
        }
        if let Some(floor) = self.created_after {
            if created_at_secs < floor {
                return Some(Rejection::TooOld {
                    created_at: created_at_secs,
                    floor,
                });
            }
        }
        if self.check_description {
            let cleaned = clean::clean_description(description);
            if !clean::is_meaningful(&cleaned, &self.search_term, self.min_desc_length) {
                return Some(Rejection::ShallowDescription);
            }
        }
        if let Some(rel) = relevance {
            if !rel.is_relevant {
                return Some(Rejection::NotRelevant { score: rel.score });
            }
        }
        None
    }
}
