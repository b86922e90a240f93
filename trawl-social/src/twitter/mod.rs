//! Twitter/X recent-search pipeline.
//!
//! Submodules split the work the way the HTTP side is layered: [`client`]
//! shapes requests, [`types`] models the wire envelope, [`extract`] joins
//! tweets with their authors into flat records, and [`collect`] drives the
//! paged search until enough records pass the content check.
pub mod client;
pub mod collect;
pub mod extract;
pub mod types;

pub use client::TwitterApi;
pub use collect::{TweetQuery, collect_tweets};
