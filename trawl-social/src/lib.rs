//! Platform collectors: thin API clients plus the machinery they share.
//!
//! [`twitter`] and [`tiktok`] each pair a request-shaping client with an
//! extractor that turns wire responses into `trawl-sink` records. [`page`]
//! holds the bounded-batch pagination loop both sides drive, and [`window`]
//! the date-window validation for the recent-search API.
pub mod page;
pub mod tiktok;
pub mod twitter;
pub mod window;
