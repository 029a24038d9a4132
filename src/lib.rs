//! Extraction pipeline for recently-posted job listings on a marketplace
//! search page: proxy-resilient fetching, fault-tolerant field extraction,
//! relative-date normalization, 24h freshness filtering and merge-based
//! deduplication.

pub mod config;
pub mod dates;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod pipeline;
pub mod records;

pub use config::{RunOptions, Settings};
pub use pipeline::extract_jobs_from_search;
pub use records::JobListing;
