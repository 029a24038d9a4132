use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rand::{Rng, rng};
use tokio::time::sleep;
use tracing::{debug, error, info};
use url::Url;

use crate::config::RunOptions;
use crate::dates::is_within_last_24_hours;
use crate::dedup::deduplicate_jobs;
use crate::extract::parse_jobs_from_html;
use crate::fetch::fetch_with_failover;
use crate::headers::build_headers;
use crate::records::JobListing;

/// Drives pages 1..=maxPages strictly in sequence: one page is fetched,
/// parsed and filtered before the next fetch begins, with a randomized delay
/// between consecutive pages. A page whose fetch fails is logged and skipped;
/// it never aborts the run. Deduplication runs once, over the whole
/// accumulated set.
pub async fn extract_jobs_from_search(
    search_url: &str,
    options: &RunOptions,
) -> Result<Vec<JobListing>> {
    let headers = build_headers(&options.cookies)?;
    let timeout = Duration::from_millis(options.timeout_ms);
    let mut all_jobs: Vec<JobListing> = Vec::new();

    for page in 1..=options.max_pages {
        let url_to_fetch = page_url(search_url, page);
        info!(page, max_pages = options.max_pages, url = %url_to_fetch, "fetching page");

        let html = match fetch_with_failover(&url_to_fetch, &options.proxies, &headers, timeout)
            .await
        {
            Ok(html) => html,
            Err(err) => {
                error!(page, error = %err, "failed to fetch page, skipping");
                continue;
            }
        };

        let now = Utc::now();
        let page_jobs = parse_jobs_from_html(&html, search_url, now);
        let total = page_jobs.len();

        let fresh: Vec<JobListing> = page_jobs
            .into_iter()
            .filter(|job| match job.normalized_date {
                Some(date) if is_within_last_24_hours(date, now) => true,
                Some(date) => {
                    debug!(
                        title = %job.title,
                        published = %job.published_date,
                        normalized = %date,
                        "filtered stale job"
                    );
                    false
                }
                None => false,
            })
            .collect();

        info!(page, total, fresh = fresh.len(), "jobs found on page, fresh within 24h");
        all_jobs.extend(fresh);

        if page < options.max_pages {
            let hi = options.max_delay_ms.max(options.min_delay_ms);
            let delay = rng().random_range(options.min_delay_ms..=hi);
            debug!(delay_ms = delay, "sleeping before next page");
            sleep(Duration::from_millis(delay)).await;
        }
    }

    let unique = deduplicate_jobs(all_jobs);
    info!(count = unique.len(), "de-duplicated final job set");
    Ok(unique)
}

/// Builds the URL for one results page by setting the `page` query parameter,
/// replacing any existing one. Search URLs that don't parse as structured
/// URLs get the parameter appended crudely.
pub fn page_url(search_url: &str, page: u32) -> String {
    match Url::parse(search_url) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "page")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            {
                let mut pairs = url.query_pairs_mut();
                pairs.clear();
                pairs.extend_pairs(kept.iter().map(|(k, v)| (&**k, &**v)));
                pairs.append_pair("page", &page.to_string());
            }
            url.to_string()
        }
        Err(_) => {
            let join = if search_url.contains('?') { '&' } else { '?' };
            format!("{search_url}{join}page={page}")
        }
    }
}
