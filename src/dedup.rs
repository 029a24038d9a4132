use std::collections::HashMap;

use tracing::debug;

use crate::records::JobListing;

/// Collapses listings that refer to the same posting, preserving first-seen
/// order. Identity is the link when present, otherwise the
/// title|budget|projectLength triple; fully anonymous records each get a
/// run-unique key and never merge with each other.
pub fn deduplicate_jobs(jobs: Vec<JobListing>) -> Vec<JobListing> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, JobListing> = HashMap::new();
    let mut anon = 0usize;

    for job in jobs {
        let key = if !job.link.is_empty() {
            job.link.clone()
        } else if !(job.title.is_empty() && job.budget.is_empty() && job.project_length.is_empty())
        {
            format!("{}|{}|{}", job.title, job.budget, job.project_length)
        } else {
            anon += 1;
            format!("anon-{anon}")
        };

        match by_key.get_mut(&key) {
            None => {
                order.push(key.clone());
                by_key.insert(key, job);
            }
            Some(existing) => merge_into(existing, job),
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

/// First-seen descriptive fields win; skills are unioned and the most recent
/// timestamp is kept, since later pages can show stale duplicates with a
/// refreshed posting time.
fn merge_into(existing: &mut JobListing, later: JobListing) {
    for skill in later.skills {
        if !existing.skills.contains(&skill) {
            existing.skills.push(skill);
        }
    }

    let adopt_later_date = match (existing.normalized_date, later.normalized_date) {
        (Some(old), Some(new)) => new > old,
        (None, Some(_)) => true,
        _ => false,
    };
    if adopt_later_date {
        existing.normalized_date = later.normalized_date;
        if !later.published_date.is_empty() {
            existing.published_date = later.published_date;
        }
    }

    debug!(title = %existing.title, link = %existing.link, "merged duplicate job");
}
