use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::dates::normalize_relative_date;
use crate::records::JobListing;

const BASE_ORIGIN: &str = "https://www.upwork.com";

/// The marketplace reshuffles its markup occasionally, so every lookup here
/// is a chain: a structured attribute-based selector first, then a generic
/// structural fallback. Fields resolve independently; one field coming up
/// empty never aborts the rest of the record.
struct FieldSelectors {
    modern_card: Selector,
    legacy_card: Selector,
    title_link: Selector,
    h4: Selector,
    job_href: Selector,
    bio: Selector,
    p: Selector,
    job_type: Selector,
    strong: Selector,
    budget: Selector,
    length: Selector,
    span: Selector,
    token: Selector,
    tag_skill: Selector,
    pub_date: Selector,
    time: Selector,
}

impl FieldSelectors {
    fn new() -> Self {
        Self {
            modern_card: Selector::parse(r#"article[data-test="job-tile"]"#).unwrap(),
            legacy_card: Selector::parse(r#".up-card-section[data-test="job-tile"]"#).unwrap(),
            title_link: Selector::parse(r#"a[data-test="job-title-link"]"#).unwrap(),
            h4: Selector::parse("h4").unwrap(),
            job_href: Selector::parse(r#"a[href*="/job/"]"#).unwrap(),
            bio: Selector::parse(r#"[data-test="job-description-text"]"#).unwrap(),
            p: Selector::parse("p").unwrap(),
            job_type: Selector::parse(r#"[data-test="job-type"]"#).unwrap(),
            strong: Selector::parse("strong").unwrap(),
            budget: Selector::parse(r#"[data-test="job-budget"]"#).unwrap(),
            length: Selector::parse(r#"[data-test="job-length"]"#).unwrap(),
            span: Selector::parse("span").unwrap(),
            token: Selector::parse(r#"[data-test="token"]"#).unwrap(),
            tag_skill: Selector::parse("a.o-tag-skill").unwrap(),
            pub_date: Selector::parse(r#"span[data-test="job-pub-date"]"#).unwrap(),
            time: Selector::parse("time").unwrap(),
        }
    }
}

/// Parses one search-results page into listing records. Zero detected job
/// cards is a markup-change signal, logged as a warning, but yields an empty
/// result rather than an error.
pub fn parse_jobs_from_html(
    html: &str,
    search_url: &str,
    reference: DateTime<Utc>,
) -> Vec<JobListing> {
    let doc = Html::parse_document(html);
    let sels = FieldSelectors::new();

    let cards: Vec<ElementRef> = doc
        .select(&sels.modern_card)
        .chain(doc.select(&sels.legacy_card))
        .collect();

    if cards.is_empty() {
        warn!("no job cards detected in HTML; markup may have changed");
    }

    let jobs: Vec<JobListing> = cards
        .iter()
        .map(|card| parse_card(*card, &sels, search_url, reference))
        .collect();

    debug!(count = jobs.len(), "parsed jobs from HTML");
    jobs
}

fn parse_card(
    card: ElementRef,
    sels: &FieldSelectors,
    search_url: &str,
    reference: DateTime<Utc>,
) -> JobListing {
    let title = select_text(card, &sels.title_link)
        .or_else(|| select_text(card, &sels.h4))
        .unwrap_or_default();

    let link = select_attr(card, &sels.title_link, "href")
        .or_else(|| select_attr(card, &sels.job_href, "href"))
        .map(|href| resolve_link(&href))
        .unwrap_or_default();

    let short_bio = select_text(card, &sels.bio)
        .or_else(|| select_text(card, &sels.p))
        .unwrap_or_default();

    let payment_type = select_text(card, &sels.job_type)
        .or_else(|| text_of_matching(card, &sels.strong, &["Hourly", "Fixed"]))
        .unwrap_or_default();

    let budget = select_text(card, &sels.budget)
        .or_else(|| labelled_sibling_text(card, &sels.span, "Budget"))
        .unwrap_or_default();

    let project_length = select_text(card, &sels.length)
        .or_else(|| labelled_sibling_text(card, &sels.span, "Duration"))
        .unwrap_or_default();

    let mut skills: Vec<String> = card
        .select(&sels.token)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if skills.is_empty() {
        skills = card
            .select(&sels.tag_skill)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
    }

    let published_date = select_text(card, &sels.pub_date)
        .or_else(|| text_of_matching(card, &sels.span, &["Posted"]))
        .or_else(|| select_text(card, &sels.time))
        .unwrap_or_default();

    let normalized_date = normalize_relative_date(&published_date, reference);

    JobListing {
        title,
        link,
        payment_type,
        budget,
        project_length,
        short_bio,
        skills,
        published_date,
        normalized_date,
        search_url: search_url.to_string(),
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn select_text(scope: ElementRef, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn select_attr(scope: ElementRef, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Text of the first element matching `sel` whose own text contains any of
/// the needles. Stands in for cheerio-style `:contains(...)` selectors.
fn text_of_matching(scope: ElementRef, sel: &Selector, needles: &[&str]) -> Option<String> {
    scope
        .select(sel)
        .find(|el| {
            let text = el.text().collect::<String>();
            needles.iter().any(|n| text.contains(n))
        })
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Value cell of a `<span>label</span><span>value</span>` pair: finds the
/// span containing `label`, then takes the immediately following span.
fn labelled_sibling_text(scope: ElementRef, span: &Selector, label: &str) -> Option<String> {
    let label_el = scope
        .select(span)
        .find(|el| el.text().collect::<String>().contains(label))?;
    label_el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|el| el.value().name() == "span")
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Resolves a relative href against the marketplace origin. Links that fail
/// to resolve are kept as-is rather than discarded.
pub(crate) fn resolve_link(href: &str) -> String {
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return href.to_string();
    }
    match Url::parse(BASE_ORIGIN).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
