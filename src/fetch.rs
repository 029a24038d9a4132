use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProxyEndpoint;

/// Every attempt in the proxy-then-direct sequence failed. Carries the last
/// error encountered, which is what callers surface.
#[derive(Debug, Error)]
#[error("all {attempts} fetch attempts failed, last error: {last}")]
pub struct FetchError {
    pub attempts: usize,
    #[source]
    pub last: anyhow::Error,
}

enum Attempt<'a> {
    Proxy(&'a ProxyEndpoint),
    Direct,
}

impl Attempt<'_> {
    fn label(&self) -> String {
        match self {
            Attempt::Proxy(p) => p.name(),
            Attempt::Direct => "direct".to_string(),
        }
    }
}

/// Fetches a URL trying each usable proxy in order and finally a direct
/// connection. Returns on the first success; only after the direct attempt
/// fails does the whole fetch fail. No backoff between attempts.
pub async fn fetch_with_failover(
    url: &str,
    proxies: &[ProxyEndpoint],
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<String, FetchError> {
    let mut attempts: Vec<Attempt> = proxies
        .iter()
        .filter(|p| p.is_usable())
        .map(Attempt::Proxy)
        .collect();
    attempts.push(Attempt::Direct);

    let total = attempts.len();
    let mut last: Option<anyhow::Error> = None;

    for attempt in &attempts {
        let label = attempt.label();
        debug!(%url, %label, "attempting request");
        match fetch_once(url, attempt, headers, timeout).await {
            Ok(body) => {
                debug!(%label, bytes = body.len(), "received response");
                return Ok(body);
            }
            Err(err) => {
                warn!(%label, error = %err, "request attempt failed");
                last = Some(err);
            }
        }
    }

    Err(FetchError {
        attempts: total,
        last: last.unwrap_or_else(|| anyhow!("no fetch attempts were made")),
    })
}

async fn fetch_once(
    url: &str,
    attempt: &Attempt<'_>,
    headers: &HeaderMap,
    timeout: Duration,
) -> anyhow::Result<String> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .default_headers(headers.clone());

    builder = match attempt {
        Attempt::Proxy(endpoint) => {
            let mut proxy = reqwest::Proxy::all(endpoint.url())?;
            if let Some(auth) = &endpoint.auth {
                proxy = proxy.basic_auth(&auth.username, &auth.password);
            }
            builder.proxy(proxy)
        }
        // keep environment proxies out of the direct attempt
        Attempt::Direct => builder.no_proxy(),
    };

    let client = builder.build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !(status.is_success() || status.is_redirection()) {
        return Err(anyhow!("unexpected status {status}"));
    }
    Ok(response.text().await?)
}
