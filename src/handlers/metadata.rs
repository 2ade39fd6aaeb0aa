use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    Json,
};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::error::{AppError, ItemError};
use crate::models::{
    MetadataRequest, MetadataResult, PageMetadata, RequestedUrl, INVALID_INPUT_MESSAGE,
    NO_DESCRIPTION, NO_IMAGE, NO_TITLE,
};
use crate::state::AppState;

// Literal, case-sensitive patterns with a fixed attribute order. Markup that
// deviates (single quotes, reordered attributes, upper-case tags) is not
// matched and falls back to the placeholder.
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>([^<]*)</title>").unwrap());
static DESCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta name="description" content="([^"]*)""#).unwrap());
static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta property="og:image" content="([^"]*)""#).unwrap());

// ── Extraction ─────────────────────────────────────────────────────────────

/// Scrape title, description and og:image from `html`, taking the first
/// match of each and substituting the placeholder when there is none.
pub fn extract_metadata(html: &str, url: &str) -> PageMetadata {
    PageMetadata {
        url: url.to_string(),
        title: first_capture(&TITLE_RE, html).unwrap_or(NO_TITLE).to_string(),
        description: first_capture(&DESCRIPTION_RE, html)
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        image: first_capture(&IMAGE_RE, html).unwrap_or(NO_IMAGE).to_string(),
    }
}

fn first_capture<'h>(re: &Regex, haystack: &'h str) -> Option<&'h str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ── Fetching ───────────────────────────────────────────────────────────────

/// GET `url` once and return the body as text. Transport errors and non-2xx
/// statuses are both errors.
pub async fn fetch_page(client: &ReqwestClient, url: Url) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}

async fn lookup(client: &ReqwestClient, entry: &RequestedUrl) -> Result<PageMetadata, ItemError> {
    let raw = entry.as_text().ok_or(ItemError::InvalidUrl)?;
    let url = Url::parse(raw).map_err(|_| ItemError::InvalidUrl)?;

    let html = fetch_page(client, url).await.map_err(|e| {
        tracing::warn!(error = ?e, url = %raw, "Failed to fetch page for metadata");
        ItemError::from(e)
    })?;

    Ok(extract_metadata(&html, raw))
}

/// Resolve a whole batch concurrently. The output has one entry per input
/// entry, in input order, whatever order the fetches finish in.
pub async fn describe_all(client: &ReqwestClient, urls: &[RequestedUrl]) -> Vec<MetadataResult> {
    join_all(urls.iter().map(|entry| async move {
        match lookup(client, entry).await {
            Ok(page) => MetadataResult::Success(page),
            Err(e) => MetadataResult::failure(entry.to_value(), &e),
        }
    }))
    .await
}

// ── Request extraction ─────────────────────────────────────────────────────

#[async_trait]
impl<S> FromRequest<S> for MetadataRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Could not read metadata request body");
            AppError::Validation(INVALID_INPUT_MESSAGE.into())
        })?;
        MetadataRequest::from_slice(&body)
    }
}

// ── Handler ────────────────────────────────────────────────────────────────

/// POST /fetch-metadata
///
/// Body `{ "urls": [...] }`. Responds with one result per URL, in order:
/// either the scraped metadata or a per-item error. Only a malformed body
/// fails the whole request.
pub async fn fetch_metadata(
    State(state): State<AppState>,
    request: MetadataRequest,
) -> Json<Vec<MetadataResult>> {
    tracing::info!(count = request.urls.len(), "Fetching metadata batch");

    let results = describe_all(&state.http_client, &request.urls).await;

    for result in &results {
        if let MetadataResult::Failure(failure) = result {
            tracing::debug!(url = %failure.url, error = %failure.error, "Metadata lookup failed");
        }
    }
    let failed = results.iter().filter(|r| !r.is_success()).count();
    tracing::debug!(count = results.len(), failed, "Metadata batch complete");

    Json(results)
}

// ── Unit tests ─────────────────────────────────────────────────────────────
