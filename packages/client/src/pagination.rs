//! Transparent offset pagination over OGC Features `items` responses.
//!
//! The first page decides everything. Pagination only starts when the
//! first response is a `FeatureCollection` whose `numberMatched` is a
//! number and which holds fewer features than the effective limit:
//!
//! ```text
//! effective_limit = min(numberMatched, requested limit or DEFAULT_SAFETY_LIMIT)
//! ```
//!
//! Each further page is requested with the original parameters plus
//! `startIndex = <features so far>` and `limit = min(remaining, page size)`,
//! where the page size is the requested limit, or the first page's
//! `numberReturned` if none was requested. An empty page ends pagination
//! early: `numberMatched` is an estimate and may overshoot.
//!
//! The merged response is the first page's envelope with `features`
//! replaced by every accumulated feature and `numberReturned` set to their
//! count. `numberMatched`, `timeStamp`, `links`, `crs` and anything else
//! stay exactly as the first page reported them, even if later pages
//! report something different.

use serde_json::{Map, Value};

use crate::ClientError;
use crate::query::{LIMIT_PARAM, QueryValue, START_INDEX_PARAM};
use crate::request::RequestExecutor;
use crate::transport::HttpRequest;

/// Upper bound on features fetched when the caller sets no limit. Matches
/// the largest page the API serves.
pub const DEFAULT_SAFETY_LIMIT: u64 = 50_000;

/// What to fetch after the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// Total features to accumulate.
    pub effective_limit: u64,
    /// Upper bound on each further page's `limit`.
    pub page_size: u64,
}

/// Decides from the first page whether more pages are needed.
///
/// Returns `None` when the response must be returned as-is.
#[must_use]
pub fn plan(first: &Value, requested_limit: Option<u64>) -> Option<PagePlan> {
    let envelope = first.as_object()?;

    if envelope.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return None;
    }

    let number_matched = envelope.get("numberMatched").and_then(as_count)?;
    let returned_features = features(envelope).map_or(0, Vec::len) as u64;
    let number_returned = envelope
        .get("numberReturned")
        .and_then(as_count)
        .unwrap_or(returned_features);

    if returned_features == 0 {
        return None;
    }

    let effective_limit =
        number_matched.min(requested_limit.unwrap_or(DEFAULT_SAFETY_LIMIT));
    if number_returned >= effective_limit {
        return None;
    }

    let page_size = requested_limit.unwrap_or(number_returned);
    if page_size == 0 {
        return None;
    }

    Some(PagePlan {
        effective_limit,
        page_size,
    })
}

/// Fetches every remaining page for `request` and merges them into
/// `first`.
///
/// # Errors
///
/// Returns the first error any page raises. A non-2xx page or a page
/// whose body is not JSON becomes [`ClientError::Api`] with the server's
/// status and payload.
pub fn paginate(
    executor: &RequestExecutor,
    request: &HttpRequest,
    first: Value,
) -> Result<Value, ClientError> {
    let requested_limit = request.params.get(LIMIT_PARAM).and_then(QueryValue::as_u64);

    let Some(plan) = plan(&first, requested_limit) else {
        return Ok(first);
    };
    let mut envelope = match first {
        Value::Object(envelope) => envelope,
        other => return Ok(other),
    };

    let mut accumulated: Vec<Value> = match envelope.remove("features") {
        Some(Value::Array(features)) => features,
        _ => Vec::new(),
    };
    accumulated.truncate(usize::try_from(plan.effective_limit).unwrap_or(usize::MAX));

    let mut page_number = 1;

    while (accumulated.len() as u64) < plan.effective_limit {
        page_number += 1;
        let start_index = accumulated.len() as u64;
        let remaining = plan.effective_limit - start_index;
        let limit = remaining.min(plan.page_size);

        log::debug!("Fetching page {page_number}: startIndex={start_index}, limit={limit}");

        let mut params = request.params.clone();
        params.insert(START_INDEX_PARAM.to_owned(), QueryValue::from(start_index));
        params.insert(LIMIT_PARAM.to_owned(), QueryValue::from(limit));

        let page = fetch_page(executor, &request.with_params(params))?;

        let page_features = match page {
            Value::Object(mut page) => match page.remove("features") {
                Some(Value::Array(features)) => features,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        if page_features.is_empty() {
            log::debug!("Page {page_number} was empty, stopping pagination");
            break;
        }

        let take = usize::try_from(remaining).unwrap_or(usize::MAX);
        accumulated.extend(page_features.into_iter().take(take));
    }

    log::debug!(
        "Pagination complete: {} features in {page_number} pages (limit {})",
        accumulated.len(),
        plan.effective_limit
    );

    envelope.insert("numberReturned".to_owned(), Value::from(accumulated.len()));
    envelope.insert("features".to_owned(), Value::Array(accumulated));

    Ok(Value::Object(envelope))
}

/// Requests one page; every non-success outcome is an API error.
fn fetch_page(executor: &RequestExecutor, request: &HttpRequest) -> Result<Value, ClientError> {
    let response = executor.send(request)?;

    if !response.is_success() {
        let message = format!("Pagination request failed with status {}", response.status);
        return Err(ClientError::from_response(&response, message));
    }

    response.json().map_err(|e| {
        let message = format!(
            "Pagination request failed with status {}: invalid JSON ({e})",
            response.status
        );
        ClientError::from_response(&response, message)
    })
}

fn features(envelope: &Map<String, Value>) -> Option<&Vec<Value>> {
    envelope.get("features").and_then(Value::as_array)
}

/// Reads a non-negative count; `"unknown"` and other non-numbers are
/// `None`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
    })
}
