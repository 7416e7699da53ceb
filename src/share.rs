//! Shareable links to a displayed analysis.
//!
//! A link carries only the result id (`?repo_id=<id>`). Opening it shows the
//! same result with no cluster filter applied.

use reqwest::Url;
use thiserror::Error;

/// Query parameter holding the result id.
pub const SHARE_PARAM: &str = "repo_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid application URL '{0}'")]
pub struct InvalidAppUrl(pub String);

/// Build the link that reopens result `id` under `app_url`.
pub fn share_link(app_url: &str, id: &str) -> Result<String, InvalidAppUrl> {
    let mut url = Url::parse(app_url).map_err(|_| InvalidAppUrl(app_url.to_string()))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SHARE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SHARE_PARAM, id);

    Ok(url.to_string())
}

/// Extract the result id from a shared link, or accept a bare id.
pub fn parse_shared(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.contains("://") {
        let url = Url::parse(input).ok()?;
        return url
            .query_pairs()
            .find(|(key, _)| key == SHARE_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty());
    }

    if input.chars().any(char::is_whitespace) {
        return None;
    }
    Some(input.to_string())
}
