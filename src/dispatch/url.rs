//! Search URL construction and the notification preview.

use crate::engine::QUERY_PLACEHOLDER;

use super::DispatchError;

/// Maximum characters of captured text shown in the success notification.
pub const PREVIEW_CHARS: usize = 50;

/// Substitute the percent-encoded, trimmed `query` for every
/// `{query}` in `template`.
pub fn build_search_url(template: &str, query: &str) -> Result<String, DispatchError> {
    if !template.contains(QUERY_PLACEHOLDER) {
        return Err(DispatchError::MalformedTemplate(template.to_string()));
    }
    let encoded = urlencoding::encode(query.trim());
    Ok(template.replace(QUERY_PLACEHOLDER, &encoded))
}

/// Trimmed text cut to [`PREVIEW_CHARS`] characters, with `…` when cut.
pub fn preview(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
