//! Built-in search engine presets.
//!
//! Offered by the `engines presets` / `engines add-preset` commands as
//! starting points; the user still picks the hotkey.

/// Returns the URL template for a named preset (case-insensitive), or
/// `None` if the name is not a recognized preset.
pub fn preset_url(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, url)| *url)
}

/// Canonical display name for a preset, matched case-insensitively.
pub fn preset_name(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(preset, _)| *preset)
}

/// All presets as `(name, url_template)` pairs, in display order.
pub const PRESETS: &[(&str, &str)] = &[
    ("Google", "https://www.google.com/search?q={query}"),
    ("YouTube", "https://www.youtube.com/results?search_query={query}"),
    ("GitHub", "https://github.com/search?q={query}"),
    ("Stack Overflow", "https://stackoverflow.com/search?q={query}"),
    (
        "Wikipedia",
        "https://en.wikipedia.org/wiki/Special:Search?search={query}",
    ),
    ("Reddit", "https://www.reddit.com/search/?q={query}"),
];
