//! Human-readable labels for destination URLs.

/// Extension of map files, stripped from labels.
const MAP_EXTENSION: &str = ".tmj";

/// Turn a destination URL into a display label.
///
/// Strips a trailing `.tmj` (any case), turns runs of `-` and `_` into a
/// single space, collapses whitespace, and trims. Total over all input: an
/// empty URL gives an empty label.
///
/// ```
/// use waypoint_core::label::derive_label;
///
/// assert_eq!(derive_label("Lobby-Area_2.tmj"), "Lobby Area 2");
/// ```
pub fn derive_label(destination_url: &str) -> String {
    strip_map_extension(destination_url)
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_map_extension(url: &str) -> &str {
    let Some(stem_len) = url.len().checked_sub(MAP_EXTENSION.len()) else {
        return url;
    };
    match (url.get(..stem_len), url.get(stem_len..)) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(MAP_EXTENSION) => stem,
        _ => url,
    }
}
