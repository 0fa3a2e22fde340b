// src/ingest/normalize.rs

/// Canonical form of an idea link, used as its dedup key.
///
/// Strips the trailing `/` and lower-cases the whole string. Repeated
/// trailing slashes are all removed so a second pass is a no-op. Paths that
/// differ only by case collide; that is a known limitation. Redirects, query
/// strings and schemes are left alone.
///
/// Input without a `scheme://` prefix is returned unchanged.
pub fn normalize_link(link: &str) -> String {
    if !has_scheme(link) {
        return link.to_string();
    }
    link.trim_end_matches('/').to_lowercase()
}

fn has_scheme(link: &str) -> bool {
    match link.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
