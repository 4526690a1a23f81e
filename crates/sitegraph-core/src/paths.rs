//! Lexical helpers for site paths and URLs

/// Page extension used by the documentation builder.
pub const PAGE_EXTENSION: &str = ".html";

/// Split `value` into the part before `#` and the fragment (without `#`).
pub fn split_fragment(value: &str) -> (&str, Option<&str>) {
    match value.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (value, None),
    }
}

/// Drop everything from the first `#` onwards.
pub fn strip_fragment(value: &str) -> &str {
    split_fragment(value).0
}

/// True for `http://`, `https://` and `file://` locations.
pub fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("file://")
}

pub fn trim_trailing_slash(value: &str) -> &str {
    value.trim_end_matches('/')
}

/// True when `candidate` equals `base` or lies underneath it (`base/...`).
pub fn is_under(candidate: &str, base: &str) -> bool {
    let base = trim_trailing_slash(base);
    let candidate = trim_trailing_slash(candidate);
    candidate == base
        || candidate
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Collapse `.` and `..` segments of a `/`-separated path.
///
/// A leading `/` is preserved; `..` never climbs above the root.
pub fn normalize_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Site page for a document name: `guides/intro` -> `/guides/intro.html`.
pub fn page_for_doc(doc: &str) -> String {
    format!("/{}{}", doc.trim_start_matches('/'), PAGE_EXTENSION)
}

/// Document name for a site page: `/guides/intro.html` -> `guides/intro`.
pub fn doc_for_page(page: &str) -> &str {
    let page = page.trim_start_matches('/');
    page.strip_suffix(PAGE_EXTENSION).unwrap_or(page)
}

/// Resolve an internal link target relative to the page of `source_doc`.
///
/// The fragment is dropped. An empty target refers back to the source page.
pub fn resolve_internal(source_doc: &str, target: &str) -> String {
    let target = strip_fragment(target);
    let source_page = page_for_doc(source_doc);
    if target.is_empty() {
        return source_page;
    }

    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        let dir = source_page
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");
        format!("{dir}/{target}")
    };

    let mut normalized = normalize_segments(&joined);
    if joined.ends_with('/') {
        normalized = format!("{}/index", normalized.trim_end_matches('/'));
    }
    page_for_doc(doc_for_page(&normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_internal_relative() {
        assert_eq!(resolve_internal("guides/intro", "setup.html"), "/guides/setup.html");
        assert_eq!(resolve_internal("guides/intro", "../api/core.html#fn"), "/api/core.html");
        assert_eq!(resolve_internal("index", "guides/intro.html"), "/guides/intro.html");
        assert_eq!(resolve_internal("guides/intro", "#section"), "/guides/intro.html");
        assert_eq!(resolve_internal("index", "guides/"), "/guides/index.html");
    }

    #[test]
    fn test_is_under_requires_separator() {
        assert!(is_under("https://a.org/docs/page.html", "https://a.org/docs"));
        assert!(is_under("https://a.org/docs/", "https://a.org/docs"));
        assert!(!is_under("https://a.org/docs-extra/page.html", "https://a.org/docs"));
    }

    #[test]
    fn test_normalize_segments() {
        assert_eq!(normalize_segments("/a/./b/../c"), "/a/c");
        assert_eq!(normalize_segments("/../a"), "/a");
        assert_eq!(normalize_segments("a/b/.."), "a");
    }
}
