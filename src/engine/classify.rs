//! URL classification
//!
//! Pure functions that decide whether a link should be handled in place.

use regex::Regex;
use url::Url;

/// Resolve `url` against `base`, the way `anchor.href` is resolved by a browser
pub fn resolve(url: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(url.trim()).ok().map(String::from)
}

/// True if `url` points at another scheme, host or port than `current`.
///
/// Relative URLs resolve against `current` and are never external. Default
/// ports (80 for http, 443 for https) compare equal to no port at all.
pub fn is_external(url: &str, current: &str) -> bool {
    let Ok(current) = Url::parse(current) else {
        return false;
    };
    let Ok(target) = current.join(url.trim()) else {
        return false;
    };

    target.scheme() != current.scheme()
        || target.host_str() != current.host_str()
        || target.port_or_known_default() != current.port_or_known_default()
}

/// Drop the fragment (everything from the first `#`)
pub fn strip_hash(href: &str) -> &str {
    match href.find('#') {
        Some(idx) => &href[..idx],
        None => href,
    }
}

/// True if `href` carries a fragment and otherwise equals `current`
pub fn is_in_page_hash(href: &str, current: &str) -> bool {
    href.contains('#') && strip_hash(href) == strip_hash(current)
}

/// Fragment id of `href`, without the `#`; empty fragments count as none
pub fn fragment_id(href: &str) -> Option<&str> {
    href.split_once('#')
        .map(|(_, hash)| hash)
        .filter(|hash| !hash.is_empty())
}

/// Whether a link to `url` should be loaded in place.
///
/// `excluded` is the result of matching the exclusion selector against the
/// anchor; `has_target` is true when the anchor names a browsing context.
pub fn is_navigable(
    url: &str,
    current: &str,
    excluded: bool,
    has_target: bool,
    pattern: Option<&Regex>,
) -> bool {
    !is_external(url, current)
        && !is_in_page_hash(url, current)
        && !excluded
        && !has_target
        && pattern.is_none_or(|re| re.is_match(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = "http://site.test/docs/index.html";

    #[test]
    fn test_is_external() {
        for url in [
            "http://www.google.com",
            "//www.google.com",
            "//google.com",
            "//google.com#hash",
            "https://site.test/docs/index.html",
            "http://site.test:8080/",
            "mailto:someone@site.test",
        ] {
            assert!(is_external(url, CURRENT), "external: {url}");
        }

        for url in [
            "index.html",
            "/index.html",
            "/index.html#hash",
            "#hash",
            "http://site.test:80/about",
            "HTTP://SITE.TEST/about",
        ] {
            assert!(!is_external(url, CURRENT), "internal: {url}");
        }
    }

    #[test]
    fn test_default_https_port() {
        assert!(!is_external("https://site.test:443/a", "https://site.test/"));
        assert!(is_external("https://site.test:8443/a", "https://site.test/"));
    }

    #[test]
    fn test_strip_hash() {
        assert_eq!(strip_hash("/index.html#hash"), "/index.html");
        assert_eq!(strip_hash("/index.html"), "/index.html");
        assert_eq!(strip_hash("/a#b#c"), "/a");
    }

    #[test]
    fn test_is_in_page_hash() {
        assert!(is_in_page_hash("http://site.test/docs/index.html#foo", CURRENT));
        assert!(!is_in_page_hash(CURRENT, CURRENT));
        assert!(!is_in_page_hash("http://site.test/other/page.html#foo", CURRENT));

        // Compared against another page, or after following a hash link
        assert!(is_in_page_hash(
            "http://site.test/other/page.html#foo",
            "http://site.test/other/page.html"
        ));
        assert!(is_in_page_hash(
            "http://site.test/other/page.html#foo",
            "http://site.test/other/page.html#bar"
        ));
    }

    #[test]
    fn test_fragment_id() {
        assert_eq!(fragment_id("http://site.test/a#team"), Some("team"));
        assert_eq!(fragment_id("http://site.test/a#"), None);
        assert_eq!(fragment_id("http://site.test/a"), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve("../about.html", CURRENT).as_deref(),
            Some("http://site.test/about.html")
        );
        assert_eq!(
            resolve("//cdn.test/lib.js", "https://site.test/").as_deref(),
            Some("https://cdn.test/lib.js")
        );
        assert_eq!(resolve("/x", "not a url"), None);
    }

    #[test]
    fn test_is_navigable() {
        let current = "http://site.test/";
        assert!(is_navigable("http://site.test/index.html", current, false, false, None));
        assert!(is_navigable("http://site.test/index.html#foo", current, false, false, None));

        assert!(!is_navigable("http://site.test/index.html", current, true, false, None));
        assert!(!is_navigable("http://site.test/index.html", current, false, true, None));
        assert!(!is_navigable("http://google.com/", current, false, false, None));
        assert!(!is_navigable("http://site.test/#hash", current, false, false, None));

        let pattern = Regex::new(r"/blog/").unwrap();
        assert!(is_navigable("http://site.test/blog/post", current, false, false, Some(&pattern)));
        assert!(!is_navigable("http://site.test/shop", current, false, false, Some(&pattern)));
    }
}
