//! URL resolution utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)

use url::Url;

/// [§ 4.4 URL parsing](https://url.spec.whatwg.org/#concept-url-parser)
///
/// Resolve a potentially relative URL found in a stylesheet against the
/// stylesheet's location.
///
/// STEP 1: "If url is an absolute URL, return url."
///
/// STEP 2: "Otherwise, resolve url relative to base."
///
/// Returns `None` when neither the URL nor the base parse.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> Option<String> {
    let href = href.trim();
    // STEP 1
    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.into());
    }

    // STEP 2
    let base = Url::parse(base_url?).ok()?;
    base.join(href).ok().map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::resolve_url;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            resolve_url("https://fonts.test/a.woff", Some("https://example.com/")).as_deref(),
            Some("https://fonts.test/a.woff")
        );
    }

    #[test]
    fn relative_urls_join_against_sheet_location() {
        assert_eq!(
            resolve_url("../fonts/a.ttf", Some("https://example.com/css/site.css")).as_deref(),
            Some("https://example.com/fonts/a.ttf")
        );
    }

    #[test]
    fn relative_without_base_is_unresolvable() {
        assert_eq!(resolve_url("a.ttf", None), None);
    }
}
