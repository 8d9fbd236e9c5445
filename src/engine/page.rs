//! Page representation

use crate::renderer::{Fragment, HtmlParser};
use crate::utils::Result;

/// A fetched and parsed page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The page URL
    url: String,
    /// Text of the first `<title>`
    title: String,
    /// Inner HTML of the container, if the response has one
    fragment: Option<Fragment>,
    /// The whole response document
    document: String,
}

impl Page {
    /// Parse `html` and pick out the content for `container_id`
    pub fn parse(url: impl Into<String>, html: impl Into<String>, container_id: &str) -> Result<Self> {
        let document = html.into();
        let extracted = HtmlParser::new().extract(&document, container_id)?;
        Ok(Self {
            url: url.into(),
            title: extracted.title,
            fragment: extracted.fragment,
            document,
        })
    }

    /// Use `fragment` as the container content if the document had none
    pub fn or_fragment(mut self, fragment: Fragment) -> Self {
        if self.fragment.is_none() {
            self.fragment = Some(fragment);
        }
        self
    }

    /// Get the page URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fragment(&self) -> Option<&Fragment> {
        self.fragment.as_ref()
    }

    /// Get the raw document
    pub fn document(&self) -> &str {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let page = Page::parse(
            "https://site.test/about",
            "<title>About</title><div id='main'><p>Hi</p></div>",
            "main",
        )
        .unwrap();
        assert_eq!(page.url(), "https://site.test/about");
        assert_eq!(page.title(), "About");
        assert_eq!(page.fragment().map(|f| f.html()), Some("<p>Hi</p>"));
        assert!(page.document().contains("<p>Hi</p>"));
    }

    #[test]
    fn test_or_fragment_keeps_parsed_content() {
        let page = Page::parse("https://site.test/", "<div id='main'>a</div>", "main")
            .unwrap()
            .or_fragment(Fragment::new("b"));
        assert_eq!(page.fragment().map(|f| f.html()), Some("a"));

        let page = Page::parse("https://site.test/", "<title>Home</title>", "main")
            .unwrap()
            .or_fragment(Fragment::new("b"));
        assert_eq!(page.fragment().map(|f| f.html()), Some("b"));
        assert_eq!(page.title(), "Home");
    }
}
