//! Structural queries over a parsed page.
//!
//! Extractors only ever see `&dyn DocumentQuery`; the `scraper` crate stays
//! behind this module.

use scraper::{ElementRef, Html, Selector};

use crate::scraper::error::{ExtractError, ExtractResult};

pub type Fragment<'a> = Box<dyn DocumentQuery + 'a>;

/// One capability: evaluate a structural query against a fragment and get
/// back text, a single fragment or a fragment list.
///
/// Queries are CSS selectors matched against descendants of the fragment.
/// Direct-child positions (the `./*[n]` axis) go through [`child`].
///
/// [`child`]: DocumentQuery::child
pub trait DocumentQuery {
    fn tag_name(&self) -> &str;

    /// Every descendant matching `query`, in document order.
    fn select_all(&self, query: &str) -> ExtractResult<Vec<Fragment<'_>>>;

    /// Element children, in order.
    fn elements(&self) -> Vec<Fragment<'_>>;

    /// First following sibling element named `tag`.
    fn following_sibling(&self, tag: &str) -> Option<Fragment<'_>>;

    /// Direct text nodes, whitespace-only ones skipped.
    fn own_texts(&self) -> Vec<String>;

    fn outer_html(&self) -> String;

    fn select_first(&self, query: &str) -> ExtractResult<Fragment<'_>> {
        self.select_all(query)?
            .into_iter()
            .next()
            .ok_or_else(|| ExtractError::missing(query))
    }

    /// `index` is 0-based.
    fn select_nth(&self, query: &str, index: usize) -> ExtractResult<Fragment<'_>> {
        self.select_all(query)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| ExtractError::missing(format!("{} [{}]", query, index)))
    }

    /// First direct text node of the first match that has one.
    fn select_text(&self, query: &str) -> ExtractResult<String> {
        self.select_all(query)?
            .iter()
            .find_map(|f| f.own_text())
            .ok_or_else(|| ExtractError::missing(format!("{} /text()", query)))
    }

    /// All direct text nodes of all matches.
    fn select_texts(&self, query: &str) -> ExtractResult<Vec<String>> {
        Ok(self
            .select_all(query)?
            .iter()
            .flat_map(|f| f.own_texts())
            .collect())
    }

    /// Element child at `position`, 1-based like `./*[n]`.
    fn child(&self, position: usize) -> ExtractResult<Fragment<'_>> {
        position
            .checked_sub(1)
            .and_then(|i| self.elements().into_iter().nth(i))
            .ok_or_else(|| ExtractError::missing(format!("{}/*[{}]", self.tag_name(), position)))
    }

    fn child_text(&self, position: usize) -> ExtractResult<String> {
        self.child(position)?.own_text().ok_or_else(|| {
            ExtractError::missing(format!("{}/*[{}]/text()", self.tag_name(), position))
        })
    }

    fn own_text(&self) -> Option<String> {
        self.own_texts().into_iter().next()
    }
}

fn compile(query: &str) -> ExtractResult<Selector> {
    Selector::parse(query).map_err(|e| ExtractError::InvalidQuery {
        query: query.to_string(),
        reason: format!("{:?}", e),
    })
}

impl DocumentQuery for ElementRef<'_> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn select_all(&self, query: &str) -> ExtractResult<Vec<Fragment<'_>>> {
        let selector = compile(query)?;
        Ok(ElementRef::select(self, &selector)
            .map(|el| Box::new(el) as Fragment<'_>)
            .collect())
    }

    fn elements(&self) -> Vec<Fragment<'_>> {
        self.children()
            .filter_map(ElementRef::wrap)
            .map(|el| Box::new(el) as Fragment<'_>)
            .collect()
    }

    fn following_sibling(&self, tag: &str) -> Option<Fragment<'_>> {
        self.next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == tag)
            .map(|el| Box::new(el) as Fragment<'_>)
    }

    fn own_texts(&self) -> Vec<String> {
        self.children()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.to_string())
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    fn outer_html(&self) -> String {
        ElementRef::html(self)
    }
}

// ── Page ──────────────────────────────────────────────────────────────────────

/// A parsed HTML document.
pub struct Page {
    html: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
        <div id="anchor"><h4>Heading</h4></div>
        <p>not a div</p>
        <div class="detail">
            <div class="row">
                <p> first </p>
                <h5>$150</h5>
                <h5>Student $120</h5>
                <p>second<br>second-b</p>
            </div>
        </div>
    </body></html>"#;

    #[test]
    fn test_select_text_skips_blank_nodes() {
        let page = Page::parse(HTML);
        let root = page.root();
        assert_eq!(root.select_text("#anchor h4").unwrap(), "Heading");
        assert_eq!(root.select_text("div.row").ok(), None);
    }

    #[test]
    fn test_child_positions_are_one_based() {
        let page = Page::parse(HTML);
        let root = page.root();
        let row = root.select_first("div.row").unwrap();
        assert_eq!(row.tag_name(), "div");
        assert_eq!(row.child_text(1).unwrap().trim(), "first");
        assert_eq!(row.child_text(2).unwrap(), "$150");
        assert_eq!(row.child_text(3).unwrap(), "Student $120");
        assert!(matches!(row.child(0), Err(ExtractError::MissingFragment { .. })));
        assert!(matches!(row.child(9), Err(ExtractError::MissingFragment { .. })));
    }

    #[test]
    fn test_texts_and_nth_of_type() {
        let page = Page::parse(HTML);
        let root = page.root();
        let texts = root.select_texts("div.row > p:nth-of-type(2)").unwrap();
        assert_eq!(texts, vec!["second", "second-b"]);
    }

    #[test]
    fn test_following_sibling_by_tag() {
        let page = Page::parse(HTML);
        let root = page.root();
        let anchor = root.select_first("div#anchor").unwrap();
        let detail = anchor.following_sibling("div").unwrap();
        assert!(detail.outer_html().starts_with("<div class=\"detail\">"));
        assert!(detail.following_sibling("div").is_none());
    }

    #[test]
    fn test_missing_and_invalid_queries() {
        let page = Page::parse(HTML);
        let root = page.root();
        assert!(matches!(
            root.select_first("#nowhere"),
            Err(ExtractError::MissingFragment { .. })
        ));
        assert!(matches!(
            root.select_all("div[[["),
            Err(ExtractError::InvalidQuery { .. })
        ));
        assert!(root.select_nth("h5", 1).is_ok());
        assert!(root.select_nth("h5", 2).is_err());
    }
}
