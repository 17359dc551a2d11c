//! HTML reducer for building the extraction corpus
//!
//! This module turns fetched markup into the single text block handed to the
//! extraction collaborator:
//! - Visible text, whitespace-normalized and space-joined
//! - An enumerated list of `"<anchor text>: <href>"` hyperlinks

use scraper::{ElementRef, Html};

/// Elements whose whole subtree is dropped before text extraction
const STRIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "meta", "header", "footer"];

/// Heading placed between the text and the link list
const HYPERLINKS_HEADING: &str = "Hyperlinks:";

/// A page reduced to its narrative content and links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedPage {
    /// Visible text, one space between words
    pub text: String,

    /// `(anchor text, href)` pairs in document order
    pub links: Vec<(String, String)>,
}

impl ReducedPage {
    /// Renders the corpus: text, a blank line, the heading, then one link per line
    pub fn to_corpus(&self) -> String {
        let links: Vec<String> = self
            .links
            .iter()
            .map(|(text, href)| format!("{}: {}", text, href))
            .collect();

        format!("{}\n\n{}\n{}", self.text, HYPERLINKS_HEADING, links.join("\n"))
    }
}

/// Reduces markup to text and links
///
/// # Stripping Rules
///
/// `script`, `style`, `noscript`, `meta`, `header` and `footer` elements are removed
/// with everything inside them, so anchors in site chrome are not listed either.
///
/// # Link Rules
///
/// Every `<a>` with a non-empty (trimmed) `href` and non-empty visible text is
/// listed, with its href kept verbatim (not resolved against the page URL).
///
/// # Example
///
/// ```
/// use vc_harvester::crawler::reduce_html;
///
/// let html = r#"<html><body><p>Amphista  Therapeutics</p><a href="https://www.amphista.com">Website</a></body></html>"#;
/// let page = reduce_html(html);
/// assert_eq!(page.text, "Amphista Therapeutics Website");
/// assert_eq!(page.links, vec![("Website".to_string(), "https://www.amphista.com".to_string())]);
/// ```
pub fn reduce_html(html: &str) -> ReducedPage {
    let document = Html::parse_document(html);

    let mut words = Vec::new();
    let mut links = Vec::new();
    collect(document.root_element(), &mut words, &mut links);

    ReducedPage {
        text: words.join(" "),
        links,
    }
}

/// Convenience function returning the rendered corpus directly
pub fn reduce(html: &str) -> String {
    reduce_html(html).to_corpus()
}

fn is_stripped(element: &ElementRef<'_>) -> bool {
    STRIPPED_ELEMENTS.contains(&element.value().name())
}

/// Walks the element tree in document order, skipping stripped subtrees
fn collect<'a>(
    element: ElementRef<'a>,
    words: &mut Vec<&'a str>,
    links: &mut Vec<(String, String)>,
) {
    if is_stripped(&element) {
        return;
    }

    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            let mut anchor_text = String::new();
            collect_anchor_text(element, &mut anchor_text);
            if !href.is_empty() && !anchor_text.is_empty() {
                links.push((anchor_text, href.to_string()));
            }
        }
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect(child_element, words, links);
        } else if let Some(text) = child.value().as_text() {
            words.extend(text.split_whitespace());
        }
    }
}

/// Concatenates trimmed text fragments inside an anchor
fn collect_anchor_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !is_stripped(&child_element) {
                collect_anchor_text(child_element, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text.trim());
        }
    }
}
