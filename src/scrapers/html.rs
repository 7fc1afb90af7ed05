//! Text helpers over the `scraper` document tree.

use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};

/// Text of an element and all its descendants, whitespace-collapsed and
/// joined with single spaces.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    collapse(element.text())
}

/// Text of the element's direct text children only.
pub fn own_text(element: ElementRef<'_>) -> String {
    collapse(
        element
            .children()
            .filter_map(|child| child.value().as_text().map(|t| &**t)),
    )
}

/// Normalized text of the element's child node at `index`, counting from
/// the end when negative. Comments yield an empty string.
///
/// Returns the number of children as the error when `index` is out of range.
pub fn child_text(element: ElementRef<'_>, index: isize) -> Result<String, usize> {
    let children: Vec<_> = element.children().collect();
    let len = children.len();
    let position = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index.unsigned_abs()).filter(|&i| i < len)
    };
    let node = position.and_then(|i| children.get(i).copied()).ok_or(len)?;

    if let Some(child) = ElementRef::wrap(node) {
        return Ok(normalized_text(child));
    }
    Ok(node
        .value()
        .as_text()
        .map(|t| collapse(std::iter::once(&**t)))
        .unwrap_or_default())
}

/// First element in document order matching `selector`.
pub fn first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

fn collapse<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments.flat_map(str::split_whitespace).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn test_normalized_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  Hello\n   <b>big</b>\tworld  </p>");
        assert_eq!(normalized_text(select(&doc, "p")), "Hello big world");
    }

    #[test]
    fn test_own_text_skips_nested_elements() {
        let doc = Html::parse_fragment("<span>Posted <b>by staff</b> today</span>");
        assert_eq!(own_text(select(&doc, "span")), "Posted today");
    }

    #[test]
    fn test_child_text_for_text_and_element_children() {
        let doc = Html::parse_fragment("<h5> first <i>second</i><!-- note --></h5>");
        let h5 = select(&doc, "h5");
        assert_eq!(child_text(h5, 0).unwrap(), "first");
        assert_eq!(child_text(h5, 1).unwrap(), "second");
        assert_eq!(child_text(h5, -1).unwrap(), "");
        assert_eq!(child_text(h5, -2).unwrap(), "second");
    }

    #[test]
    fn test_child_text_out_of_range_reports_len() {
        let doc = Html::parse_fragment("<h5>only</h5><h6></h6>");
        assert_eq!(child_text(select(&doc, "h5"), 1), Err(1));
        assert_eq!(child_text(select(&doc, "h5"), -2), Err(1));
        assert_eq!(child_text(select(&doc, "h6"), -1), Err(0));
    }

    #[test]
    fn test_first_returns_document_order() {
        let doc = Html::parse_document("<p>one</p><p>two</p>");
        let p = first(&doc, &Selector::parse("p").unwrap()).unwrap();
        assert_eq!(normalized_text(p), "one");
    }
}
