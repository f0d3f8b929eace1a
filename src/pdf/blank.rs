//! Detection of pages that carry no meaningful text.

use crate::pdf::text::{extract_layout, PageLayout, TextLine};
use crate::pdf::{PdfDocument, Rect};
use anyhow::Result;
use tracing::debug;

/// More non-whitespace characters than this and a page is never blank.
const MEANINGFUL_TEXT_LIMIT: usize = 20;
/// A line longer than this (trimmed) counts as real content.
const SUBSTANTIAL_LINE_LEN: usize = 10;
/// Trimmed text shorter than this is treated as a stray mark.
const MINIMAL_TEXT_LEN: usize = 5;

/// Decide from a page's text lines whether the page is blank.
///
/// Pages whose only text is a page number or a few stray characters count as
/// blank; anything with a substantial line of text does not.
pub fn is_blank_text(lines: &[String]) -> bool {
    let text = lines.join("\n");
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();

    if meaningful > MEANINGFUL_TEXT_LIMIT {
        return false;
    }
    if lines
        .iter()
        .any(|line| line.trim().chars().count() > SUBSTANTIAL_LINE_LEN)
    {
        return false;
    }
    if meaningful == 0 {
        return true;
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.chars().all(|c| c.is_ascii_digit()) || text.trim().chars().count() < MINIMAL_TEXT_LEN
}

pub fn is_blank(page: &PageLayout, visible: Option<Rect>) -> bool {
    let lines: Vec<String> = page
        .visible_lines(visible)
        .iter()
        .map(TextLine::text)
        .collect();
    is_blank_text(&lines)
}

/// Indices of blank pages, descending. `clipped` names a page that only shows
/// part of its area, so only that part is inspected.
pub fn blank_page_indices(layouts: &[PageLayout], clipped: Option<(u32, Rect)>) -> Vec<u32> {
    let mut blank: Vec<u32> = layouts
        .iter()
        .filter(|page| {
            let visible = clipped
                .filter(|(index, _)| *index == page.index)
                .map(|(_, region)| region);
            is_blank(page, visible)
        })
        .map(|page| page.index)
        .collect();
    blank.sort_unstable_by(|a, b| b.cmp(a));
    blank
}

/// Remove every blank page from `doc` and return how many were removed.
pub fn remove_blank_pages(doc: &mut PdfDocument, clipped: Option<(u32, Rect)>) -> Result<usize> {
    let layouts = extract_layout(&doc.doc)?;
    let blank = blank_page_indices(&layouts, clipped);
    for index in &blank {
        debug!(page = index + 1, "removing blank page");
    }
    doc.delete_pages_desc(&blank)?;
    Ok(blank.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_text_is_blank() {
        assert!(is_blank_text(&[]));
        assert!(is_blank_text(&lines(&["   ", ""])));
    }

    #[test]
    fn test_page_number_only_is_blank() {
        assert!(is_blank_text(&lines(&["12"])));
        assert!(is_blank_text(&lines(&["1 2 3"])));
    }

    #[test]
    fn test_stray_characters_are_blank() {
        assert!(is_blank_text(&lines(&["ab"])));
    }

    #[test]
    fn test_short_words_are_not_blank() {
        assert!(!is_blank_text(&lines(&["Notes"])));
        assert!(!is_blank_text(&lines(&["see", "page"])));
    }

    #[test]
    fn test_substantial_line_is_not_blank() {
        assert!(!is_blank_text(&lines(&["Conclusion."])));
    }

    #[test]
    fn test_lots_of_short_lines_is_not_blank() {
        let many = vec!["abc".to_string(); 8];
        assert!(!is_blank_text(&many));
    }

    #[test]
    fn test_blank_indices_descending() {
        let doc = fixture::build(&[
            &[],
            &["A page with plenty of text on it"],
            &["7"],
            &["Another page with real content"],
        ]);
        let layouts = extract_layout(&doc).unwrap();
        assert_eq!(blank_page_indices(&layouts, None), vec![2, 0]);
    }

    #[test]
    fn test_clipped_region_is_respected() {
        let doc = fixture::build(&[&["Heading that stays", "Body text that gets cut away"]]);
        let layouts = extract_layout(&doc).unwrap();
        let below_everything = fixture::media_box().below(100.0);
        assert!(blank_page_indices(&layouts, None).is_empty());
        assert_eq!(
            blank_page_indices(&layouts, Some((0, below_everything))),
            vec![0]
        );
    }

    #[test]
    fn test_remove_blank_pages() {
        let mut doc = PdfDocument {
            doc: fixture::build(&[&["Real content on the first page"], &[], &[]]),
            path: "fixture.pdf".to_string(),
        };
        assert_eq!(remove_blank_pages(&mut doc, None).unwrap(), 2);
        assert_eq!(doc.page_count(), 1);
    }
}
