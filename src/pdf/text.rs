use crate::pdf::Rect;
use anyhow::{anyhow, bail, Context, Result};
use lopdf::Document;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// One rendered character in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub x: f64,
    /// Baseline.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Glyph {
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Glyphs sharing a baseline, in content order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub glyphs: Vec<Glyph>,
}

impl TextLine {
    pub fn baseline(&self) -> f64 {
        self.glyphs.first().map_or(0.0, |g| g.y)
    }

    fn accepts(&self, glyph: &Glyph) -> bool {
        let tolerance = (glyph.height * 0.5).max(1.0);
        (self.baseline() - glyph.y).abs() <= tolerance
    }

    /// Line text plus the byte offset at which each glyph starts. A space is
    /// inserted where the gap between two glyphs looks like a word break.
    fn text_with_offsets(&self) -> (String, Vec<usize>) {
        let mut text = String::new();
        let mut offsets = Vec::with_capacity(self.glyphs.len());
        let mut previous: Option<&Glyph> = None;

        for glyph in &self.glyphs {
            if let Some(prev) = previous {
                let gap = glyph.x - (prev.x + prev.width);
                let spaced = prev.text.ends_with(char::is_whitespace)
                    || glyph.text.starts_with(char::is_whitespace);
                if !spaced && gap > glyph.height * 0.2 {
                    text.push(' ');
                }
            }
            offsets.push(text.len());
            text.push_str(&glyph.text);
            previous = Some(glyph);
        }
        (text, offsets)
    }

    pub fn text(&self) -> String {
        self.text_with_offsets().0
    }

    /// Top edge of the first glyph matched by `pattern`, if any.
    fn find(&self, pattern: &Regex) -> Option<f64> {
        let (text, offsets) = self.text_with_offsets();
        let start = pattern.find(&text)?.start();
        let glyph = offsets.partition_point(|&offset| offset <= start).checked_sub(1)?;
        self.glyphs.get(glyph).map(Glyph::top)
    }
}

/// Text layout of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 0-based position in the document.
    pub index: u32,
    pub lines: Vec<TextLine>,
}

impl PageLayout {
    fn push(&mut self, glyph: Glyph) {
        match self.lines.last_mut() {
            Some(line) if line.accepts(&glyph) => line.glyphs.push(glyph),
            _ => self.lines.push(TextLine {
                glyphs: vec![glyph],
            }),
        }
    }

    /// Lines as seen through `region`: glyphs whose baseline falls outside
    /// it are dropped, and lines left empty disappear.
    pub fn visible_lines(&self, region: Option<Rect>) -> Vec<TextLine> {
        let Some(region) = region else {
            return self.lines.clone();
        };
        self.lines
            .iter()
            .map(|line| TextLine {
                glyphs: line
                    .glyphs
                    .iter()
                    .filter(|g| region.contains_y(g.y))
                    .cloned()
                    .collect(),
            })
            .filter(|line| !line.glyphs.is_empty())
            .collect()
    }
}

/// Where a search string was first found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextHit {
    pub page_index: u32,
    /// Top edge of the match in PDF user space.
    pub top: f64,
}

#[derive(Default)]
struct LayoutCollector {
    pages: Vec<PageLayout>,
    current: Option<PageLayout>,
}

impl OutputDev for LayoutCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current = Some(PageLayout {
            index: page_num.saturating_sub(1),
            lines: Vec::new(),
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let Some(page) = self.current.as_mut() else {
            return Ok(());
        };
        let horizontal = (trm.m11 * trm.m11 + trm.m12 * trm.m12).sqrt();
        let vertical = (trm.m21 * trm.m21 + trm.m22 * trm.m22).sqrt();
        page.push(Glyph {
            text: char.to_string(),
            x: trm.m31,
            y: trm.m32,
            width: width * font_size * horizontal,
            height: font_size * vertical,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Glyph positions for every page of `doc`, in page order.
pub fn extract_layout(doc: &Document) -> Result<Vec<PageLayout>> {
    let mut collector = LayoutCollector::default();
    pdf_extract::output_doc(doc, &mut collector)
        .map_err(|e| anyhow!("Failed to extract text layout: {:?}", e))?;
    debug!(pages = collector.pages.len(), "extracted text layout");
    Ok(collector.pages)
}

/// Case-insensitive pattern for `needle` that tolerates any whitespace (or
/// none) between its words.
pub fn search_pattern(needle: &str) -> Result<Regex> {
    let words: Vec<String> = needle.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        bail!("Search string cannot be empty");
    }
    RegexBuilder::new(&words.join(r"\s*"))
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid search string: '{}'", needle))
}

/// First occurrence of `needle`: the earliest page containing it, and on that
/// page the topmost match.
pub fn find_text(layouts: &[PageLayout], needle: &str) -> Result<Option<TextHit>> {
    let pattern = search_pattern(needle)?;

    for page in layouts {
        let top = page
            .lines
            .iter()
            .filter_map(|line| line.find(&pattern))
            .max_by(f64::total_cmp);
        if let Some(top) = top {
            debug!(page = page.index + 1, top, "found search string");
            return Ok(Some(TextHit {
                page_index: page.index,
                top,
            }));
        }
    }

    debug!(needle, "search string not found");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture;

    fn line(text: &str, y: f64) -> TextLine {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph {
                text: c.to_string(),
                x: 72.0 + 6.0 * i as f64,
                y,
                width: 6.0,
                height: 12.0,
            })
            .collect();
        TextLine { glyphs }
    }

    fn page(index: u32, lines: Vec<TextLine>) -> PageLayout {
        PageLayout { index, lines }
    }

    #[test]
    fn test_pattern_ignores_case_and_spacing() {
        let pattern = search_pattern("Chapter  5").unwrap();
        assert!(pattern.is_match("CHAPTER 5"));
        assert!(pattern.is_match("chapter5"));
        assert!(!pattern.is_match("Chapter 6"));
    }

    #[test]
    fn test_pattern_escapes_metacharacters() {
        let pattern = search_pattern("a.b (c)").unwrap();
        assert!(pattern.is_match("a.b (c)"));
        assert!(!pattern.is_match("axb (c)"));
    }

    #[test]
    fn test_empty_needle_rejected() {
        assert!(search_pattern("   ").is_err());
    }

    #[test]
    fn test_first_page_wins() {
        let layouts = vec![
            page(0, vec![line("Introduction", 720.0)]),
            page(1, vec![line("Appendix A", 500.0)]),
            page(2, vec![line("Appendix A", 700.0)]),
        ];
        let hit = find_text(&layouts, "appendix a").unwrap().unwrap();
        assert_eq!(hit.page_index, 1);
        assert_eq!(hit.top, 512.0);
    }

    #[test]
    fn test_topmost_hit_on_page() {
        let layouts = vec![page(
            0,
            vec![line("see Notes below", 300.0), line("Notes", 600.0)],
        )];
        let hit = find_text(&layouts, "notes").unwrap().unwrap();
        assert_eq!(hit.top, 612.0);
    }

    #[test]
    fn test_not_found() {
        let layouts = vec![page(0, vec![line("Nothing to see", 720.0)])];
        assert_eq!(find_text(&layouts, "missing").unwrap(), None);
    }

    #[test]
    fn test_gap_becomes_space() {
        let mut text = line("ab", 100.0);
        text.glyphs[1].x += 20.0;
        assert_eq!(text.text(), "a b");
    }

    #[test]
    fn test_lines_grouped_by_baseline() {
        let mut layout = page(0, Vec::new());
        for glyph in line("ab", 100.0).glyphs {
            layout.push(glyph);
        }
        for glyph in line("cd", 80.0).glyphs {
            layout.push(glyph);
        }
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[1].text(), "cd");
    }

    #[test]
    fn test_visible_lines_respects_region() {
        let layout = page(0, vec![line("top line", 700.0), line("bottom line", 100.0)]);
        let visible = layout.visible_lines(Some(fixture::media_box().above(400.0)));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text(), "top line");
        assert_eq!(layout.visible_lines(None).len(), 2);
    }

    #[test]
    fn test_extract_layout_from_document() {
        let doc = fixture::build(&[
            &["First page heading"],
            &["Body text on page two", "Appendix A"],
        ]);
        let layouts = extract_layout(&doc).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[1].index, 1);

        let hit = find_text(&layouts, "Appendix A").unwrap().unwrap();
        assert_eq!(hit.page_index, 1);
        assert!(hit.top > fixture::baseline(1));
        assert!(hit.top < fixture::baseline(0));
    }
}
