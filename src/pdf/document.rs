use anyhow::{anyhow, bail, Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::debug;

/// Used when neither the page nor any ancestor carries a MediaBox.
const US_LETTER: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

// Page tree depth limit when resolving inherited attributes
const MAX_TREE_DEPTH: usize = 64;

/// Axis-aligned rectangle in PDF user space (origin at the bottom left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y0 && y <= self.y1
    }

    /// The part of this rectangle at or above `y`.
    pub fn above(&self, y: f64) -> Rect {
        Rect {
            y0: y.clamp(self.y0, self.y1),
            ..*self
        }
    }

    /// The part of this rectangle at or below `y`.
    pub fn below(&self, y: f64) -> Rect {
        Rect {
            y1: y.clamp(self.y0, self.y1),
            ..*self
        }
    }

    fn from_corners(a: (f64, f64), b: (f64, f64)) -> Rect {
        Rect {
            x0: a.0.min(b.0),
            y0: a.1.min(b.1),
            x1: a.0.max(b.0),
            y1: a.1.max(b.1),
        }
    }
}

/// An open PDF. The underlying document is released when this value drops,
/// so every exit path closes it.
pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let doc =
            Document::load(&path).with_context(|| format!("Failed to open PDF: {}", path_str))?;
        debug!(path = %path_str, pages = doc.get_pages().len(), "opened document");
        Ok(PdfDocument {
            doc,
            path: path_str,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page numbers (1-based) and object ids, in page order.
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.page_ids()
            .get(index as usize)
            .map(|&(_, id)| id)
            .ok_or_else(|| {
                anyhow!(
                    "Page index {} out of range (document has {} pages)",
                    index,
                    self.page_count()
                )
            })
    }

    /// Delete one page by 0-based index. Later pages move down by one.
    pub fn delete_page(&mut self, index: u32) -> Result<()> {
        self.page_id(index)?;
        self.doc.delete_pages(&[index + 1]);
        Ok(())
    }

    /// Delete pages given as strictly descending 0-based indices, so that no
    /// deletion shifts a page that is still to be deleted.
    pub fn delete_pages_desc(&mut self, indices: &[u32]) -> Result<()> {
        if !indices.windows(2).all(|w| w[0] > w[1]) {
            bail!("Page indices must be strictly descending: {:?}", indices);
        }
        for &index in indices {
            self.delete_page(index)?;
        }
        Ok(())
    }

    /// The MediaBox of a page, following `/Parent` links for inherited values.
    pub fn media_box(&self, index: u32) -> Result<Rect> {
        let page_id = self.page_id(index)?;
        let Some(value) = self.inherited_attribute(page_id, b"MediaBox") else {
            debug!(index, "page has no MediaBox, assuming US Letter");
            return Ok(US_LETTER);
        };

        let value = match value {
            Object::Reference(id) => self.doc.get_object(*id)?,
            other => other,
        };
        let numbers = value
            .as_array()?
            .iter()
            .map(|n| n.as_float().map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Malformed MediaBox on page {}", index + 1))?;

        match numbers.as_slice() {
            &[x0, y0, x1, y1] => Ok(Rect::from_corners((x0, y0), (x1, y1))),
            _ => bail!("Malformed MediaBox on page {}", index + 1),
        }
    }

    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Restrict what is drawn on a page to `region`. Content outside it stays
    /// in the stream but is clipped away.
    pub fn clip_page(&mut self, index: u32, region: Rect) -> Result<()> {
        let page_id = self.page_id(index)?;
        let content = self
            .doc
            .get_page_content(page_id)
            .with_context(|| format!("Failed to read content of page {}", index + 1))?;

        let mut clipped = format!(
            "q {:.3} {:.3} {:.3} {:.3} re W n\n",
            region.x0,
            region.y0,
            region.width(),
            region.height()
        )
        .into_bytes();
        clipped.extend_from_slice(&content);
        clipped.extend_from_slice(b"\nQ\n");

        self.doc
            .change_page_content(page_id, clipped)
            .with_context(|| format!("Failed to rewrite content of page {}", index + 1))?;
        debug!(page = index + 1, ?region, "clipped page");
        Ok(())
    }

    /// Drop objects that deletions left unreachable, then write to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.doc.prune_objects();
        debug!(source = %self.path, output = %path.as_ref().display(), "saving document");
        self.doc
            .save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}
