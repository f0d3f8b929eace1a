//! Resolution of 1-based page selections into descending 0-based deletion indices.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// How a page specification is being read. Only changes error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Delete,
    Keep,
}

impl SpecKind {
    fn verb(self) -> &'static str {
        match self {
            SpecKind::Delete => "delete",
            SpecKind::Keep => "keep",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Delete => f.write_str("Delete"),
            SpecKind::Keep => f.write_str("Keep"),
        }
    }
}

/// Where in a token a number was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPosition {
    Page,
    RangeStart,
    RangeEnd,
}

impl fmt::Display for NumberPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberPosition::Page => f.write_str("page number"),
            NumberPosition::RangeStart => f.write_str("range start"),
            NumberPosition::RangeEnd => f.write_str("range end"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Before,
    After,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Before => f.write_str("before"),
            Bound::After => f.write_str("after"),
        }
    }
}

/// Raised when a page specification or page bound cannot be parsed or
/// validated against the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageSpecError {
    #[error("{kind} specification cannot be empty")]
    EmptySpec { kind: SpecKind },

    #[error("Cannot {} pages from an empty document", .kind.verb())]
    EmptyDocument { kind: SpecKind },

    #[error("Invalid {} specification: empty item", .kind.verb())]
    EmptyItem { kind: SpecKind },

    #[error("Invalid range token: '{0}'")]
    MalformedRange(String),

    #[error("Empty {what}")]
    EmptyNumber { what: NumberPosition },

    #[error("Invalid {what}: '{token}'")]
    InvalidNumber { what: NumberPosition, token: String },

    #[error("{what} must be >= 1")]
    NotPositive { what: NumberPosition },

    #[error("Invalid range '{0}': end < start")]
    InvertedRange(String),

    #[error("Range '{token}' out of bounds (document has {page_count} pages)")]
    RangeOutOfBounds { token: String, page_count: u32 },

    #[error("Page {page} out of bounds (document has {page_count} pages)")]
    PageOutOfBounds { page: u64, page_count: u32 },

    #[error("{bound} page must be >= 1")]
    BoundNotPositive { bound: Bound },

    #[error("{bound} page {page} out of bounds (document has {page_count} pages)")]
    BoundOutOfBounds {
        bound: Bound,
        page: u32,
        page_count: u32,
    },

    #[error("At least one of before page or after page must be provided")]
    NoBound,
}

pub type Result<T> = std::result::Result<T, PageSpecError>;

/// Normalized deletion indices: unique, 0-based, descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSpec {
    indices_desc: Vec<u32>,
}

impl DeleteSpec {
    /// Normalize 0-based indices in any order: duplicates collapse and the
    /// result is descending.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        let unique: BTreeSet<u32> = indices.into_iter().collect();
        DeleteSpec {
            indices_desc: unique.into_iter().rev().collect(),
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices_desc
    }

    pub fn into_indices(self) -> Vec<u32> {
        self.indices_desc
    }

    pub fn count(&self) -> usize {
        self.indices_desc.len()
    }

    /// The same pages as users number them, ascending.
    pub fn as_one_based_sorted(&self) -> Vec<u32> {
        self.indices_desc.iter().rev().map(|i| i + 1).collect()
    }
}

/// One comma-separated item of a specification, still 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageToken {
    Single(u64),
    Range(u64, u64),
}

impl PageToken {
    fn parse(item: &str) -> Result<Self> {
        if !item.contains('-') {
            return parse_positive(item, NumberPosition::Page).map(PageToken::Single);
        }

        let mut parts = item.split('-');
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PageSpecError::MalformedRange(item.to_string()));
        };

        let start = parse_positive(start, NumberPosition::RangeStart)?;
        let end = parse_positive(end, NumberPosition::RangeEnd)?;
        if end < start {
            return Err(PageSpecError::InvertedRange(item.to_string()));
        }
        Ok(PageToken::Range(start, end))
    }

    /// Check against the page count and add the covered pages to `pages`.
    fn collect_into(self, item: &str, page_count: u32, pages: &mut BTreeSet<u32>) -> Result<()> {
        let last = u64::from(page_count);
        match self {
            PageToken::Single(page) => {
                if page > last {
                    return Err(PageSpecError::PageOutOfBounds { page, page_count });
                }
                pages.insert(page as u32);
            }
            PageToken::Range(start, end) => {
                if start > last || end > last {
                    return Err(PageSpecError::RangeOutOfBounds {
                        token: item.to_string(),
                        page_count,
                    });
                }
                pages.extend(start as u32..=end as u32);
            }
        }
        Ok(())
    }
}

fn parse_positive(token: &str, what: NumberPosition) -> Result<u64> {
    let token = token.trim();
    if token.is_empty() {
        return Err(PageSpecError::EmptyNumber { what });
    }
    // `str::parse` would also accept a leading '+'.
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageSpecError::InvalidNumber {
            what,
            token: token.to_string(),
        });
    }
    // All digits, so parsing can only overflow; that is out of bounds anyway.
    let value: u64 = token.parse().unwrap_or(u64::MAX);
    if value < 1 {
        return Err(PageSpecError::NotPositive { what });
    }
    Ok(value)
}

fn parse_spec(spec: &str, page_count: u32, kind: SpecKind) -> Result<DeleteSpec> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(PageSpecError::EmptySpec { kind });
    }
    if page_count == 0 {
        return Err(PageSpecError::EmptyDocument { kind });
    }

    let mut pages = BTreeSet::new();
    for raw_item in spec.split(',') {
        let item = raw_item.trim();
        if item.is_empty() {
            return Err(PageSpecError::EmptyItem { kind });
        }
        PageToken::parse(item)?.collect_into(item, page_count, &mut pages)?;
    }

    Ok(DeleteSpec::from_indices(pages.into_iter().map(|page| page - 1)))
}

/// Parse a delete specification like "1-4,7" into descending 0-based indices.
///
/// Items are either `N` or an inclusive range `A-B`. Every page must lie in
/// `1..=page_count`; duplicates are allowed and collapse.
pub fn parse_delete_spec(spec: &str, page_count: u32) -> Result<DeleteSpec> {
    parse_spec(spec, page_count, SpecKind::Delete)
}

/// Every index in `0..page_count` that is not in `keep`, descending.
fn complement_desc(keep: &[u32], page_count: u32) -> Vec<u32> {
    let keep: BTreeSet<u32> = keep.iter().copied().collect();
    (0..page_count).rev().filter(|i| !keep.contains(i)).collect()
}

/// Compute the indices to delete from a delete spec, or from a keep spec when
/// `invert` is set.
///
/// Returns `(indices_to_delete_desc, None)` for a delete spec and
/// `(indices_to_delete_desc, Some(keep_indices_desc))` for a keep spec.
pub fn compute_indices_to_delete(
    spec: &str,
    page_count: u32,
    invert: bool,
) -> Result<(Vec<u32>, Option<Vec<u32>>)> {
    if !invert {
        return Ok((parse_delete_spec(spec, page_count)?.into_indices(), None));
    }

    let keep = parse_spec(spec, page_count, SpecKind::Keep)?.into_indices();
    Ok((complement_desc(&keep, page_count), Some(keep)))
}

/// Indices of the pages strictly before 1-based `before_page`.
///
/// `before_page` may be one past the last page, which selects the whole
/// document.
pub fn indices_before_page(before_page: u32, page_count: u32) -> Result<Vec<u32>> {
    if page_count == 0 {
        return Ok(Vec::new());
    }
    if before_page < 1 {
        return Err(PageSpecError::BoundNotPositive {
            bound: Bound::Before,
        });
    }
    if u64::from(before_page) > u64::from(page_count) + 1 {
        return Err(PageSpecError::BoundOutOfBounds {
            bound: Bound::Before,
            page: before_page,
            page_count,
        });
    }

    let end_exclusive = (before_page - 1).min(page_count);
    Ok((0..end_exclusive).rev().collect())
}

/// Indices of the pages strictly after 1-based `after_page`.
pub fn indices_after_page(after_page: u32, page_count: u32) -> Result<Vec<u32>> {
    if page_count == 0 {
        return Ok(Vec::new());
    }
    if after_page < 1 {
        return Err(PageSpecError::BoundNotPositive {
            bound: Bound::After,
        });
    }
    if after_page > page_count {
        return Err(PageSpecError::BoundOutOfBounds {
            bound: Bound::After,
            page: after_page,
            page_count,
        });
    }

    // 1-based N+1 is 0-based N
    Ok((after_page..page_count).rev().collect())
}

/// Union of the before and after selections; with `invert` the union is what
/// gets kept. Same return shape as [`compute_indices_to_delete`].
pub fn compute_before_after(
    before_page: Option<u32>,
    after_page: Option<u32>,
    page_count: u32,
    invert: bool,
) -> Result<(Vec<u32>, Option<Vec<u32>>)> {
    if before_page.is_none() && after_page.is_none() {
        return Err(PageSpecError::NoBound);
    }

    let mut selected = BTreeSet::new();
    if let Some(before) = before_page {
        selected.extend(indices_before_page(before, page_count)?);
    }
    if let Some(after) = after_page {
        selected.extend(indices_after_page(after, page_count)?);
    }
    let selected: Vec<u32> = selected.into_iter().rev().collect();

    if invert {
        Ok((complement_desc(&selected, page_count), Some(selected)))
    } else {
        Ok((selected, None))
    }
}
