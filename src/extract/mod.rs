//! Per-page extraction: ordering tables, specification matrices, contact
//! resolution and the scalar parsers for non-tabular documents.

pub mod contacts;
pub mod patterns;
pub mod scalar;
pub mod spec_matrix;
pub mod variant_table;

pub use contacts::ContactResolver;
pub use patterns::{MatchMode, PatternTable};
pub use scalar::{ReferenceFields, ScalarParsers, SingleProductFields};
pub use spec_matrix::{distribute_groups, ContactValueMap, MatrixExtractor, MatrixRow, SpecMatrix};
pub use variant_table::{ContactSource, RowStrategy, VariantRow, VariantTableExtractor};

/// Vendor ordering code: `9d` prefix then 4, 2-4 and 2 digit blocks.
pub const ORDERING_CODE_PATTERN: &str = r"\b9\d[ \t]?\d{4}[ \t]?\d{2,4}[ \t]?\d{2}\b";

/// Canonical block layout of an ordering code, by digit count.
/// 10 → 2-4-2-2, 11 → 2-4-3-2, 12 → 2-4-4-2, otherwise 4-digit chunks.
pub fn canonicalize_code(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let layout: &[usize] = match digits.len() {
        10 => &[2, 4, 2, 2],
        11 => &[2, 4, 3, 2],
        12 => &[2, 4, 4, 2],
        _ => {
            let chunks: Vec<&str> = digits
                .as_bytes()
                .chunks(4)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .collect();
            return Some(chunks.join(" "));
        }
    };

    let mut blocks = Vec::with_capacity(layout.len());
    let mut start = 0;
    for width in layout {
        blocks.push(&digits[start..start + width]);
        start += width;
    }
    Some(blocks.join(" "))
}

/// (series block, variant block) of a canonical code: its 2nd and 3rd groups.
pub fn code_blocks(canonical: &str) -> Option<(String, String)> {
    let mut parts = canonical.split(' ');
    parts.next()?;
    let series = parts.next()?;
    let variant = parts.next()?;
    Some((series.to_string(), variant.to_string()))
}

/// One line of page text with its byte offset.
#[derive(Debug, Clone, Copy)]
pub struct PageLine<'a> {
    pub index: usize,
    pub offset: usize,
    pub text: &'a str,
}

/// Page text split into lines, keeping character positions for proximity
/// searches.
#[derive(Debug, Clone)]
pub struct PageLines<'a> {
    text: &'a str,
    lines: Vec<PageLine<'a>>,
}

impl<'a> PageLines<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for (index, raw) in text.split('\n').enumerate() {
            lines.push(PageLine {
                index,
                offset,
                text: raw.trim_end_matches('\r'),
            });
            offset += raw.len() + 1;
        }
        Self { text, lines }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn lines(&self) -> &[PageLine<'a>] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&PageLine<'a>> {
        self.lines.get(index)
    }

    /// Index of the line containing byte `offset`.
    pub fn line_at(&self, offset: usize) -> usize {
        match self.lines.binary_search_by(|line| line.offset.cmp(&offset)) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}

/// Numbers of a line made only of whitespace-separated small integers.
pub fn digit_sequence(line: &str) -> Option<Vec<u32>> {
    let mut numbers = Vec::new();
    for token in line.split_whitespace() {
        if token.len() > 3 || !token.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        numbers.push(token.parse().ok()?);
    }
    if numbers.is_empty() {
        None
    } else {
        Some(numbers)
    }
}

/// A plausible contact count, or nothing.
pub fn as_contact_count(value: u32, max: u8) -> Option<u8> {
    u8::try_from(value).ok().filter(|&n| n >= 1 && n <= max)
}
