//! Per-page ordering table: contact count, cable outlet, ordering code.
//!
//! The grid strategy reads a cell grid positionally under a recognized header
//! row. The line strategy always runs afterwards and contributes every code
//! the grid did not produce.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::{as_contact_count, canonicalize_code, digit_sequence, PageLines, ORDERING_CODE_PATTERN};
use crate::error::SpecResult;
use crate::provider::Grid;

/// Where a row's contact count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    /// Contact column of a cell grid
    Grid,
    /// Leading number(s) on the pair line itself
    Inline,
    /// Digit header line zipped 1:1 with the pairs
    HeaderZip,
    /// Single digit header applied to every pair
    HeaderBroadcast,
    /// First of several header numbers; awaiting resolution
    Provisional,
    NextLine,
    Anchor,
    Learned,
    RoundRobin,
}

impl ContactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSource::Grid => "grid",
            ContactSource::Inline => "inline",
            ContactSource::HeaderZip => "header_zip",
            ContactSource::HeaderBroadcast => "header_broadcast",
            ContactSource::Provisional => "provisional",
            ContactSource::NextLine => "next_line",
            ContactSource::Anchor => "anchor",
            ContactSource::Learned => "learned",
            ContactSource::RoundRobin => "round_robin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStrategy {
    Grid,
    Line,
}

impl RowStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStrategy::Grid => "grid",
            RowStrategy::Line => "line",
        }
    }
}

/// One ordering-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRow {
    pub contacts: Option<u8>,
    pub contact_source: Option<ContactSource>,
    pub inline_counts: Vec<u8>,
    pub cable_outlet: Option<String>,
    pub ordering_code: String,
    pub raw_code: String,
    pub line_index: usize,
    pub pair_index: usize,
    /// Pairs sharing this row's line; inline counts only apply 1:1
    pub line_pairs: usize,
    pub code_offset: usize,
    pub strategy: RowStrategy,
}

impl VariantRow {
    pub fn builder(ordering_code: impl Into<String>, strategy: RowStrategy) -> VariantRowBuilder {
        VariantRowBuilder::new(ordering_code, strategy)
    }

    /// Has a count that no later step may replace.
    pub fn is_definitive(&self) -> bool {
        self.contacts.is_some() && self.contact_source != Some(ContactSource::Provisional)
    }

    pub fn set_contacts(&mut self, contacts: u8, source: ContactSource) {
        self.contacts = Some(contacts);
        self.contact_source = Some(source);
    }
}

pub struct VariantRowBuilder {
    row: VariantRow,
}

impl VariantRowBuilder {
    pub fn new(ordering_code: impl Into<String>, strategy: RowStrategy) -> Self {
        let ordering_code = ordering_code.into();
        Self {
            row: VariantRow {
                contacts: None,
                contact_source: None,
                inline_counts: Vec::new(),
                cable_outlet: None,
                raw_code: ordering_code.clone(),
                ordering_code,
                line_index: 0,
                pair_index: 0,
                line_pairs: 1,
                code_offset: 0,
                strategy,
            },
        }
    }

    pub fn contacts(mut self, contacts: Option<u8>, source: ContactSource) -> Self {
        if contacts.is_some() {
            self.row.contacts = contacts;
            self.row.contact_source = Some(source);
        }
        self
    }

    pub fn inline_counts(mut self, counts: Vec<u8>) -> Self {
        self.row.inline_counts = counts;
        self
    }

    pub fn cable_outlet(mut self, outlet: Option<String>) -> Self {
        self.row.cable_outlet = outlet.filter(|o| !o.trim().is_empty());
        self
    }

    pub fn raw_code(mut self, raw: impl Into<String>) -> Self {
        self.row.raw_code = raw.into();
        self
    }

    pub fn position(mut self, line_index: usize, pair_index: usize, code_offset: usize) -> Self {
        self.row.line_index = line_index;
        self.row.pair_index = pair_index;
        self.row.code_offset = code_offset;
        self
    }

    pub fn line_pairs(mut self, pairs: usize) -> Self {
        self.row.line_pairs = pairs.max(1);
        self
    }

    pub fn build(self) -> VariantRow {
        self.row
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct HeaderColumns {
    contacts: Option<usize>,
    outlet: Option<usize>,
    ordering: usize,
}

pub struct VariantTableExtractor {
    ordering_code: Regex,
    pair: Regex,
    header_anchor: Regex,
    max_contact_count: u8,
}

impl VariantTableExtractor {
    pub fn new(max_contact_count: u8) -> SpecResult<Self> {
        let pair = format!(
            r"(?P<outlet>\d+(?:[.,]\d+)?(?:\s*[-–]\s*\d+(?:[.,]\d+)?)?)\s*mm\s+(?P<code>{})",
            ORDERING_CODE_PATTERN
        );
        Ok(Self {
            ordering_code: Regex::new(ORDERING_CODE_PATTERN)?,
            pair: Regex::new(&pair)?,
            header_anchor: Regex::new(r"(?i)bestell-?\s?nr|ordering[- ]?(?:no|code)")?,
            max_contact_count,
        })
    }

    /// Grid rows first, then line rows for codes the grid missed.
    pub fn extract(&self, page_text: &str, grid: Option<&Grid>) -> Vec<VariantRow> {
        let page = PageLines::new(page_text);
        let mut rows = grid.map(|g| self.from_grid(g, &page)).unwrap_or_default();
        let from_grid = rows.len();

        let mut seen: HashSet<String> = rows.iter().map(|r| r.ordering_code.clone()).collect();
        for row in self.from_lines(&page) {
            if seen.insert(row.ordering_code.clone()) {
                rows.push(row);
            }
        }

        debug!(
            "Variant table: {} rows ({} grid, {} line)",
            rows.len(),
            from_grid,
            rows.len() - from_grid
        );
        rows
    }

    fn header_columns(&self, cells: &[String]) -> Option<HeaderColumns> {
        let find = |needles: &[&str]| {
            cells.iter().position(|cell| {
                let lowered = cell.to_lowercase();
                needles.iter().any(|n| lowered.contains(n))
            })
        };
        let ordering = find(&["bestell", "ordering"])?;
        Some(HeaderColumns {
            contacts: find(&["polzahl", "kontakte", "contacts"]).filter(|&i| i != ordering),
            outlet: find(&["kabelauslass", "cable outlet", "outlet"]).filter(|&i| i != ordering),
            ordering,
        })
    }

    /// Positional reading under the most recent header row.
    pub fn from_grid(&self, grid: &Grid, page: &PageLines<'_>) -> Vec<VariantRow> {
        let mut rows = Vec::new();
        let mut header: Option<HeaderColumns> = None;
        let mut seen = HashSet::new();
        let mut search_from = 0;

        for cells in grid {
            if let Some(columns) = self.header_columns(cells) {
                header = Some(columns);
                continue;
            }
            let Some(columns) = header else { continue };
            let Some(code_cell) = cells.get(columns.ordering) else { continue };
            let Some(found) = self.ordering_code.find(code_cell) else { continue };
            let Some(canonical) = canonicalize_code(found.as_str()) else { continue };
            if !seen.insert(canonical.clone()) {
                continue;
            }

            let contacts = columns
                .contacts
                .and_then(|i| cells.get(i))
                .and_then(|cell| digit_sequence(cell))
                .and_then(|numbers| numbers.first().copied())
                .and_then(|n| as_contact_count(n, self.max_contact_count));
            let outlet = columns.outlet.and_then(|i| cells.get(i)).cloned();

            let offset = page.text()[search_from..]
                .find(found.as_str())
                .map(|pos| pos + search_from)
                .or_else(|| page.text().find(found.as_str()))
                .unwrap_or(0);
            search_from = offset;

            rows.push(
                VariantRow::builder(canonical, RowStrategy::Grid)
                    .raw_code(found.as_str())
                    .contacts(contacts, ContactSource::Grid)
                    .cable_outlet(outlet)
                    .position(page.line_at(offset), 0, offset)
                    .build(),
            );
        }
        rows
    }

    /// Line-oriented scan for "<dimension> mm <code>" pairs.
    pub fn from_lines(&self, page: &PageLines<'_>) -> Vec<VariantRow> {
        let lines = page.lines();
        let start = lines
            .iter()
            .position(|l| self.header_anchor.is_match(l.text))
            .unwrap_or(0);

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        let mut pending: Option<Vec<u8>> = None;

        for line in &lines[start..] {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }
            if self.header_anchor.is_match(text) {
                pending = None;
                continue;
            }
            if let Some(numbers) = digit_sequence(text) {
                let counts: Vec<u8> = numbers
                    .into_iter()
                    .filter_map(|n| as_contact_count(n, self.max_contact_count))
                    .collect();
                pending = if counts.is_empty() { None } else { Some(counts) };
                continue;
            }

            let pairs: Vec<_> = self.pair.captures_iter(line.text).collect();
            if pairs.is_empty() {
                // anything else ends the run a digit header applies to
                pending = None;
                continue;
            }

            let first_start = pairs[0].get(0).map_or(0, |m| m.start());
            let inline: Vec<u8> = digit_sequence(&line.text[..first_start])
                .unwrap_or_default()
                .into_iter()
                .filter_map(|n| as_contact_count(n, self.max_contact_count))
                .collect();

            let (counts, from_header) = if !inline.is_empty() {
                (inline.clone(), false)
            } else {
                (pending.clone().unwrap_or_default(), true)
            };

            for (pair_index, caps) in pairs.iter().enumerate() {
                let (Some(outlet), Some(code)) = (caps.name("outlet"), caps.name("code")) else {
                    continue;
                };
                let Some(canonical) = canonicalize_code(code.as_str()) else { continue };
                if !seen.insert(canonical.clone()) {
                    continue;
                }

                let (contacts, source) = assign_count(&counts, pairs.len(), pair_index, from_header);
                rows.push(
                    VariantRow::builder(canonical, RowStrategy::Line)
                        .raw_code(code.as_str())
                        .contacts(contacts, source)
                        .inline_counts(inline.clone())
                        .cable_outlet(Some(format!("{} mm", outlet.as_str().trim())))
                        .position(line.index, pair_index, line.offset + code.start())
                        .line_pairs(pairs.len())
                        .build(),
                );
            }
        }
        rows
    }
}

/// Direct, zip, broadcast or provisional-first assignment of counts to pairs.
fn assign_count(counts: &[u8], pair_count: usize, pair_index: usize, from_header: bool) -> (Option<u8>, ContactSource) {
    let direct = if from_header {
        ContactSource::HeaderBroadcast
    } else {
        ContactSource::Inline
    };
    let zipped = if from_header {
        ContactSource::HeaderZip
    } else {
        ContactSource::Inline
    };

    match counts {
        [] => (None, ContactSource::Provisional),
        [only] => (Some(*only), direct),
        _ if counts.len() == pair_count => (counts.get(pair_index).copied(), zipped),
        [first, ..] => (Some(*first), ContactSource::Provisional),
    }
}
