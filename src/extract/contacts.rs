//! Contact-count resolution for rows whose own cell carried no definitive
//! count. Steps run in order and the first success wins.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::variant_table::{ContactSource, VariantRow};
use super::{as_contact_count, canonicalize_code, code_blocks, digit_sequence, PageLines, ORDERING_CODE_PATTERN};
use crate::error::SpecResult;

/// Counts observed on lines that pair a leading contact digit with a code.
#[derive(Debug, Clone, Default)]
pub struct LearnedMap {
    exact: HashMap<(String, String), BTreeMap<u8, usize>>,
    by_series: HashMap<String, BTreeMap<u8, usize>>,
}

impl LearnedMap {
    pub fn record(&mut self, canonical_code: &str, contacts: u8) {
        let Some((series, variant)) = code_blocks(canonical_code) else {
            return;
        };
        *self
            .exact
            .entry((series.clone(), variant))
            .or_default()
            .entry(contacts)
            .or_default() += 1;
        *self.by_series.entry(series).or_default().entry(contacts).or_default() += 1;
    }

    /// Exact (series, variant) match, else the series' most frequent count.
    pub fn lookup(&self, canonical_code: &str) -> Option<u8> {
        let (series, variant) = code_blocks(canonical_code)?;
        self.exact
            .get(&(series.clone(), variant))
            .and_then(most_frequent)
            .or_else(|| self.by_series.get(&series).and_then(most_frequent))
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Highest frequency; ties go to the smallest count.
fn most_frequent(counts: &BTreeMap<u8, usize>) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for (&contacts, &freq) in counts {
        if best.map_or(true, |(_, f)| freq > f) {
            best = Some((contacts, freq));
        }
    }
    best.map(|(contacts, _)| contacts)
}

fn followed_by_length_unit(rest: &str) -> bool {
    rest.split_whitespace()
        .next()
        .map(|word| {
            let word = word.to_lowercase();
            word.starts_with("mm") || word == "m"
        })
        .unwrap_or(false)
}

struct Anchor {
    offset: usize,
    numbers: Vec<u8>,
}

pub struct ContactResolver {
    ordering_code: Regex,
    learned_line: Regex,
    max_contact_count: u8,
    window: usize,
}

impl ContactResolver {
    pub fn new(max_contact_count: u8, window: usize) -> SpecResult<Self> {
        Ok(Self {
            ordering_code: Regex::new(ORDERING_CODE_PATTERN)?,
            learned_line: Regex::new(&format!(r"^\s*(\d{{1,2}})\s+\D*?({})", ORDERING_CODE_PATTERN))?,
            max_contact_count,
            window,
        })
    }

    pub fn learn(&self, page: &PageLines<'_>) -> LearnedMap {
        let mut map = LearnedMap::default();
        for line in page.lines() {
            let Some(caps) = self.learned_line.captures(line.text) else { continue };
            if followed_by_length_unit(&line.text[caps.get(1).map_or(0, |m| m.end())..]) {
                // "8 mm 99 0430 14 08" is an outlet size, not a contact count
                continue;
            }
            let count = caps[1]
                .parse::<u32>()
                .ok()
                .and_then(|n| as_contact_count(n, self.max_contact_count));
            if let (Some(count), Some(code)) = (count, canonicalize_code(&caps[2])) {
                map.record(&code, count);
            }
        }
        map
    }

    fn anchors(&self, page: &PageLines<'_>) -> Vec<Anchor> {
        page.lines()
            .iter()
            .filter_map(|line| {
                let numbers: Vec<u8> = digit_sequence(line.text)?
                    .into_iter()
                    .filter_map(|n| as_contact_count(n, self.max_contact_count))
                    .collect();
                (!numbers.is_empty()).then_some(Anchor {
                    offset: line.offset,
                    numbers,
                })
            })
            .collect()
    }

    /// Fill in `contacts` on every row that lacks a definitive count.
    /// `columns` are the matrix header counts used for round-robin.
    pub fn resolve(&self, page_text: &str, rows: &mut [VariantRow], columns: &[u8]) {
        let page = PageLines::new(page_text);
        let anchors = self.anchors(&page);
        let learned = self.learn(&page);
        let mut round_robin = columns
            .iter()
            .copied()
            .filter(|&c| c >= 1 && c <= self.max_contact_count)
            .collect::<Vec<_>>()
            .into_iter()
            .cycle();

        for row in rows.iter_mut().filter(|r| !r.is_definitive()) {
            let resolved = self
                .from_inline(row)
                .map(|n| (n, ContactSource::Inline))
                .or_else(|| self.from_next_line(&page, row).map(|n| (n, ContactSource::NextLine)))
                .or_else(|| self.from_anchor(page_text, &anchors, row).map(|n| (n, ContactSource::Anchor)))
                .or_else(|| learned.lookup(&row.ordering_code).map(|n| (n, ContactSource::Learned)));

            match resolved {
                Some((contacts, source)) => row.set_contacts(contacts, source),
                None if row.contacts.is_some() => {
                    // provisional value stands
                }
                None => {
                    if let Some(contacts) = round_robin.next() {
                        row.set_contacts(contacts, ContactSource::RoundRobin);
                    }
                }
            }
            debug!(
                "Contacts for {}: {:?} via {:?}",
                row.ordering_code, row.contacts, row.contact_source
            );
        }
    }

    /// Only a single count, or one count per pair on the line, is trusted.
    fn from_inline(&self, row: &VariantRow) -> Option<u8> {
        match row.inline_counts.as_slice() {
            [] => None,
            [only] => Some(*only),
            counts if counts.len() == row.line_pairs => counts.get(row.pair_index).copied(),
            _ => None,
        }
    }

    fn from_next_line(&self, page: &PageLines<'_>, row: &VariantRow) -> Option<u8> {
        let next = page.get(row.line_index + 1)?;
        let numbers: Vec<u8> = digit_sequence(next.text)?
            .into_iter()
            .filter_map(|n| as_contact_count(n, self.max_contact_count))
            .collect();
        match numbers.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => numbers.get(row.pair_index).or(numbers.first()).copied(),
        }
    }

    fn from_anchor(&self, page_text: &str, anchors: &[Anchor], row: &VariantRow) -> Option<u8> {
        let anchor = anchors
            .iter()
            .min_by_key(|a| a.offset.abs_diff(row.code_offset))?;
        if let [only] = anchor.numbers.as_slice() {
            return Some(*only);
        }

        let start = anchor.offset.saturating_sub(self.window);
        let end = (anchor.offset + self.window).min(page_text.len());
        let nearby: Vec<String> = self
            .ordering_code
            .find_iter(page_text)
            .filter(|m| m.start() >= start && m.start() <= end)
            .filter_map(|m| canonicalize_code(m.as_str()))
            .collect();

        nearby
            .iter()
            .position(|code| *code == row.ordering_code)
            .and_then(|i| anchor.numbers.get(i))
            .or(anchor.numbers.first())
            .copied()
    }
}
