//! Bilingual label/value matrix shared by the variants of a page.
//!
//! Layout: a contact-count header row, a run of "deutsch / English" label
//! lines, then the same number of value lines. Each value line is split into
//! tokens and spread over the contact columns.

use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

use super::{as_contact_count, ORDERING_CODE_PATTERN};
use crate::config::LayoutOverride;
use crate::error::SpecResult;
use crate::normalize::Normalizer;

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub label: String,
    pub key: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecMatrix {
    /// Contact-count columns; empty for a header-less shared block.
    pub columns: Vec<u8>,
    pub rows: Vec<MatrixRow>,
}

impl SpecMatrix {
    pub fn is_shared(&self) -> bool {
        self.columns.is_empty()
    }
}

/// contact count → ordered (key, raw value) pairs, plus the page-wide shared
/// pairs. Lives for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactValueMap {
    columns: Vec<u8>,
    per_contact: BTreeMap<u8, Vec<(String, String)>>,
    shared: Vec<(String, String)>,
}

impl ContactValueMap {
    pub fn columns(&self) -> &[u8] {
        &self.columns
    }

    pub fn has_contact_columns(&self) -> bool {
        !self.per_contact.is_empty()
    }

    pub fn values_for(&self, contacts: u8) -> Option<&[(String, String)]> {
        self.per_contact.get(&contacts).map(Vec::as_slice)
    }

    pub fn shared(&self) -> &[(String, String)] {
        &self.shared
    }

    pub fn is_empty(&self) -> bool {
        self.per_contact.is_empty() && self.shared.is_empty()
    }

    fn push(&mut self, contacts: u8, key: &str, raw: &str) {
        self.per_contact
            .entry(contacts)
            .or_default()
            .push((key.to_string(), raw.to_string()));
    }
}

/// Split `columns` into `tokens` contiguous groups; earlier groups absorb
/// the remainder. Expects `0 < tokens <= columns`.
pub fn distribute_groups(columns: usize, tokens: usize) -> Vec<usize> {
    if tokens == 0 {
        return Vec::new();
    }
    let base = columns / tokens;
    let remainder = columns % tokens;
    (0..tokens).map(|i| base + usize::from(i < remainder)).collect()
}

pub struct MatrixExtractor {
    header: Regex,
    shared_anchor: Regex,
    label: Regex,
    ordering_code: Regex,
    overrides: Vec<LayoutOverride>,
    max_contact_count: u8,
}

impl MatrixExtractor {
    pub fn new(overrides: Vec<LayoutOverride>, max_contact_count: u8) -> SpecResult<Self> {
        Ok(Self {
            header: Regex::new(
                r"(?i)^\s*(?:polzahl\s*/\s*(?:number\s+of\s+)?contacts|kontakte\s*/\s*contacts)\s+((?:\d{1,2}\s+)*\d{1,2})\s*$",
            )?,
            shared_anchor: Regex::new(r"(?i)technische\s+daten\s*/\s*technical\s+data")?,
            label: Regex::new(r"^\s*(?P<de>[^/]+?)\s*/\s*(?P<en>[A-Z][a-z][^/]*?)\s*$")?,
            ordering_code: Regex::new(ORDERING_CODE_PATTERN)?,
            overrides,
            max_contact_count,
        })
    }

    /// Locate the matrix on a page; `None` when there is neither a contact
    /// header nor a technical-data block.
    pub fn extract(&self, page_text: &str, normalizer: &Normalizer) -> Option<SpecMatrix> {
        let lines: Vec<&str> = page_text.lines().collect();

        let (columns, body_start) = match lines.iter().enumerate().find_map(|(i, line)| {
            let caps = self.header.captures(line)?;
            let columns: Vec<u8> = caps[1]
                .split_whitespace()
                .filter_map(|n| n.parse::<u32>().ok())
                .filter_map(|n| as_contact_count(n, self.max_contact_count))
                .collect();
            // a header of implausible counts is no header
            (!columns.is_empty()).then_some((columns, i + 1))
        }) {
            Some(found) => found,
            None => {
                let anchor = lines.iter().position(|line| self.shared_anchor.is_match(line))?;
                (Vec::new(), anchor + 1)
            }
        };

        let mut cursor = body_start;
        let mut labels: Vec<(String, String)> = Vec::new();
        while let Some(line) = lines.get(cursor) {
            if line.trim().is_empty() {
                cursor += 1;
                continue;
            }
            match self.label.captures(line) {
                Some(caps) => labels.push((line.trim().to_string(), caps["en"].trim().to_string())),
                None => break,
            }
            cursor += 1;
        }
        if labels.is_empty() {
            return Some(SpecMatrix {
                columns,
                rows: Vec::new(),
            });
        }

        let mut values: Vec<&str> = Vec::new();
        for line in lines.iter().skip(cursor) {
            let value = line.trim();
            if value.is_empty() {
                continue;
            }
            if values.is_empty() && self.is_noise(value) {
                continue;
            }
            values.push(value);
            if values.len() == labels.len() {
                break;
            }
        }

        let rows: Vec<MatrixRow> = labels
            .into_iter()
            .zip(values)
            .map(|((label, english), raw)| MatrixRow {
                key: normalizer.canonical_key(&english),
                label,
                raw: raw.to_string(),
            })
            .collect();

        debug!("Spec matrix: {} columns, {} rows", columns.len(), rows.len());
        Some(SpecMatrix { columns, rows })
    }

    /// Ordering codes or a lone short alphanumeric token with a letter.
    fn is_noise(&self, line: &str) -> bool {
        if self.ordering_code.replace_all(line, "").trim().is_empty() {
            return true;
        }
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(token), None) => {
                token.chars().count() <= 3
                    && token.chars().all(char::is_alphanumeric)
                    && token.chars().any(char::is_alphabetic)
            }
            _ => false,
        }
    }

    fn override_groups(&self, columns: &[u8], key: &str, tokens: usize) -> Option<&[usize]> {
        self.overrides
            .iter()
            .find(|rule| rule.columns == columns && key.starts_with(&rule.key_prefix) && rule.token_count == tokens)
            .map(|rule| rule.groups.as_slice())
    }

    /// Spread every row's values over the contact columns.
    pub fn distribute(&self, matrix: &SpecMatrix, normalizer: &Normalizer) -> ContactValueMap {
        let mut map = ContactValueMap {
            columns: matrix.columns.clone(),
            ..ContactValueMap::default()
        };

        for row in &matrix.rows {
            if matrix.is_shared() {
                map.shared.push((row.key.clone(), row.raw.clone()));
                continue;
            }

            let columns = &matrix.columns;
            if normalizer.temperature_range(&row.raw).is_some() {
                for &contacts in columns {
                    map.push(contacts, &row.key, &row.raw);
                }
                continue;
            }

            let tokens = normalizer.value_tokens(&crate::normalize::resolve_bilingual(&row.raw));
            let (n, c) = (tokens.len(), columns.len());

            let groups: Vec<usize> = if n == c && n > 1 {
                vec![1; n]
            } else if let Some(groups) = self.override_groups(columns, &row.key, n) {
                groups.to_vec()
            } else if n > 1 && n < c {
                distribute_groups(c, n)
            } else if n > c {
                vec![1; c]
            } else {
                // zero or one token: same value for every column
                let value = tokens.first().map_or(row.raw.as_str(), |t| t.text.as_str());
                for &contacts in columns {
                    map.push(contacts, &row.key, value);
                }
                continue;
            };

            let mut column_iter = columns.iter();
            for (token, size) in tokens.iter().zip(groups) {
                for &contacts in column_iter.by_ref().take(size) {
                    map.push(contacts, &row.key, &token.text);
                }
            }
        }
        map
    }
}
