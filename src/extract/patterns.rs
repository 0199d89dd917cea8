//! Ordered (name, regex, handler) tables used by the scalar parsers.

use regex::{Captures, Regex};

use crate::error::SpecResult;

pub type Handler<T> = fn(&Captures<'_>, &mut T);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Handler sees the first match only
    First,
    /// Handler sees every match, in order
    All,
}

struct PatternEntry<T> {
    name: &'static str,
    regex: Regex,
    mode: MatchMode,
    handler: Handler<T>,
}

/// Patterns run in insertion order against the same text, each feeding its
/// captures into a shared target.
pub struct PatternTable<T> {
    entries: Vec<PatternEntry<T>>,
}

impl<T> Default for PatternTable<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> PatternTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, pattern: &str, mode: MatchMode, handler: Handler<T>) -> SpecResult<Self> {
        self.entries.push(PatternEntry {
            name,
            regex: Regex::new(pattern)?,
            mode,
            handler,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry; returns the names of entries that matched.
    pub fn apply(&self, text: &str, target: &mut T) -> Vec<&'static str> {
        let mut matched = Vec::new();
        for entry in &self.entries {
            let mut hit = false;
            match entry.mode {
                MatchMode::First => {
                    if let Some(caps) = entry.regex.captures(text) {
                        (entry.handler)(&caps, target);
                        hit = true;
                    }
                }
                MatchMode::All => {
                    for caps in entry.regex.captures_iter(text) {
                        (entry.handler)(&caps, target);
                        hit = true;
                    }
                }
            }
            if hit {
                tracing::trace!("pattern '{}' matched", entry.name);
                matched.push(entry.name);
            }
        }
        matched
    }
}
