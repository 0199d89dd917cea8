//! Keyword + density document classifier.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SpecResult;
use crate::extract::ORDERING_CODE_PATTERN;
use crate::model::DocumentKind;

/// Ordering-code density never contributes more than this.
const DENSITY_CAP: i64 = 100;
const FILENAME_BONUS: i64 = 5;

/// Keyword signals for one document kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindSignals {
    pub positives: Vec<String>,
    pub negatives: Vec<String>,
    pub filename_keywords: Vec<String>,
}

impl KindSignals {
    fn new(positives: &[&str], negatives: &[&str], filename_keywords: &[&str]) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            positives: owned(positives),
            negatives: owned(negatives),
            filename_keywords: owned(filename_keywords),
        }
    }

    /// +1 per positive phrase present, -1 per negative phrase present.
    fn keyword_score(&self, lowered_text: &str) -> i64 {
        let hits = |list: &[String]| list.iter().filter(|p| lowered_text.contains(&p.to_lowercase())).count() as i64;
        hits(&self.positives) - hits(&self.negatives)
    }

    fn filename_bonus(&self, lowered_name: &str) -> i64 {
        if self
            .filename_keywords
            .iter()
            .any(|k| lowered_name.contains(&k.to_lowercase()))
        {
            FILENAME_BONUS
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSignals {
    pub catalog: KindSignals,
    pub single_product: KindSignals,
    pub reference_sheet: KindSignals,
}

impl Default for ClassifierSignals {
    fn default() -> Self {
        let reference_terms = ["technische information", "technische informationen", "allgemeine hinweise"];
        let catalog_terms = ["serie 713", "serie 763", "ordering-no", "ordering code", "bestell-nr.", "m12"];

        Self {
            catalog: KindSignals::new(
                &[
                    "m12",
                    "sensorik",
                    "aktorik",
                    "serie 713",
                    "serie 763",
                    "ordering-no",
                    "ordering code",
                    "bestell-nr.",
                    "steckverbinder",
                    "kabelstecker",
                ],
                &reference_terms,
                &["serie_713_763", "m12"],
            ),
            single_product: KindSignals::new(
                &["binder", "cb-s", "co2", "co₂", "incubator", "model cb-s"],
                &[],
                &[],
            ),
            reference_sheet: KindSignals::new(
                &[
                    "technische information",
                    "technische informationen",
                    "allgemeine hinweise",
                    "awg",
                ],
                &catalog_terms,
                &["technische_infos", "technische_info"],
            ),
        }
    }
}

/// Per-kind scores, exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub catalog: i64,
    pub single_product: i64,
    pub reference_sheet: i64,
    pub ordering_codes: usize,
}

impl ScoreBreakdown {
    /// Highest score wins; ties go to the earlier kind in priority order.
    pub fn winner(&self) -> DocumentKind {
        let ranked = [
            (DocumentKind::Catalog, self.catalog),
            (DocumentKind::SingleProduct, self.single_product),
            (DocumentKind::ReferenceSheet, self.reference_sheet),
        ];
        let mut best = (DocumentKind::Unrecognized, 0);
        for (kind, score) in ranked {
            if score > best.1 {
                best = (kind, score);
            }
        }
        best.0
    }
}

pub struct Classifier {
    signals: ClassifierSignals,
    ordering_code: Regex,
}

impl Classifier {
    pub fn new(signals: ClassifierSignals) -> SpecResult<Self> {
        Ok(Self {
            signals,
            ordering_code: Regex::new(ORDERING_CODE_PATTERN)?,
        })
    }

    pub fn with_defaults() -> SpecResult<Self> {
        Self::new(ClassifierSignals::default())
    }

    pub fn classify(&self, text: &str, filename: &str) -> DocumentKind {
        self.scores(text, filename).winner()
    }

    pub fn count_ordering_codes(&self, text: &str) -> usize {
        self.ordering_code.find_iter(text).count()
    }

    pub fn scores(&self, text: &str, filename: &str) -> ScoreBreakdown {
        let lowered = text.to_lowercase();
        let name = filename.to_lowercase();
        let codes = self.count_ordering_codes(text);
        let density = (codes as i64).min(DENSITY_CAP);

        let s = &self.signals;
        ScoreBreakdown {
            catalog: s.catalog.keyword_score(&lowered) + density + s.catalog.filename_bonus(&name),
            single_product: s.single_product.keyword_score(&lowered) + s.single_product.filename_bonus(&name),
            reference_sheet: s.reference_sheet.keyword_score(&lowered) - density
                + s.reference_sheet.filename_bonus(&name),
            ordering_codes: codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::with_defaults().unwrap()
    }

    #[test]
    fn test_many_codes_make_a_catalog() {
        let text = "Kabelstecker\n99 0429 14 04\n99 0429 14 05\n99 0430 14 08\n99 1491 812 12";
        let c = classifier();
        assert_eq!(c.count_ordering_codes(text), 4);
        assert_eq!(c.classify(text, "datasheet.pdf"), DocumentKind::Catalog);
    }

    #[test]
    fn test_reference_keywords_without_codes() {
        let text = "Technische Informationen\nAllgemeine Hinweise\nAWG 24 = 0,205 mm²";
        assert_eq!(classifier().classify(text, "info.pdf"), DocumentKind::ReferenceSheet);
    }

    #[test]
    fn test_no_signal_is_unrecognized() {
        assert_eq!(classifier().classify("Lorem ipsum dolor sit amet", "x.pdf"), DocumentKind::Unrecognized);
        assert_eq!(classifier().classify("", ""), DocumentKind::Unrecognized);
    }

    #[test]
    fn test_single_product_sheet() {
        let text = "BINDER Model CB-S 260\nCO2 incubator with hot air sterilization";
        assert_eq!(classifier().classify(text, "cb_s_260.pdf"), DocumentKind::SingleProduct);
    }

    #[test]
    fn test_filename_bonus_and_density_cap() {
        let c = classifier();
        let plain = c.scores("nothing relevant", "serie_713_763.pdf");
        assert_eq!(plain.catalog, FILENAME_BONUS);

        let codes = "99 0429 14 04\n".repeat(150);
        let capped = c.scores(&codes, "a.pdf");
        assert_eq!(capped.ordering_codes, 150);
        assert_eq!(capped.catalog, DENSITY_CAP);
        assert_eq!(capped.reference_sheet, -DENSITY_CAP);
    }

    #[test]
    fn test_ties_follow_priority() {
        let breakdown = ScoreBreakdown {
            catalog: 2,
            single_product: 2,
            reference_sheet: 2,
            ordering_codes: 0,
        };
        assert_eq!(breakdown.winner(), DocumentKind::Catalog);

        let breakdown = ScoreBreakdown {
            catalog: 0,
            single_product: 1,
            reference_sheet: 1,
            ordering_codes: 0,
        };
        assert_eq!(breakdown.winner(), DocumentKind::SingleProduct);
    }
}
