//! Product and spec records handed to the persistence layer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Closed set of document kinds the classifier can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Connector catalog with per-page ordering tables and a shared matrix
    Catalog,
    /// One product described by free text
    SingleProduct,
    /// Bilingual reference / lookup tables
    ReferenceSheet,
    Unrecognized,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Catalog => "catalog",
            DocumentKind::SingleProduct => "single_product",
            DocumentKind::ReferenceSheet => "reference_sheet",
            DocumentKind::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualifier restricting a spec to one variant of a shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    Contacts(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub spec_key: String,
    pub spec_value_num: Option<f64>,
    pub spec_value_text: Option<String>,
    pub unit: Option<String>,
    pub raw: String,
    pub applies_to: Option<AppliesTo>,
}

impl Spec {
    pub fn numeric(key: impl Into<String>, value: f64, unit: Option<&str>, raw: impl Into<String>) -> Self {
        Self {
            spec_key: key.into(),
            spec_value_num: Some(value),
            spec_value_text: None,
            unit: unit.map(str::to_string),
            raw: raw.into(),
            applies_to: None,
        }
    }

    pub fn text(key: impl Into<String>, value: impl Into<String>, unit: Option<&str>, raw: impl Into<String>) -> Self {
        Self {
            spec_key: key.into(),
            spec_value_num: None,
            spec_value_text: Some(value.into()),
            unit: unit.map(str::to_string),
            raw: raw.into(),
            applies_to: None,
        }
    }

    pub fn applying_to(mut self, applies_to: Option<AppliesTo>) -> Self {
        self.applies_to = applies_to;
        self
    }

    /// Identity used for deduplication: (key, numeric value, textual value).
    pub fn signature(&self) -> (String, Option<u64>, Option<String>) {
        (
            self.spec_key.clone(),
            self.spec_value_num.map(f64::to_bits),
            self.spec_value_text.clone(),
        )
    }
}

/// Collapse specs sharing a signature, keeping the first occurrence.
pub fn dedup_specs(specs: Vec<Spec>) -> Vec<Spec> {
    let mut seen = HashSet::new();
    specs
        .into_iter()
        .filter(|spec| seen.insert(spec.signature()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub strategy: String,
    pub notes: Vec<String>,
}

/// One canonical product record. Immutable once built; see [`ProductBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    brand: Option<String>,
    family: Option<String>,
    model_no: Option<String>,
    article_number: Option<String>,
    ordering_code: Option<String>,
    product_name: Option<String>,
    description: Option<String>,
    interfaces: Vec<String>,
    source_document: Option<String>,
    pages_covered: Vec<u32>,
    provenance: Provenance,
    specs: Vec<Spec>,
}

impl Product {
    pub fn builder(strategy: impl Into<String>) -> ProductBuilder {
        ProductBuilder::new(strategy)
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn model_no(&self) -> Option<&str> {
        self.model_no.as_deref()
    }

    pub fn article_number(&self) -> Option<&str> {
        self.article_number.as_deref()
    }

    pub fn ordering_code(&self) -> Option<&str> {
        self.ordering_code.as_deref()
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn source_document(&self) -> Option<&str> {
        self.source_document.as_deref()
    }

    pub fn pages_covered(&self) -> &[u32] {
        &self.pages_covered
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn specs(&self) -> &[Spec] {
        &self.specs
    }

    /// All specs with the given key, in order.
    pub fn specs_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Spec> + 'a {
        self.specs.iter().filter(move |s| s.spec_key == key)
    }

    /// First numeric value recorded under `key`.
    pub fn numeric_spec(&self, key: &str) -> Option<f64> {
        self.specs_for(key).find_map(|s| s.spec_value_num)
    }
}

/// Consuming builder; [`ProductBuilder::build`] deduplicates specs exactly once.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    brand: Option<String>,
    family: Option<String>,
    model_no: Option<String>,
    article_number: Option<String>,
    ordering_code: Option<String>,
    product_name: Option<String>,
    description: Option<String>,
    interfaces: Vec<String>,
    source_document: Option<String>,
    pages_covered: Vec<u32>,
    provenance: Provenance,
    specs: Vec<Spec>,
}

impl ProductBuilder {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            brand: None,
            family: None,
            model_no: None,
            article_number: None,
            ordering_code: None,
            product_name: None,
            description: None,
            interfaces: Vec::new(),
            source_document: None,
            pages_covered: Vec::new(),
            provenance: Provenance {
                strategy: strategy.into(),
                notes: Vec::new(),
            },
            specs: Vec::new(),
        }
    }

    pub fn brand(mut self, brand: Option<String>) -> Self {
        self.brand = brand;
        self
    }

    pub fn family(mut self, family: Option<String>) -> Self {
        self.family = family;
        self
    }

    pub fn model_no(mut self, model_no: Option<String>) -> Self {
        self.model_no = model_no;
        self
    }

    pub fn article_number(mut self, article_number: Option<String>) -> Self {
        self.article_number = article_number;
        self
    }

    pub fn ordering_code(mut self, ordering_code: Option<String>) -> Self {
        self.ordering_code = ordering_code;
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn interfaces(mut self, interfaces: Vec<String>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn source_document(mut self, source: impl Into<String>) -> Self {
        self.source_document = Some(source.into());
        self
    }

    pub fn pages(mut self, pages: Vec<u32>) -> Self {
        self.pages_covered = pages;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.provenance.notes.push(note.into());
        self
    }

    pub fn spec(mut self, spec: Spec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(mut self, specs: impl IntoIterator<Item = Spec>) -> Self {
        self.specs.extend(specs);
        self
    }

    pub fn build(self) -> Product {
        Product {
            brand: self.brand,
            family: self.family,
            model_no: self.model_no,
            article_number: self.article_number,
            ordering_code: self.ordering_code,
            product_name: self.product_name,
            description: self.description,
            interfaces: self.interfaces,
            source_document: self.source_document,
            pages_covered: self.pages_covered,
            provenance: self.provenance,
            specs: dedup_specs(self.specs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_specs_collapse() {
        let product = Product::builder("test")
            .spec(Spec::numeric("rated_voltage_v", 250.0, Some("V"), "250 V"))
            .spec(Spec::numeric("rated_voltage_v", 250.0, Some("V"), "250V"))
            .spec(Spec::numeric("rated_voltage_v", 400.0, Some("V"), "400 V"))
            .build();

        assert_eq!(product.specs().len(), 2);
        assert_eq!(product.specs()[0].raw, "250 V");
        assert_eq!(product.specs()[1].spec_value_num, Some(400.0));
    }

    #[test]
    fn test_same_key_text_and_number_are_distinct() {
        let product = Product::builder("test")
            .spec(Spec::text("ip_rating", "IP67", None, "IP67"))
            .spec(Spec::text("ip_rating", "IP68", None, "IP68"))
            .spec(Spec::text("ip_rating", "IP67", None, "IP 67"))
            .build();

        let codes: Vec<_> = product
            .specs_for("ip_rating")
            .filter_map(|s| s.spec_value_text.as_deref())
            .collect();
        assert_eq!(codes, vec!["IP67", "IP68"]);
    }

    #[test]
    fn test_applies_to_serializes_as_object() {
        let spec = Spec::numeric("contacts", 4.0, None, "4").applying_to(Some(AppliesTo::Contacts(4)));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["applies_to"]["contacts"], 4);
    }
}
