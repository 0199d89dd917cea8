//! Joins variant rows, resolved contact counts, matrix values and page-level
//! specs into product records.

use crate::extract::scalar::{ReferenceFields, ScalarParsers, SingleProductFields};
use crate::extract::{ContactValueMap, VariantRow};
use crate::model::{AppliesTo, Product, Spec};
use crate::normalize::Normalizer;

pub const STRATEGY_CATALOG: &str = "catalog_variant_table";
pub const STRATEGY_SINGLE_PRODUCT: &str = "single_product_text";
pub const STRATEGY_REFERENCE: &str = "reference_sheet_text";
pub const STRATEGY_PLACEHOLDER: &str = "placeholder_per_document";

/// Everything a row needs from its page.
pub struct PageContext<'a> {
    pub page_number: u32,
    pub text: &'a str,
    pub values: &'a ContactValueMap,
    pub shared_specs: &'a [Spec],
}

pub struct ProductAssembler<'a> {
    normalizer: &'a Normalizer,
    scalar: &'a ScalarParsers,
    source_document: &'a str,
    document_text: &'a str,
}

impl<'a> ProductAssembler<'a> {
    pub fn new(
        normalizer: &'a Normalizer,
        scalar: &'a ScalarParsers,
        source_document: &'a str,
        document_text: &'a str,
    ) -> Self {
        Self {
            normalizer,
            scalar,
            source_document,
            document_text,
        }
    }

    /// IP ratings, temperature bounds and coding stated anywhere on the page.
    pub fn page_shared_specs(&self, page_text: &str) -> Vec<Spec> {
        let mut specs: Vec<Spec> = self
            .normalizer
            .extract_ip_codes(page_text)
            .into_iter()
            .map(|ip| Spec::text("ip_rating", ip.label(), None, ip.code))
            .collect();

        let bounds = self.normalizer.temperature_bounds(page_text);
        if let Some(lower) = bounds.lower {
            specs.push(Spec::numeric("temp_min_c", lower, Some("°C"), format!("{} °C", lower)));
        }
        if let Some(upper) = bounds.upper {
            specs.push(Spec::numeric("temp_max_c", upper, Some("°C"), format!("{} °C", upper)));
        }

        if let Some(coding) = self.scalar.coding(page_text) {
            specs.push(Spec::text("coding", coding.clone(), None, coding));
        }
        specs
    }

    fn cable_outlet_specs(&self, outlet: &str) -> Vec<Spec> {
        match self.normalizer.parse_mm_range(outlet) {
            (Some(min), Some(max)) => vec![
                Spec::numeric("cable_outlet_min_mm", min, Some("mm"), outlet),
                Spec::numeric("cable_outlet_max_mm", max, Some("mm"), outlet),
            ],
            _ => match self.normalizer.parse_mm_value(outlet) {
                Some(mm) => vec![Spec::numeric("cable_outlet_mm", mm, Some("mm"), outlet)],
                None => vec![Spec::text("cable_outlet", outlet.trim(), None, outlet)],
            },
        }
    }

    pub fn assemble_row(&self, row: &VariantRow, page: &PageContext<'_>) -> Product {
        let mut specs = Vec::new();

        if let Some(outlet) = &row.cable_outlet {
            specs.extend(self.cable_outlet_specs(outlet));
        }

        if let Some(contacts) = row.contacts {
            specs.push(Spec::numeric("contacts", f64::from(contacts), None, contacts.to_string()));
            if let Some(values) = page.values.values_for(contacts) {
                for (key, raw) in values {
                    specs.extend(
                        self.normalizer
                            .specs_from_raw(key, raw, Some(AppliesTo::Contacts(contacts))),
                    );
                }
            }
        }

        for (key, raw) in page.values.shared() {
            specs.extend(self.normalizer.specs_from_raw(key, raw, None));
        }
        specs.extend(page.shared_specs.iter().cloned());

        specs.extend(self.scalar.nearest_cable_length(page.text, row.code_offset));

        let family = self
            .scalar
            .nearest_series(page.text, row.code_offset)
            .or_else(|| self.scalar.first_series(self.document_text));

        let mut builder = Product::builder(STRATEGY_CATALOG)
            .family(family)
            .article_number(self.scalar.nearest_article_number(page.text, row.code_offset))
            .ordering_code(Some(row.ordering_code.clone()))
            .product_name("Cable connector (variant)")
            .source_document(self.source_document)
            .pages(vec![page.page_number])
            .note(format!("page {}", page.page_number))
            .note(format!("row strategy: {}", row.strategy.as_str()));
        if let Some(source) = row.contact_source {
            builder = builder.note(format!("contacts: {}", source.as_str()));
        }
        builder.specs(specs).build()
    }

    /// A catalog that yielded no ordering codes at all.
    pub fn catalog_fallback(&self, pages: Vec<u32>) -> Product {
        Product::builder(STRATEGY_CATALOG)
            .family(self.scalar.first_series(self.document_text))
            .product_name("Connector catalog (fallback)")
            .description(Some("No ordering codes found".to_string()))
            .source_document(self.source_document)
            .pages(pages)
            .note("no codes found")
            .build()
    }

    pub fn single_product(&self, fields: SingleProductFields, pages: Vec<u32>) -> Product {
        let name = fields
            .product_name
            .unwrap_or_else(|| document_stem(self.source_document));
        Product::builder(STRATEGY_SINGLE_PRODUCT)
            .brand(fields.brand)
            .family(fields.family)
            .model_no(fields.model_no)
            .product_name(name)
            .interfaces(fields.interfaces)
            .source_document(self.source_document)
            .pages(pages)
            .note("scalar patterns over the full document")
            .specs(fields.specs)
            .build()
    }

    pub fn reference(&self, fields: ReferenceFields, pages: Vec<u32>) -> Product {
        let empty = fields.specs.is_empty();
        let (name, description, note) = if empty {
            (
                "General Technical Information (empty)",
                "No reference specs were parsed from this document",
                "no matches found",
            )
        } else {
            (
                "General Technical Information",
                "Extracted normalization reference values",
                "reference lookup data",
            )
        };
        Product::builder(STRATEGY_REFERENCE)
            .family(Some("Reference Data".to_string()))
            .product_name(name)
            .description(Some(description.to_string()))
            .source_document(self.source_document)
            .pages(pages)
            .note(note)
            .specs(fields.specs)
            .build()
    }

    pub fn placeholder(&self) -> Product {
        Product::builder(STRATEGY_PLACEHOLDER)
            .product_name(document_stem(self.source_document))
            .source_document(self.source_document)
            .pages(vec![1])
            .build()
    }
}

/// File name without its extension.
pub fn document_stem(name: &str) -> String {
    std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
