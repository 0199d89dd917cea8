use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{SpecError, SpecResult};
use crate::model::Product;

/// Serializes product records for the persistence layer.
pub struct ProductExporter<'a> {
    products: &'a [Product],
}

impl<'a> ProductExporter<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    /// One JSON object per line.
    pub fn write_jsonl<W: Write>(&self, writer: W) -> SpecResult<usize> {
        let mut writer = BufWriter::new(writer);
        for product in self.products {
            serde_json::to_writer(&mut writer, product)?;
            writer
                .write_all(b"\n")
                .map_err(|e| SpecError::file_io("<jsonl writer>", e))?;
        }
        writer.flush().map_err(|e| SpecError::file_io("<jsonl writer>", e))?;
        Ok(self.products.len())
    }

    /// Export products to a JSON Lines file
    pub fn export_to_jsonl(&self, output_path: &Path) -> SpecResult<()> {
        info!("Exporting to JSONL: {:?}", output_path);

        let file = std::fs::File::create(output_path)
            .map_err(|e| SpecError::file_io(output_path.display().to_string(), e))?;
        let count = self.write_jsonl(file)?;

        info!("JSONL export completed: {} products", count);
        Ok(())
    }

    /// Export products to a pretty-printed JSON array
    pub fn export_to_json(&self, output_path: &Path) -> SpecResult<()> {
        info!("Exporting to JSON: {:?}", output_path);

        let content = serde_json::to_string_pretty(self.products)?;
        std::fs::write(output_path, content)
            .map_err(|e| SpecError::file_io(output_path.display().to_string(), e))?;

        info!("JSON export completed: {} products", self.products.len());
        Ok(())
    }

    pub fn stats(&self) -> ExportStats {
        let mut documents: Vec<&str> = self.products.iter().filter_map(|p| p.source_document()).collect();
        documents.sort_unstable();
        documents.dedup();

        ExportStats {
            product_count: self.products.len(),
            spec_count: self.products.iter().map(|p| p.specs().len()).sum(),
            unique_documents: documents.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub product_count: usize,
    pub spec_count: usize,
    pub unique_documents: usize,
}
