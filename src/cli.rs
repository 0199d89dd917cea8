use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::export::ProductExporter;
use crate::pipeline::Pipeline;

/// Process every datasheet in a directory
pub fn process_command(
    pipeline: &Pipeline,
    dir: PathBuf,
    jsonl: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    info!("📂 Processing datasheets in {:?}", dir);

    let products = pipeline
        .extract_products(&dir)
        .with_context(|| format!("Failed to process {:?}", dir))?;
    let exporter = ProductExporter::new(&products);

    if let Some(path) = &json {
        exporter.export_to_json(path)?;
    }
    match &jsonl {
        Some(path) => exporter.export_to_jsonl(path)?,
        None if json.is_none() => {
            let stdout = std::io::stdout();
            exporter.write_jsonl(stdout.lock())?;
        }
        None => {}
    }

    let stats = exporter.stats();
    eprintln!(
        "✅ {} products ({} specs) from {} documents",
        stats.product_count, stats.spec_count, stats.unique_documents
    );
    Ok(())
}

/// Classify one document and show the score breakdown
pub fn classify_command(pipeline: &Pipeline, file: PathBuf) -> Result<()> {
    if !file.exists() {
        return Err(anyhow::anyhow!("Document not found: {:?}", file));
    }

    let (kind, scores) = pipeline.classify_path(&file);
    info!("🔍 {:?} → {}", file, kind);

    let report = serde_json::json!({
        "file": file.display().to_string(),
        "kind": kind,
        "scores": scores,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Run the catalog extractors on one page and print what they found
pub fn inspect_command(pipeline: &Pipeline, file: PathBuf, page: u32) -> Result<()> {
    if !file.exists() {
        return Err(anyhow::anyhow!("Document not found: {:?}", file));
    }

    let report = pipeline
        .inspect_page(&file, page)
        .with_context(|| format!("Failed to inspect page {} of {:?}", page, file))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
