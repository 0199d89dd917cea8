//! Document pipeline and batch entrypoint.
//!
//! One provider per document; pages strictly in order; nothing shared between
//! documents except the immutable tables held here.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::assemble::{PageContext, ProductAssembler};
use crate::classify::{Classifier, ClassifierSignals, ScoreBreakdown};
use crate::config::PipelineConfig;
use crate::error::{SpecError, SpecResult};
use crate::extract::{ContactResolver, ContactValueMap, MatrixExtractor, ScalarParsers, VariantTableExtractor};
use crate::logging::PerformanceTimer;
use crate::model::{DocumentKind, Product};
use crate::normalize::{Normalizer, NormalizerTables};
use crate::provider::{backend_from_config, open_isolated, PageProvider, TableBackend};
use crate::{log_document_start, log_error};

/// Per-page extraction summary, for the `inspect` command.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageReport {
    pub page_number: u32,
    pub grid_rows: usize,
    pub matrix_columns: Vec<u8>,
    pub matrix_rows: Vec<(String, String)>,
    pub products: Vec<Product>,
}

pub struct Pipeline {
    config: PipelineConfig,
    normalizer: Normalizer,
    classifier: Classifier,
    variants: VariantTableExtractor,
    matrix: MatrixExtractor,
    resolver: ContactResolver,
    scalar: ScalarParsers,
    backend: Arc<dyn TableBackend>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> SpecResult<Self> {
        Self::with_tables(config, NormalizerTables::default(), ClassifierSignals::default())
    }

    pub fn with_tables(
        config: PipelineConfig,
        tables: NormalizerTables,
        signals: ClassifierSignals,
    ) -> SpecResult<Self> {
        config.validate()?;
        let extraction = &config.extraction;
        let backend = backend_from_config(extraction);
        debug!("Table backend: {}", backend.name());
        Ok(Self {
            normalizer: Normalizer::new(tables)?,
            classifier: Classifier::new(signals)?,
            variants: VariantTableExtractor::new(extraction.max_contact_count)?,
            matrix: MatrixExtractor::new(config.matrix.overrides.clone(), extraction.max_contact_count)?,
            resolver: ContactResolver::new(extraction.max_contact_count, extraction.anchor_window)?,
            scalar: ScalarParsers::new(extraction.known_brands.clone())?,
            backend,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn backend(&self) -> Arc<dyn TableBackend> {
        Arc::clone(&self.backend)
    }

    /// Open a document; a provider failure degrades to an empty document.
    pub fn open(&self, path: &Path) -> Option<Box<dyn PageProvider>> {
        match open_isolated(path, self.backend()) {
            Ok(provider) => Some(provider),
            Err(e) => {
                log_error!(e, "open document");
                warn!("Treating {} as empty: {}", path.display(), e.user_message());
                None
            }
        }
    }

    pub fn classify_path(&self, path: &Path) -> (DocumentKind, ScoreBreakdown) {
        let name = file_name(path);
        let text = self.open(path).map(|p| p.full_text()).unwrap_or_default();
        let scores = self.classifier.scores(&text, &name);
        (scores.winner(), scores)
    }

    /// Never fails: problems become empty output or a placeholder.
    pub fn process_path(&self, path: &Path) -> Vec<Product> {
        let name = file_name(path);
        let _timer = PerformanceTimer::start(format!("document {}", name));
        match self.open(path) {
            Some(provider) => self.process_provider(provider.as_ref(), &name),
            None => self.unrecognized(&name, ""),
        }
    }

    pub fn process_provider(&self, provider: &dyn PageProvider, source_name: &str) -> Vec<Product> {
        log_document_start!(source_name, provider.page_count());
        let text = provider.full_text();
        let kind = if text.trim().is_empty() {
            DocumentKind::Unrecognized
        } else {
            self.classifier.classify(&text, source_name)
        };
        info!("{} classified as {}", source_name, kind);

        let all_pages: Vec<u32> = (1..=provider.page_count() as u32).collect();
        let assembler = ProductAssembler::new(&self.normalizer, &self.scalar, source_name, &text);

        let products = match kind {
            DocumentKind::Catalog => {
                let products = self.process_catalog(provider, &assembler);
                if products.is_empty() {
                    vec![assembler.catalog_fallback(all_pages)]
                } else {
                    products
                }
            }
            DocumentKind::SingleProduct => {
                vec![assembler.single_product(self.scalar.parse_single_product(&text), all_pages)]
            }
            DocumentKind::ReferenceSheet => {
                vec![assembler.reference(self.scalar.parse_reference(&text), all_pages)]
            }
            DocumentKind::Unrecognized => self.unrecognized(source_name, &text),
        };

        info!("{}: {} products", source_name, products.len());
        products
    }

    fn unrecognized(&self, source_name: &str, text: &str) -> Vec<Product> {
        if self.config.extraction.strict {
            debug!("Strict mode: skipping {}", source_name);
            Vec::new()
        } else {
            let assembler = ProductAssembler::new(&self.normalizer, &self.scalar, source_name, text);
            vec![assembler.placeholder()]
        }
    }

    fn process_catalog(&self, provider: &dyn PageProvider, assembler: &ProductAssembler<'_>) -> Vec<Product> {
        let mut seen_codes = HashSet::new();
        let mut products = Vec::new();
        for page_index in 0..provider.page_count() {
            let report = self.process_page(provider, assembler, page_index);
            for product in report.products {
                let code = product.ordering_code().unwrap_or_default().to_string();
                if seen_codes.insert(code) {
                    products.push(product);
                } else {
                    debug!("Ordering code repeated on page {}; keeping first", report.page_number);
                }
            }
        }
        products
    }

    /// Extract, resolve and assemble one catalog page.
    pub fn process_page(
        &self,
        provider: &dyn PageProvider,
        assembler: &ProductAssembler<'_>,
        page_index: usize,
    ) -> PageReport {
        let page_number = page_index as u32 + 1;
        let text = provider.get_page_text(page_index);
        let grid = if self.backend.supports_grid() {
            provider.get_page_table(page_index)
        } else {
            None
        };

        let mut rows = self.variants.extract(&text, grid.as_ref());
        let matrix = self.matrix.extract(&text, &self.normalizer);
        let values = matrix
            .as_ref()
            .map(|m| self.matrix.distribute(m, &self.normalizer))
            .unwrap_or_else(ContactValueMap::default);

        self.resolver.resolve(&text, &mut rows, values.columns());

        let shared = assembler.page_shared_specs(&text);
        let context = PageContext {
            page_number,
            text: &text,
            values: &values,
            shared_specs: &shared,
        };
        let products: Vec<Product> = rows.iter().map(|row| assembler.assemble_row(row, &context)).collect();
        debug!("Page {}: {} rows, {} products", page_number, rows.len(), products.len());

        PageReport {
            page_number,
            grid_rows: rows.iter().filter(|r| r.strategy == crate::extract::RowStrategy::Grid).count(),
            matrix_columns: values.columns().to_vec(),
            matrix_rows: matrix
                .map(|m| m.rows.into_iter().map(|r| (r.key, r.raw)).collect())
                .unwrap_or_default(),
            products,
        }
    }

    /// Inspect a single page of a document.
    pub fn inspect_page(&self, path: &Path, page_number: u32) -> SpecResult<PageReport> {
        let name = file_name(path);
        let provider = open_isolated(path, self.backend())?;
        if page_number == 0 || page_number as usize > provider.page_count() {
            return Err(SpecError::configuration(format!(
                "page {} out of range (1..={})",
                page_number,
                provider.page_count()
            )));
        }
        let text = provider.full_text();
        let assembler = ProductAssembler::new(&self.normalizer, &self.scalar, &name, &text);
        Ok(self.process_page(provider.as_ref(), &assembler, page_number as usize - 1))
    }

    /// Documents in `dir` with a configured extension, sorted by file name.
    pub fn document_paths(&self, dir: &Path) -> SpecResult<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let invalid = || SpecError::InvalidInput {
            path: dir.display().to_string(),
        };
        if !dir.is_dir() {
            return Err(invalid());
        }

        let extensions: Vec<String> = self
            .config
            .extraction
            .document_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|_| invalid())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| extensions.contains(&e.to_lowercase()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort_by_key(|p| file_name(p));
        Ok(paths)
    }

    /// Products for every document in `dir`, in file-name order.
    pub fn extract_products(&self, dir: &Path) -> SpecResult<Vec<Product>> {
        let paths = self.document_paths(dir)?;
        info!("Processing {} documents from {}", paths.len(), dir.display());
        let timer = PerformanceTimer::start(format!("batch {}", dir.display()));

        let workers = self.config.processing.parallel_workers;
        let per_document: Vec<Vec<Product>> = if workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| SpecError::configuration(format!("Failed to start worker pool: {}", e)))?;
            pool.install(|| paths.par_iter().map(|p| self.process_path(p)).collect())
        } else {
            paths.iter().map(|p| self.process_path(p)).collect()
        };

        timer.checkpoint("documents processed");

        let products: Vec<Product> = per_document.into_iter().flatten().collect();
        info!("Extracted {} products", products.len());
        Ok(products)
    }
}

/// Batch entrypoint with a given configuration.
pub fn extract_products(dir: impl AsRef<Path>, config: PipelineConfig) -> SpecResult<Vec<Product>> {
    Pipeline::new(config)?.extract_products(dir.as_ref())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
