//! Page text / table-grid providers.
//!
//! Providers never fail once opened: a page that cannot be read yields empty
//! text and no grid, and the failure is logged.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::error::{SpecError, SpecResult};

/// Raw table cells, row-major.
pub type Grid = Vec<Vec<String>>;

/// Pages are 0-based here; products report 1-based page numbers.
pub trait PageProvider {
    fn page_count(&self) -> usize;
    fn get_page_text(&self, page_index: usize) -> String;
    fn get_page_table(&self, page_index: usize) -> Option<Grid>;

    /// All pages joined with newlines, used for classification.
    fn full_text(&self) -> String {
        (0..self.page_count())
            .map(|i| self.get_page_text(i))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds a cell grid out of a page's text, when it can.
pub trait TableBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports_grid(&self) -> bool;
    fn extract_grid(&self, page_text: &str) -> Option<Grid>;
}

/// Splits column-aligned text on runs of spaces, tabs or pipes.
pub struct LayoutGridBackend {
    min_gap: usize,
}

impl LayoutGridBackend {
    pub fn new(min_gap: usize) -> Self {
        Self { min_gap: min_gap.max(2) }
    }

    fn split_cells(&self, line: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut current = String::new();
        let mut spaces = 0;

        let flush = |current: &mut String, cells: &mut Vec<String>| {
            let cell = current.trim();
            if !cell.is_empty() {
                cells.push(cell.to_string());
            }
            current.clear();
        };

        for ch in line.chars() {
            match ch {
                '|' | '\t' => {
                    flush(&mut current, &mut cells);
                    spaces = 0;
                }
                ' ' => {
                    spaces += 1;
                    current.push(ch);
                }
                _ => {
                    if spaces >= self.min_gap {
                        flush(&mut current, &mut cells);
                    }
                    spaces = 0;
                    current.push(ch);
                }
            }
        }
        flush(&mut current, &mut cells);
        cells
    }
}

impl TableBackend for LayoutGridBackend {
    fn name(&self) -> &'static str {
        "layout-grid"
    }

    fn supports_grid(&self) -> bool {
        true
    }

    fn extract_grid(&self, page_text: &str) -> Option<Grid> {
        let grid: Grid = page_text
            .lines()
            .map(|line| self.split_cells(line))
            .filter(|cells| !cells.is_empty())
            .collect();

        // a grid with no multi-column row is just prose
        if grid.iter().any(|row| row.len() > 1) {
            Some(grid)
        } else {
            None
        }
    }
}

pub struct NoTableBackend;

impl TableBackend for NoTableBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn supports_grid(&self) -> bool {
        false
    }

    fn extract_grid(&self, _page_text: &str) -> Option<Grid> {
        None
    }
}

/// Pick the table backend once, from configuration.
pub fn backend_from_config(config: &ExtractionConfig) -> Arc<dyn TableBackend> {
    if config.enable_table_grid {
        Arc::new(LayoutGridBackend::new(config.grid_min_gap))
    } else {
        Arc::new(NoTableBackend)
    }
}

/// PDF text through lopdf; one string per page, read eagerly at open.
pub struct PdfProvider {
    pages: Vec<String>,
    backend: Arc<dyn TableBackend>,
}

impl PdfProvider {
    pub fn open<P: AsRef<Path>>(path: P, backend: Arc<dyn TableBackend>) -> SpecResult<Self> {
        let path = path.as_ref();
        let document = lopdf::Document::load(path).map_err(|e| {
            SpecError::provider_with_source(format!("Failed to load PDF {}", path.display()), e)
        })?;

        let pages = document
            .get_pages()
            .keys()
            .map(|&page_number| match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Text extraction failed on page {} of {}: {}", page_number, path.display(), e);
                    String::new()
                }
            })
            .collect::<Vec<_>>();

        debug!("Loaded {} pages from {}", pages.len(), path.display());
        Ok(Self { pages, backend })
    }
}

impl PageProvider for PdfProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn get_page_text(&self, page_index: usize) -> String {
        self.pages.get(page_index).cloned().unwrap_or_default()
    }

    fn get_page_table(&self, page_index: usize) -> Option<Grid> {
        self.pages
            .get(page_index)
            .and_then(|text| self.backend.extract_grid(text))
    }
}

/// Pre-extracted plain text; pages are separated by form feeds.
pub struct TextFileProvider {
    pages: Vec<String>,
    backend: Arc<dyn TableBackend>,
}

impl TextFileProvider {
    pub fn open<P: AsRef<Path>>(path: P, backend: Arc<dyn TableBackend>) -> SpecResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SpecError::file_io(path.display().to_string(), e))?;
        Ok(Self::from_text(&content, backend))
    }

    pub fn from_text(content: &str, backend: Arc<dyn TableBackend>) -> Self {
        let pages = content.split('\x0c').map(str::to_string).collect();
        Self { pages, backend }
    }
}

impl PageProvider for TextFileProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn get_page_text(&self, page_index: usize) -> String {
        self.pages.get(page_index).cloned().unwrap_or_default()
    }

    fn get_page_table(&self, page_index: usize) -> Option<Grid> {
        self.pages
            .get(page_index)
            .and_then(|text| self.backend.extract_grid(text))
    }
}

/// Open the provider matching the file extension.
pub fn open_provider(path: &Path, backend: Arc<dyn TableBackend>) -> SpecResult<Box<dyn PageProvider>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfProvider::open(path, backend)?)),
        _ => Ok(Box::new(TextFileProvider::open(path, backend)?)),
    }
}

/// Like [`open_provider`], but a panic inside the PDF reader becomes a
/// provider error for this document only.
pub fn open_isolated(path: &Path, backend: Arc<dyn TableBackend>) -> SpecResult<Box<dyn PageProvider>> {
    isolate(path, || open_provider(path, backend))
}

pub(crate) fn isolate<T>(path: &Path, open: impl FnOnce() -> SpecResult<T>) -> SpecResult<T> {
    panic::catch_unwind(AssertUnwindSafe(open)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!("Reader panicked on {}: {}", path.display(), reason);
        Err(SpecError::provider(format!("Reader panicked on {}: {}", path.display(), reason)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_layout_grid_splits_on_gaps() {
        let backend = LayoutGridBackend::new(2);
        let text = "Polzahl / Contacts   Kabelauslass / Cable outlet   Bestell-Nr. / Ordering-No.\n\
                    4   4-6 mm   99 0429 14 04\n";
        let grid = backend.extract_grid(text).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][2], "Bestell-Nr. / Ordering-No.");
        assert_eq!(grid[1], vec!["4", "4-6 mm", "99 0429 14 04"]);
    }

    #[test]
    fn test_prose_yields_no_grid() {
        let backend = LayoutGridBackend::new(2);
        assert!(backend.extract_grid("just one sentence\nand another").is_none());
        assert!(NoTableBackend.extract_grid("a   b").is_none());
        assert!(!NoTableBackend.supports_grid());
    }

    #[test]
    fn test_text_provider_pages() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "first page\x0csecond page").unwrap();

        let provider = TextFileProvider::open(file.path(), Arc::new(NoTableBackend)).unwrap();
        assert_eq!(provider.page_count(), 2);
        assert_eq!(provider.get_page_text(1), "second page");
        assert_eq!(provider.get_page_text(7), "");
        assert!(provider.get_page_table(0).is_none());
        assert_eq!(provider.full_text(), "first page\nsecond page");
    }

    #[test]
    fn test_backend_choice_follows_config() {
        let mut config = crate::config::PipelineConfig::default().extraction;
        assert!(backend_from_config(&config).supports_grid());
        config.enable_table_grid = false;
        assert_eq!(backend_from_config(&config).name(), "none");
    }

    /// One Courier text line per page.
    fn write_pdf(path: &Path, page_texts: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pdf_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.pdf");
        write_pdf(&path, &["Bestell-Nr. 99 0429 14 04", "Serie 713 M12"]);

        let provider = PdfProvider::open(&path, Arc::new(NoTableBackend)).unwrap();
        assert_eq!(provider.page_count(), 2);
        assert!(provider.get_page_text(0).contains("99 0429 14 04"));
        assert!(provider.get_page_text(1).contains("Serie 713 M12"));
        assert!(!provider.get_page_text(0).contains("Serie 713"));
        assert_eq!(provider.get_page_text(2), "");

        let opened = open_provider(&path, Arc::new(NoTableBackend)).unwrap();
        assert_eq!(opened.page_count(), 2);
    }

    #[test]
    fn test_reader_panic_is_contained() {
        let result: SpecResult<()> = isolate(Path::new("bad.pdf"), || panic!("bad xref table"));
        match result {
            Err(SpecError::Provider { message, .. }) => assert!(message.contains("bad xref table")),
            other => panic!("expected provider error, got {:?}", other),
        }

        let ok = isolate(Path::new("good.pdf"), || Ok(3));
        assert_eq!(ok.unwrap(), 3);
    }

    #[test]
    fn test_broken_pdf_is_provider_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not a pdf").unwrap();
        let result = PdfProvider::open(file.path(), Arc::new(NoTableBackend));
        assert!(matches!(result, Err(SpecError::Provider { .. })));
    }
}
