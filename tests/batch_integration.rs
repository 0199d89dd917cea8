use std::fs;
use std::path::Path;

use pdsp::{extract_products, PipelineConfig, SpecError};
use tempfile::tempdir;

const CATALOG: &str = "Serie 713 M12 Kabelstecker\n\
Polzahl / Contacts   Kabelauslass / Cable outlet   Bestell-Nr. / Ordering-No.\n\
4   4-6 mm   99 0429 14 04\n\
5   4-6 mm   99 0429 14 05\n";

fn write_docs(dir: &Path) {
    fs::write(dir.join("b_catalog.txt"), CATALOG).unwrap();
    fs::write(dir.join("a_notes.txt"), "Lorem ipsum dolor sit amet").unwrap();
    fs::write(dir.join("c_reference.txt"), "Technische Informationen\nAWG 22 = 0,326 mm²\n").unwrap();
    fs::write(dir.join("ignored.csv"), CATALOG).unwrap();
}

fn sources(products: &[pdsp::Product]) -> Vec<&str> {
    products.iter().filter_map(|p| p.source_document()).collect()
}

#[test]
fn test_directory_in_file_name_order() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    let products = extract_products(dir.path(), PipelineConfig::default()).unwrap();
    assert_eq!(
        sources(&products),
        vec!["a_notes.txt", "b_catalog.txt", "b_catalog.txt", "c_reference.txt"]
    );
    assert_eq!(products[0].product_name(), Some("a_notes"));
    assert_eq!(products[1].ordering_code(), Some("99 0429 14 04"));
    assert_eq!(products[3].numeric_spec("awg_22_mm2"), Some(0.326));
}

#[test]
fn test_strict_mode_drops_unrecognized() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());

    let mut config = PipelineConfig::default();
    config.extraction.strict = true;
    let products = extract_products(dir.path(), config).unwrap();
    assert!(!sources(&products).contains(&"a_notes.txt"));
    assert_eq!(products.len(), 3);
}

#[test]
fn test_parallel_workers_keep_order() {
    let dir = tempdir().unwrap();
    write_docs(dir.path());
    for i in 0..6 {
        fs::write(dir.path().join(format!("d_{}.txt", i)), CATALOG).unwrap();
    }

    let sequential = extract_products(dir.path(), PipelineConfig::default()).unwrap();
    let mut config = PipelineConfig::default();
    config.processing.parallel_workers = 3;
    let parallel = extract_products(dir.path(), config).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let products = extract_products(dir.path().join("nope"), PipelineConfig::default()).unwrap();
    assert!(products.is_empty());
}

#[test]
fn test_file_instead_of_directory_is_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("single.txt");
    fs::write(&file, CATALOG).unwrap();

    let result = extract_products(&file, PipelineConfig::default());
    assert!(matches!(result, Err(SpecError::InvalidInput { .. })));
}

#[test]
fn test_unreadable_pdf_becomes_placeholder() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

    let products = extract_products(dir.path(), PipelineConfig::default()).unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product_name(), Some("broken"));
}
