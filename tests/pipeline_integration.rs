use std::sync::Arc;

use pdsp::model::AppliesTo;
use pdsp::provider::{LayoutGridBackend, NoTableBackend, TextFileProvider};
use pdsp::{DocumentKind, Pipeline, PipelineConfig};

const CATALOG: &str = "M12 Steckverbinder / Connectors  Serie 713\n\
Polzahl / Contacts   Kabelauslass / Cable outlet   Bestell-Nr. / Ordering-No.\n\
4   4-6 mm   99 0429 14 04\n\
5   4-6 mm   99 0429 14 05\n\
Technische Daten / Technical data\n\
Polzahl / Contacts 4 5\n\
Bemessungsspannung / Rated voltage\n\
Schutzart / Degree of protection\n\
250 V 400 V\n\
IP67\n";

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default()).unwrap()
}

#[test]
fn test_two_rows_two_columns_two_products() {
    let provider = TextFileProvider::from_text(CATALOG, Arc::new(LayoutGridBackend::new(2)));
    let products = pipeline().process_provider(&provider, "catalog.txt");

    assert_eq!(products.len(), 2);
    for (product, (contacts, volts)) in products.iter().zip([(4u8, 250.0), (5u8, 400.0)]) {
        assert_eq!(product.numeric_spec("contacts"), Some(f64::from(contacts)));
        let voltage = product.specs_for("rated_voltage_v").next().unwrap();
        assert_eq!(voltage.spec_value_num, Some(volts));
        assert_eq!(voltage.unit.as_deref(), Some("V"));
        assert_eq!(voltage.applies_to, Some(AppliesTo::Contacts(contacts)));

        let ip: Vec<_> = product
            .specs_for("ip_rating")
            .filter_map(|s| s.spec_value_text.as_deref())
            .collect();
        assert_eq!(ip, vec!["IP67"]);
        assert_eq!(product.source_document(), Some("catalog.txt"));
    }
}

#[test]
fn test_grid_and_line_strategies_agree() {
    let with_grid = TextFileProvider::from_text(CATALOG, Arc::new(LayoutGridBackend::new(2)));
    let without = TextFileProvider::from_text(CATALOG, Arc::new(NoTableBackend));
    let p = pipeline();

    let a = p.process_provider(&with_grid, "catalog.txt");
    let b = p.process_provider(&without, "catalog.txt");
    let codes = |products: &[pdsp::Product]| {
        products
            .iter()
            .map(|p| (p.ordering_code().map(str::to_string), p.numeric_spec("contacts")))
            .collect::<Vec<_>>()
    };
    assert_eq!(codes(&a), codes(&b));
}

#[test]
fn test_mismatched_header_resolved_by_anchor_position() {
    let page = "M12 Kabelstecker Serie 763\n\
Bestell-Nr. / Ordering-No.\n\
3 4\n\
4-6 mm 99 0430 14 03   4-6 mm 99 0430 16 03   6-8 mm 99 0430 18 04\n\
Kabel / Cable\n\
Polzahl / Contacts 3 4\n\
Bemessungsstrom / Rated current\n\
4 A 2 A\n";
    let provider = TextFileProvider::from_text(page, Arc::new(NoTableBackend));
    let products = pipeline().process_provider(&provider, "serie_713_763.txt");
    assert_eq!(products.len(), 3);

    // three pairs under a two-number header: the anchor picks by code position
    let counts: Vec<_> = products.iter().map(|p| p.numeric_spec("contacts")).collect();
    assert_eq!(counts, vec![Some(3.0), Some(4.0), Some(3.0)]);
    assert_eq!(products[1].numeric_spec("rated_current_a"), Some(2.0));
}

#[test]
fn test_classification_of_document_kinds() {
    let p = pipeline();
    let kind = |text: &str, name: &str| p.classifier().classify(text, name);

    assert_eq!(kind(CATALOG, "catalog.pdf"), DocumentKind::Catalog);
    assert_eq!(
        kind("Technische Informationen\nAWG 24 = 0,205 mm²", "info.pdf"),
        DocumentKind::ReferenceSheet
    );
    assert_eq!(kind("Shopping list", "list.pdf"), DocumentKind::Unrecognized);
}

#[test]
fn test_single_product_and_reference_documents() {
    let p = pipeline();
    let sheet = TextFileProvider::from_text(
        "BINDER\nModel CB-S 260 | CO2 incubator\nTemperature range: 7 °C to 50 °C\nNominal power: 0,8 kW\n",
        Arc::new(NoTableBackend),
    );
    let products = p.process_provider(&sheet, "cb_s_260.txt");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].brand(), Some("BINDER"));
    assert_eq!(products[0].model_no(), Some("CB-S 260"));
    assert_eq!(products[0].numeric_spec("nominal_power_kw"), Some(0.8));
    assert_eq!(products[0].numeric_spec("temp_max_c"), Some(50.0));

    let reference = TextFileProvider::from_text(
        "Technische Informationen\nAllgemeine Hinweise\nAWG 24 = 0,205 mm²\nPUR: -40 °C ... +80 °C\n",
        Arc::new(NoTableBackend),
    );
    let products = p.process_provider(&reference, "technische_infos.txt");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product_name(), Some("General Technical Information"));
    assert_eq!(products[0].numeric_spec("awg_24_mm2"), Some(0.205));
    assert_eq!(products[0].numeric_spec("pur_temp_min_c"), Some(-40.0));
}
