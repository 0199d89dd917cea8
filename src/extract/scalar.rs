//! Scalar-field parsers for documents without ordering tables, and the
//! page-level lookups (series, coding) the catalog assembler shares.

use regex::{Captures, Regex};

use super::patterns::{MatchMode, PatternTable};
use crate::error::SpecResult;
use crate::model::Spec;
use crate::normalize::parse_number;

/// What a single-product sheet yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleProductFields {
    pub brand: Option<String>,
    pub family: Option<String>,
    pub model_no: Option<String>,
    pub product_name: Option<String>,
    pub interfaces: Vec<String>,
    pub specs: Vec<Spec>,
    temperature: Option<(String, String)>,
    dimensions: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceFields {
    pub specs: Vec<Spec>,
}

fn record_temperature(caps: &Captures<'_>, out: &mut SingleProductFields) {
    if out.temperature.is_none() {
        out.temperature = Some((caps[1].to_string(), caps[2].to_string()));
    }
}

fn record_co2(caps: &Captures<'_>, out: &mut SingleProductFields) {
    let range = format!("0–{}", &caps[1]);
    out.specs
        .push(Spec::text("co2_range_percent", range, Some("%"), caps[0].trim()));
}

fn record_power(caps: &Captures<'_>, out: &mut SingleProductFields) {
    if let Some(kw) = parse_number(&caps[1]) {
        out.specs
            .push(Spec::numeric("nominal_power_kw", kw, Some("kW"), caps[0].trim()));
    }
}

fn record_voltage(caps: &Captures<'_>, out: &mut SingleProductFields) {
    if let Some(volts) = parse_number(&caps[1]) {
        out.specs
            .push(Spec::numeric("rated_voltage_v", volts, Some("V"), caps[0].trim()));
    }
}

fn record_dimension(caps: &Captures<'_>, out: &mut SingleProductFields) {
    if let Some(mm) = parse_number(&caps[1]) {
        out.dimensions.push(mm);
    }
}

fn record_model(caps: &Captures<'_>, out: &mut SingleProductFields) {
    out.family = Some(caps["family"].to_string());
    out.model_no = Some(format!("{} {}", &caps["family"], &caps["number"]));
    out.product_name = Some(caps["line"].trim().to_string());
}

fn record_interface(caps: &Captures<'_>, out: &mut SingleProductFields) {
    let raw = caps[1].to_uppercase();
    let name = if let Some(digits) = raw.strip_prefix("RS") {
        format!("RS-{}", digits.trim_start_matches(['-', ' ']))
    } else if raw == "ETHERNET" {
        "Ethernet".to_string()
    } else {
        raw
    };
    if !out.interfaces.contains(&name) {
        out.interfaces.push(name);
    }
}

fn record_awg_pair(caps: &Captures<'_>, out: &mut ReferenceFields) {
    if let (Ok(gauge), Some(mm2)) = (caps[1].parse::<u32>(), parse_number(&caps[2])) {
        let key = format!("awg_{}_mm2", gauge);
        out.specs.push(Spec::numeric(key, mm2, Some("mm2"), caps[0].trim()));
    }
}

fn record_material_temperature(caps: &Captures<'_>, out: &mut ReferenceFields) {
    let material = caps[1].to_lowercase();
    if let (Some(a), Some(b)) = (parse_number(&caps[2]), parse_number(&caps[3])) {
        let raw = caps[0].trim();
        out.specs.push(Spec::numeric(
            format!("{}_temp_min_c", material),
            a.min(b),
            Some("°C"),
            raw,
        ));
        out.specs.push(Spec::numeric(
            format!("{}_temp_max_c", material),
            a.max(b),
            Some("°C"),
            raw,
        ));
    }
}

fn record_reference_voltage(caps: &Captures<'_>, out: &mut ReferenceFields) {
    if let Some(volts) = parse_number(&caps[1]) {
        out.specs
            .push(Spec::numeric("reference_voltage_v", volts, Some("V"), caps[0].trim()));
    }
}

/// How far (bytes) from an ordering code the per-row lookups reach.
pub const NEARBY_WINDOW: usize = 1500;

pub struct ScalarParsers {
    single_product: PatternTable<SingleProductFields>,
    reference: PatternTable<ReferenceFields>,
    series: Regex,
    article_number: Regex,
    cable_length: Regex,
    coding: Regex,
    connector_size: Regex,
    known_brands: Vec<String>,
}

impl ScalarParsers {
    pub fn new(known_brands: Vec<String>) -> SpecResult<Self> {
        let single_product = PatternTable::new()
            .with(
                "temperature_range",
                r"(?i)temperature\s*range\s*:?\s*([+\-−]?\d{1,3})\s*°\s*C[^\n]*?([+\-−]?\d{1,3})\s*°\s*C",
                MatchMode::First,
                record_temperature,
            )?
            .with(
                "temperature_from_to",
                r"(?i)from\s*([+\-−]?\d{1,3})\s*°\s*C\s*(?:to|–|-)\s*([+\-−]?\d{1,3})\s*°\s*C",
                MatchMode::First,
                record_temperature,
            )?
            .with(
                "co2_range",
                r"(?i)CO\s*[2₂][^%\n]*?(?:range|:)?\s*0\s*(?:to|–|-)\s*(\d{1,2})\s*(?:vol\.?\s*%|%)",
                MatchMode::First,
                record_co2,
            )?
            .with(
                "nominal_power",
                r"(?i)(?:nominal\s*power|power)\s*:?\s*(\d+(?:[.,]\d+)?)\s*kW",
                MatchMode::First,
                record_power,
            )?
            .with(
                "rated_voltage",
                r"(?i)(?:rated|nominal|supply)\s+voltage\s*:?\s*(\d{2,3})\s*V\b",
                MatchMode::First,
                record_voltage,
            )?
            .with("dimensions", r"(?i)\b(\d{2,4})\s*mm\b", MatchMode::All, record_dimension)?
            .with(
                "model",
                r"(?m)^(?P<line>[^\n]*\bModel\s+(?P<family>[A-Z]{1,4}(?:-[A-Z0-9]{1,3})?)\s+(?P<number>\d{2,4})\b[^\n]*)$",
                MatchMode::First,
                record_model,
            )?
            .with(
                "interfaces",
                r"(?i)\b(RS[- ]?232|RS[- ]?422|RS[- ]?485|USB|Ethernet)\b",
                MatchMode::All,
                record_interface,
            )?;

        let reference = PatternTable::new()
            .with(
                "awg_pairs",
                r"(?i)AWG\s*(\d{1,2})\s*=\s*(\d+(?:[.,]\d+)?)\s*mm",
                MatchMode::All,
                record_awg_pair,
            )?
            .with(
                "material_temperatures",
                r"(?i)\b(PVC|PUR|TPE)\b[^°\n]*?([+\-−]?\d{1,3})[^\n]*?([+\-−]?\d{1,3})\s*°\s*C",
                MatchMode::All,
                record_material_temperature,
            )?
            .with(
                "reference_voltage",
                r"(?i)\b(?:bis|up\s+to)\s*(\d{2,4})\s*V\b",
                MatchMode::All,
                record_reference_voltage,
            )?;

        Ok(Self {
            single_product,
            reference,
            series: Regex::new(r"\bSerie[sn]?\s+(\d{3})(?:\s*[·\-/]\s*(\d{3}))?\b")?,
            article_number: Regex::new(r"\b77\s?\d{4}\s?\d{4}\s?\d{4,5}\b")?,
            cable_length: Regex::new(r"\b(\d{1,3}(?:[.,]\d+)?)\s?m(?:[^\w²]|$)")?,
            coding: Regex::new(r"\b([A-Z])[-\s](?i:coded|codiert|kodiert|coding|kodierung)\b")?,
            connector_size: Regex::new(r"\bM(8|12|16|23)\b")?,
            known_brands,
        })
    }

    pub fn parse_single_product(&self, text: &str) -> SingleProductFields {
        let mut fields = SingleProductFields::default();
        let matched = self.single_product.apply(text, &mut fields);
        tracing::debug!("Single-product patterns matched: {:?}", matched);

        let mut specs = Vec::new();
        if let Some((lo, hi)) = fields.temperature.take() {
            let pretty = format!("{}–{}", lo, hi);
            specs.push(Spec::text("temp_range_c", pretty.clone(), Some("°C"), pretty));
            if let (Some(a), Some(b)) = (parse_number(&lo), parse_number(&hi)) {
                specs.push(Spec::numeric("temp_min_c", a.min(b), Some("°C"), format!("{} °C", lo)));
                specs.push(Spec::numeric("temp_max_c", a.max(b), Some("°C"), format!("{} °C", hi)));
            }
        }
        specs.append(&mut fields.specs);

        if let [width, height, depth, ..] = fields.dimensions[..] {
            for (key, value) in [("width_mm", width), ("height_mm", height), ("depth_mm", depth)] {
                specs.push(Spec::numeric(key, value, Some("mm"), format!("{} mm", value)));
            }
        }

        fields.specs = specs;
        fields.brand = self.find_brand(text);
        fields
    }

    pub fn parse_reference(&self, text: &str) -> ReferenceFields {
        let mut fields = ReferenceFields::default();
        let matched = self.reference.apply(text, &mut fields);
        tracing::debug!("Reference patterns matched: {:?}", matched);
        fields
    }

    /// First configured brand present in the text (case-insensitive).
    pub fn find_brand(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.known_brands
            .iter()
            .find(|brand| lowered.contains(&brand.to_lowercase()))
            .cloned()
    }

    /// Series mention closest to `offset`, e.g. "713" or "713 · 763".
    pub fn nearest_series(&self, text: &str, offset: usize) -> Option<String> {
        nearest(&self.series, text, offset, usize::MAX).map(|caps| series_label(&caps))
    }

    /// Article-number root nearest `offset`, e.g. "77 3420 0000 50003".
    pub fn nearest_article_number(&self, text: &str, offset: usize) -> Option<String> {
        let caps = nearest(&self.article_number, text, offset, NEARBY_WINDOW)?;
        let digits: String = caps[0].chars().filter(char::is_ascii_digit).collect();
        let (head, rest) = digits.split_at(2);
        let (middle, rest) = rest.split_at(4);
        let (tail, last) = rest.split_at(4);
        Some(format!("{} {} {} {}", head, middle, tail, last))
    }

    /// Cable length in metres nearest `offset`.
    pub fn nearest_cable_length(&self, text: &str, offset: usize) -> Option<Spec> {
        let caps = nearest(&self.cable_length, text, offset, NEARBY_WINDOW)?;
        let metres = parse_number(&caps[1])?;
        Some(Spec::numeric("cable_length_m", metres, Some("m"), caps[0].trim()))
    }

    pub fn first_series(&self, text: &str) -> Option<String> {
        self.series.captures(text).map(|caps| series_label(&caps))
    }

    /// Connector coding such as "M12 A"; the size is omitted when absent.
    pub fn coding(&self, text: &str) -> Option<String> {
        let letter = self.coding.captures(text)?[1].to_string();
        match self.connector_size.captures(text) {
            Some(size) => Some(format!("M{} {}", &size[1], letter)),
            None => Some(letter),
        }
    }
}

/// Match whose centre lies closest to `offset`, no further than `window`.
fn nearest<'t>(regex: &Regex, text: &'t str, offset: usize, window: usize) -> Option<Captures<'t>> {
    regex
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let distance = (whole.start() + whole.len() / 2).abs_diff(offset);
            (distance <= window).then_some((distance, caps))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, caps)| caps)
}

fn series_label(caps: &Captures<'_>) -> String {
    match caps.get(2) {
        Some(second) => format!("{} · {}", &caps[1], second.as_str()),
        None => caps[1].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsers() -> ScalarParsers {
        ScalarParsers::new(vec!["BINDER".to_string()]).unwrap()
    }

    const SHEET: &str = "binder GmbH\n\
Model CB-S 260 | CO2 incubator\n\
Temperature range: 7 °C above ambient temperature up to 50 °C\n\
CO2 range 0 to 20 vol.%\n\
Nominal power: 0,8 kW\n\
Rated voltage 230 V\n\
Exterior dimensions 740 mm 895 mm 675 mm\n\
Interfaces: RS 422, USB, Ethernet\n";

    #[test]
    fn test_single_product_sheet() {
        let fields = parsers().parse_single_product(SHEET);
        assert_eq!(fields.brand.as_deref(), Some("BINDER"));
        assert_eq!(fields.family.as_deref(), Some("CB-S"));
        assert_eq!(fields.model_no.as_deref(), Some("CB-S 260"));
        assert_eq!(fields.product_name.as_deref(), Some("Model CB-S 260 | CO2 incubator"));
        assert_eq!(fields.interfaces, vec!["RS-422", "USB", "Ethernet"]);

        let num = |key: &str| fields.specs.iter().find(|s| s.spec_key == key).and_then(|s| s.spec_value_num);
        assert_eq!(num("temp_min_c"), Some(7.0));
        assert_eq!(num("temp_max_c"), Some(50.0));
        assert_eq!(num("nominal_power_kw"), Some(0.8));
        assert_eq!(num("rated_voltage_v"), Some(230.0));
        assert_eq!(num("width_mm"), Some(740.0));
        assert_eq!(num("depth_mm"), Some(675.0));

        let co2 = fields.specs.iter().find(|s| s.spec_key == "co2_range_percent").unwrap();
        assert_eq!(co2.spec_value_text.as_deref(), Some("0–20"));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let fields = parsers().parse_single_product("Model X 12\nonly 100 mm wide");
        assert!(fields.specs.iter().all(|s| s.spec_key != "width_mm"));
        assert!(fields.brand.is_none());
    }

    #[test]
    fn test_reference_sheet() {
        let text = "AWG 24 = 0,205 mm²\nAWG 22 = 0,326 mm²\nPVC: -25 °C ... +70 °C\nBemessungsspannung bis 250 V";
        let fields = parsers().parse_reference(text);
        let keys: Vec<_> = fields.specs.iter().map(|s| s.spec_key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["awg_24_mm2", "awg_22_mm2", "pvc_temp_min_c", "pvc_temp_max_c", "reference_voltage_v"]
        );
        assert_eq!(fields.specs[0].spec_value_num, Some(0.205));
        assert_eq!(fields.specs[2].spec_value_num, Some(-25.0));
        assert_eq!(fields.specs[3].spec_value_num, Some(70.0));
    }

    #[test]
    fn test_article_number_and_length_nearest_each_code() {
        let p = parsers();
        let text = "Kabellänge / Cable length\n\
77 3420 0000 50003–0200   99 0429 14 04   2 m\n\
7734200000 50005   99 0429 14 05   5 m\n";
        let first = text.find("99 0429 14 04").unwrap();
        let second = text.find("99 0429 14 05").unwrap();

        assert_eq!(p.nearest_article_number(text, first).as_deref(), Some("77 3420 0000 50003"));
        assert_eq!(p.nearest_article_number(text, second).as_deref(), Some("77 3420 0000 50005"));

        let length = p.nearest_cable_length(text, first).unwrap();
        assert_eq!(length.spec_key, "cable_length_m");
        assert_eq!(length.spec_value_num, Some(2.0));
        assert_eq!(length.unit.as_deref(), Some("m"));
        assert_eq!(p.nearest_cable_length(text, second).unwrap().spec_value_num, Some(5.0));
    }

    #[test]
    fn test_nearby_lookups_respect_window_and_units() {
        let p = parsers();
        let far = format!("77 3420 0000 50003 2 m{}99 0429 14 04", " ".repeat(NEARBY_WINDOW * 2));
        let offset = far.find("99 0429").unwrap();
        assert_eq!(p.nearest_article_number(&far, offset), None);
        assert_eq!(p.nearest_cable_length(&far, offset), None);

        // millimetres and square metres are not cable lengths
        assert_eq!(p.nearest_cable_length("4-6 mm 99 0429 14 04 0,5 m²", 0), None);
    }

    #[test]
    fn test_awg_keys_use_the_gauge_number() {
        let fields = parsers().parse_reference("AWG 0 = 53,5 mm²\nAWG 05 = 16,8 mm²");
        let keys: Vec<_> = fields.specs.iter().map(|s| s.spec_key.as_str()).collect();
        assert_eq!(keys, vec!["awg_0_mm2", "awg_5_mm2"]);
        assert_eq!(fields.specs[0].spec_value_num, Some(53.5));
    }

    #[test]
    fn test_series_and_coding() {
        let p = parsers();
        let text = "Serie 713 · 763\nM12 A-kodiert / A-coded\n....................\nSerie 763\n99 0429 14 04";
        let code_offset = text.find("99 0429").unwrap();
        assert_eq!(p.nearest_series(text, code_offset).as_deref(), Some("763"));
        assert_eq!(p.nearest_series(text, 0).as_deref(), Some("713 · 763"));
        assert_eq!(p.first_series(text).as_deref(), Some("713 · 763"));
        assert_eq!(p.coding(text).as_deref(), Some("M12 A"));
        assert_eq!(p.coding("nothing"), None);
    }
}
