//! Value normalization: canonical keys, numbers with units, mm ranges, IP codes,
//! temperature bounds, wire gauges and bilingual cells.
//!
//! Every function here is total: malformed input yields `None`/empty output.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::error::SpecResult;
use crate::model::{AppliesTo, Spec};

/// Immutable lookup tables the normalizer is built from.
#[derive(Debug, Clone)]
pub struct NormalizerTables {
    /// snake_case synonym → canonical key
    pub aliases: HashMap<String, String>,
    /// AWG number → cross-section in mm²
    pub awg_mm2: BTreeMap<u8, f64>,
}

impl Default for NormalizerTables {
    fn default() -> Self {
        let aliases = [
            ("polzahl", "contacts"),
            ("kontakte", "contacts"),
            ("number_of_contacts", "contacts"),
            ("no_of_contacts", "contacts"),
            ("bemessungsspannung", "rated_voltage"),
            ("voltage_rating", "rated_voltage"),
            ("bemessungsstrom", "rated_current"),
            ("current_rating", "rated_current"),
            ("rated_current_40_c", "rated_current"),
            ("rated_current_at_40_c", "rated_current"),
            ("schutzart", "ip_rating"),
            ("degree_of_protection", "ip_rating"),
            ("protection_class", "ip_rating"),
            ("ip_code", "ip_rating"),
            ("material_mantel", "material_jacket"),
            ("jacket_material", "material_jacket"),
            ("material_of_jacket", "material_jacket"),
            ("isolation_litze", "insulation_wire"),
            ("insulation_of_wire", "insulation_wire"),
            ("cable_jacket_ø", "cable_diameter"),
            ("outer_diameter", "cable_diameter"),
            ("temperature_range", "temp"),
            ("temperaturbereich", "temp"),
            ("ambient_temperature", "temp"),
            ("conductor_cross_section", "wire_gauge"),
            ("cross_section", "wire_gauge"),
            ("leiterquerschnitt", "wire_gauge"),
            ("kodierung", "coding"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let awg_mm2 = [
            (16, 1.31),
            (18, 0.823),
            (19, 0.653),
            (20, 0.519),
            (21, 0.410),
            (22, 0.326),
            (23, 0.258),
            (24, 0.205),
            (26, 0.129),
        ]
        .into_iter()
        .collect();

        Self { aliases, awg_mm2 }
    }
}

/// IP code such as `IP67` or `IP69K`, optionally marked for outdoor use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCode {
    pub code: String,
    pub outdoor: bool,
}

impl IpCode {
    pub fn label(&self) -> String {
        if self.outdoor {
            format!("{} (outdoor)", self.code)
        } else {
            self.code.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Result of [`Normalizer::normalize_awg_or_mm2`]; `raw` is always preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeValue {
    pub mm2: Option<f64>,
    pub unit: Option<&'static str>,
    pub raw: String,
}

/// A numeric value with a unit, or an IP code, found inside a raw cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueToken {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub text: String,
}

impl ValueToken {
    pub fn is_ip_code(&self) -> bool {
        self.value.is_none() && self.text.starts_with("IP")
    }
}

struct ValuePatterns {
    mm_range: Regex,
    mm_single: Regex,
    ip_code: Regex,
    value_token: Regex,
    mm2: Regex,
    awg: Regex,
    temp_lower: Regex,
    temp_upper: Regex,
    temp_range: Regex,
}

impl ValuePatterns {
    fn compile() -> SpecResult<Self> {
        Ok(Self {
            mm_range: Regex::new(
                r"(?i)(\d+(?:[.,]\d+)?)\s*(?:mm)?\s*(?:[-–—]|\.\.\.|…|to|bis)\s*(\d+(?:[.,]\d+)?)\s*mm\b",
            )?,
            mm_single: Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*mm\b")?,
            ip_code: Regex::new(r"\bIP\s?(\d{2})([A-Z])?\b(\s*\(?(?i:outdoor|außen|aussen)\)?)?")?,
            value_token: Regex::new(
                r"(?P<ip>\bIP\s?\d{2}[A-Z]?\b)|(?P<num>[+\-−]?\d+(?:[.,]\d+)?)\s*(?P<unit>mm²|mm2|mΩ|kV|mA|mm|°C|Ω|V|A|W|N)(?:[\s,;/)\]]|$)",
            )?,
            mm2: Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*mm(?:2|²)")?,
            awg: Regex::new(r"(?i)\bawg\s*(\d{1,2})\b")?,
            temp_lower: Regex::new(
                r"(?i)(?:untere\s+grenztemperatur|lower\s+(?:limit\s+)?temperature|min(?:imum|\.)?\s+temperature)[^\n\d+\-−]*([+\-−]?\s?\d+(?:[.,]\d+)?)\s*°\s*C",
            )?,
            temp_upper: Regex::new(
                r"(?i)(?:obere\s+grenztemperatur|upper\s+(?:limit\s+)?temperature|max(?:imum|\.)?\s+temperature)[^\n\d+\-−]*([+\-−]?\s?\d+(?:[.,]\d+)?)\s*°\s*C",
            )?,
            temp_range: Regex::new(
                r"(?i)([+\-−]?\d{1,3}(?:[.,]\d+)?)\s*(?:°\s*C)?\s*(?:\.\.\.|…|to|bis|–|—|-)\s*([+\-−]?\d{1,3}(?:[.,]\d+)?)\s*°\s*C",
            )?,
        })
    }
}

/// Pure value normalizer built from immutable lookup tables.
pub struct Normalizer {
    tables: NormalizerTables,
    patterns: ValuePatterns,
}

impl Normalizer {
    pub fn new(tables: NormalizerTables) -> SpecResult<Self> {
        Ok(Self {
            tables,
            patterns: ValuePatterns::compile()?,
        })
    }

    pub fn with_defaults() -> SpecResult<Self> {
        Self::new(NormalizerTables::default())
    }

    /// snake_case key with the alias table applied.
    pub fn canonical_key(&self, label: &str) -> String {
        let key = to_snake_case(label);
        match self.tables.aliases.get(&key) {
            Some(alias) => alias.clone(),
            None => key,
        }
    }

    /// Parse "4–6 mm" style ranges. Anything else yields `(None, None)`.
    pub fn parse_mm_range(&self, text: &str) -> (Option<f64>, Option<f64>) {
        let Some(caps) = self.patterns.mm_range.captures(text) else {
            return (None, None);
        };
        match (parse_number(&caps[1]), parse_number(&caps[2])) {
            (Some(lo), Some(hi)) => (Some(lo), Some(hi)),
            _ => (None, None),
        }
    }

    /// Single "8 mm" value; ranges are not single values.
    pub fn parse_mm_value(&self, text: &str) -> Option<f64> {
        if self.parse_mm_range(text).0.is_some() {
            return None;
        }
        self.patterns.mm_single.captures(text).and_then(|c| parse_number(&c[1]))
    }

    pub fn extract_ip_code(&self, text: &str) -> Option<IpCode> {
        self.extract_ip_codes(text).into_iter().next()
    }

    /// Distinct IP codes in order of first appearance.
    pub fn extract_ip_codes(&self, text: &str) -> Vec<IpCode> {
        let mut codes: Vec<IpCode> = Vec::new();
        for caps in self.patterns.ip_code.captures_iter(text) {
            let code = format!("IP{}{}", &caps[1], caps.get(2).map_or("", |m| m.as_str()));
            let outdoor = caps.get(3).is_some();
            if let Some(existing) = codes.iter_mut().find(|c| c.code == code) {
                existing.outdoor |= outdoor;
            } else {
                codes.push(IpCode { code, outdoor });
            }
        }
        codes
    }

    /// Lower/upper temperature from bilingual limit labels, falling back to
    /// range phrases on lines that mention a temperature.
    pub fn temperature_bounds(&self, text: &str) -> TemperatureBounds {
        let mut bounds = TemperatureBounds {
            lower: self
                .patterns
                .temp_lower
                .captures(text)
                .and_then(|c| parse_number(&c[1])),
            upper: self
                .patterns
                .temp_upper
                .captures(text)
                .and_then(|c| parse_number(&c[1])),
        };

        if bounds.lower.is_none() || bounds.upper.is_none() {
            let range = text
                .lines()
                .filter(|line| line.to_lowercase().contains("temperat"))
                .find_map(|line| self.temperature_range(line));
            if let Some((lo, hi)) = range {
                bounds.lower = bounds.lower.or(Some(lo));
                bounds.upper = bounds.upper.or(Some(hi));
            }
        }
        bounds
    }

    /// "-25 °C ... +85 °C" → (-25, 85), ordered low to high.
    pub fn temperature_range(&self, text: &str) -> Option<(f64, f64)> {
        let caps = self.patterns.temp_range.captures(text)?;
        let a = parse_number(&caps[1])?;
        let b = parse_number(&caps[2])?;
        Some((a.min(b), a.max(b)))
    }

    /// Wire gauge to mm²: direct mm² values pass through, AWG goes through
    /// the lookup table, unknown AWG keeps only the raw text.
    pub fn normalize_awg_or_mm2(&self, raw: &str) -> GaugeValue {
        let text = raw.trim();
        if let Some(caps) = self.patterns.mm2.captures(text) {
            if let Some(value) = parse_number(&caps[1]) {
                return GaugeValue {
                    mm2: Some(value),
                    unit: Some("mm2"),
                    raw: raw.to_string(),
                };
            }
        }

        if let Some(caps) = self.patterns.awg.captures(text) {
            let mm2 = caps[1]
                .parse::<u8>()
                .ok()
                .and_then(|n| self.tables.awg_mm2.get(&n).copied());
            return GaugeValue {
                mm2,
                unit: Some(if mm2.is_some() { "mm2_est" } else { "awg" }),
                raw: raw.to_string(),
            };
        }

        GaugeValue {
            mm2: None,
            unit: None,
            raw: raw.to_string(),
        }
    }

    /// Numeric+unit tokens and IP codes, in order.
    pub fn value_tokens(&self, text: &str) -> Vec<ValueToken> {
        self.patterns
            .value_token
            .captures_iter(text)
            .filter_map(|caps| {
                if let Some(ip) = caps.name("ip") {
                    let code: String = ip.as_str().chars().filter(|c| !c.is_whitespace()).collect();
                    return Some(ValueToken {
                        value: None,
                        unit: None,
                        text: code,
                    });
                }
                let num = caps.name("num")?;
                // "M12 A-coded": a number glued to a word is not a value
                if text[..num.start()].chars().next_back().is_some_and(char::is_alphanumeric) {
                    return None;
                }
                let unit = canonical_unit(caps.name("unit")?.as_str());
                let value = parse_number(num.as_str())?;
                Some(ValueToken {
                    value: Some(value),
                    text: format!("{} {}", num.as_str(), unit),
                    unit: Some(unit.to_string()),
                })
            })
            .collect()
    }

    /// Turn one raw (key, value) fragment into specs.
    pub fn specs_from_raw(&self, key: &str, raw: &str, applies_to: Option<AppliesTo>) -> Vec<Spec> {
        let trimmed = raw.trim();
        if key.is_empty() || trimmed.is_empty() {
            return Vec::new();
        }
        let resolved = resolve_bilingual(trimmed);

        if key.starts_with("temp") || key.contains("temperat") {
            if let Some((lo, hi)) = self.temperature_range(trimmed) {
                let base = key.replace("temperature", "temp");
                return vec![
                    Spec::numeric(format!("{}_min_c", base), lo, Some("°C"), trimmed).applying_to(applies_to),
                    Spec::numeric(format!("{}_max_c", base), hi, Some("°C"), trimmed).applying_to(applies_to),
                ];
            }
        }

        if trimmed.to_lowercase().contains("awg") {
            let gauge = self.normalize_awg_or_mm2(trimmed);
            let spec = match gauge.mm2 {
                Some(mm2) => Spec::numeric(key_with_unit(key, "mm2"), mm2, gauge.unit, trimmed),
                None => Spec::text(key, resolved, gauge.unit, trimmed),
            };
            return vec![spec.applying_to(applies_to)];
        }

        let tokens = self.value_tokens(&resolved);
        let spec = match tokens.as_slice() {
            [token] if token.is_ip_code() => Spec::text(key, token.text.clone(), None, trimmed),
            [token] => match (token.value, token.unit.as_deref()) {
                (Some(value), Some(unit)) => Spec::numeric(key_with_unit(key, unit), value, Some(unit), trimmed),
                _ => Spec::text(key, resolved, None, trimmed),
            },
            [] => match parse_number(&resolved) {
                Some(value) => Spec::numeric(key, value, None, trimmed),
                None => Spec::text(key, resolved, None, trimmed),
            },
            _ => Spec::text(key, resolved, None, trimmed),
        };
        vec![spec.applying_to(applies_to)]
    }
}

/// Convert a label/header into snake_case, keeping letters and digits.
pub fn to_snake_case(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == '_' => c,
            _ => ' ',
        })
        .collect();
    cleaned
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse a number with comma or dot decimal separator and optional sign.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .replace('−', "-")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keep the English half of a "deutsch/english" cell; a comma-delimited
/// prefix in front of the German half is retained.
pub fn resolve_bilingual(text: &str) -> String {
    let trimmed = text.trim();
    let Some(slash) = find_language_slash(trimmed) else {
        return trimmed.to_string();
    };
    let (left, right) = (&trimmed[..slash], trimmed[slash + 1..].trim());
    if right.is_empty() {
        return left.trim().to_string();
    }
    match left.rfind(',') {
        Some(comma) => {
            let prefix = left[..comma].trim();
            if prefix.is_empty() {
                right.to_string()
            } else {
                format!("{}, {}", prefix, right)
            }
        }
        None => right.to_string(),
    }
}

/// Byte index of the first slash that separates two languages rather than
/// belonging to a unit such as "Ω/km".
fn find_language_slash(text: &str) -> Option<usize> {
    text.char_indices().filter(|(_, c)| *c == '/').map(|(i, _)| i).find(|&i| {
        let before = &text[..i];
        let after = &text[i + 1..];
        let spaced = before.ends_with(' ') && after.starts_with(' ');
        let left_word = before.split_whitespace().last().unwrap_or("");
        let right_word = after.split_whitespace().next().unwrap_or("");
        let letters = |w: &str| w.chars().filter(|c| c.is_alphabetic()).count();
        let starts_alpha = right_word.chars().next().is_some_and(char::is_alphabetic);
        (spaced && starts_alpha && letters(left_word) > 0) || (letters(left_word) >= 3 && letters(right_word) >= 3)
    })
}

/// Append the unit to a key unless it already ends with it.
pub fn key_with_unit(key: &str, unit: &str) -> String {
    let suffix = match unit {
        "V" => "v",
        "kV" => "kv",
        "A" => "a",
        "mA" => "ma",
        "mm" => "mm",
        "mm2" | "mm2_est" => "mm2",
        "°C" => "c",
        "Ω" => "ohm",
        "mΩ" => "mohm",
        "W" => "w",
        "kW" => "kw",
        "N" => "n",
        other => return format!("{}_{}", key, to_snake_case(other)),
    };
    if key.ends_with(&format!("_{}", suffix)) {
        key.to_string()
    } else {
        format!("{}_{}", key, suffix)
    }
}

fn canonical_unit(unit: &str) -> &str {
    match unit {
        "mm²" | "mm2" => "mm2",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::with_defaults().unwrap()
    }

    #[test]
    fn test_snake_case_collapses_punctuation() {
        assert_eq!(to_snake_case("Rated current (40 °C)"), "rated_current_40_c");
        assert_eq!(to_snake_case("  Cable-outlet / Ø  "), "cable_outlet_ø");
        assert_eq!(to_snake_case("Design of wire"), "design_of_wire");
    }

    #[test]
    fn test_canonical_key_applies_aliases() {
        let n = normalizer();
        assert_eq!(n.canonical_key("Rated current (40 °C)"), "rated_current");
        assert_eq!(n.canonical_key("Degree of protection"), "ip_rating");
        assert_eq!(n.canonical_key("Insulation resistance"), "insulation_resistance");
    }

    #[test]
    fn test_alias_table_can_be_substituted() {
        let mut tables = NormalizerTables::default();
        tables.aliases.clear();
        tables.aliases.insert("spannung".to_string(), "voltage".to_string());
        let n = Normalizer::new(tables).unwrap();
        assert_eq!(n.canonical_key("Spannung"), "voltage");
        assert_eq!(n.canonical_key("Degree of protection"), "degree_of_protection");
    }

    #[test]
    fn test_parse_number_accepts_comma_and_dot() {
        assert_eq!(parse_number("1,5"), Some(1.5));
        assert_eq!(parse_number("0.75"), Some(0.75));
        assert_eq!(parse_number("+85"), Some(85.0));
        assert_eq!(parse_number("−25"), Some(-25.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_mm_range() {
        let n = normalizer();
        assert_eq!(n.parse_mm_range("4–6 mm"), (Some(4.0), Some(6.0)));
        assert_eq!(n.parse_mm_range("4,5 - 6,5mm"), (Some(4.5), Some(6.5)));
        assert_eq!(n.parse_mm_range("6 to 8 mm"), (Some(6.0), Some(8.0)));
        assert_eq!(n.parse_mm_range("PG 7"), (None, None));
        assert_eq!(n.parse_mm_range(""), (None, None));
    }

    #[test]
    fn test_parse_mm_value_ignores_ranges() {
        let n = normalizer();
        assert_eq!(n.parse_mm_value("Ø 8 mm"), Some(8.0));
        assert_eq!(n.parse_mm_value("4-6 mm"), None);
    }

    #[test]
    fn test_awg_and_mm2() {
        let n = normalizer();
        let awg = n.normalize_awg_or_mm2("AWG 24");
        assert_eq!(awg.mm2, Some(0.205));
        assert_eq!(awg.unit, Some("mm2_est"));

        let direct = n.normalize_awg_or_mm2("0,75 mm²");
        assert_eq!(direct.mm2, Some(0.75));
        assert_eq!(direct.unit, Some("mm2"));

        let unknown = n.normalize_awg_or_mm2("AWG 40");
        assert_eq!(unknown.mm2, None);
        assert_eq!(unknown.raw, "AWG 40");
        assert_eq!(unknown.unit, Some("awg"));
    }

    #[test]
    fn test_ip_codes() {
        let n = normalizer();
        let codes = n.extract_ip_codes("Schutzart IP67 / IP68, IP69K; IP67 again");
        let labels: Vec<_> = codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(labels, vec!["IP67", "IP68", "IP69K"]);

        let outdoor = n.extract_ip_code("IP 44 outdoor").unwrap();
        assert_eq!(outdoor.code, "IP44");
        assert!(outdoor.outdoor);
        assert!(n.extract_ip_code("no rating").is_none());
    }

    #[test]
    fn test_temperature_bounds_from_labels() {
        let n = normalizer();
        let text = "Obere Grenztemperatur / Upper temperature +85 °C\nUntere Grenztemperatur / Lower temperature -25 °C";
        let bounds = n.temperature_bounds(text);
        assert_eq!(bounds.lower, Some(-25.0));
        assert_eq!(bounds.upper, Some(85.0));
    }

    #[test]
    fn test_temperature_bounds_from_range_line() {
        let n = normalizer();
        let bounds = n.temperature_bounds("Temperaturbereich / Temperature range -40 °C ... +85 °C");
        assert_eq!(bounds, TemperatureBounds { lower: Some(-40.0), upper: Some(85.0) });
        assert_eq!(n.temperature_bounds("nothing here"), TemperatureBounds::default());
    }

    #[test]
    fn test_bilingual_resolution() {
        assert_eq!(resolve_bilingual("schwarz/black"), "black");
        assert_eq!(resolve_bilingual("PUR, schwarz/black"), "PUR, black");
        assert_eq!(resolve_bilingual("Kontakte vergoldet / gold-plated contacts"), "gold-plated contacts");
        assert_eq!(resolve_bilingual("60 Ω/km"), "60 Ω/km");
        assert_eq!(resolve_bilingual("2 m/s"), "2 m/s");
        assert_eq!(resolve_bilingual("IP67"), "IP67");
    }

    #[test]
    fn test_value_tokens() {
        let n = normalizer();
        let tokens = n.value_tokens("250 V 250 V 60 V 30 V 30 V");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[2].value, Some(60.0));

        let mixed = n.value_tokens("4 A, 1,5 A and IP67 with 0,34 mm²");
        let units: Vec<_> = mixed.iter().map(|t| t.unit.as_deref()).collect();
        assert_eq!(units, vec![Some("A"), Some("A"), None, Some("mm2")]);
        assert_eq!(mixed[1].value, Some(1.5));
        assert!(mixed[2].is_ip_code());

        assert!(n.value_tokens("M12 A-coded").is_empty());
        assert!(n.value_tokens("≥ 10⁸ Ω").is_empty());
    }

    #[test]
    fn test_specs_from_raw_numeric_key_gets_unit() {
        let n = normalizer();
        let specs = n.specs_from_raw("rated_voltage", "250 V", Some(AppliesTo::Contacts(4)));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].spec_key, "rated_voltage_v");
        assert_eq!(specs[0].spec_value_num, Some(250.0));
        assert_eq!(specs[0].unit.as_deref(), Some("V"));
        assert_eq!(specs[0].applies_to, Some(AppliesTo::Contacts(4)));
    }

    #[test]
    fn test_specs_from_raw_text_and_ranges() {
        let n = normalizer();
        let jacket = n.specs_from_raw("material_jacket", "PUR, schwarz/black", None);
        assert_eq!(jacket[0].spec_value_text.as_deref(), Some("PUR, black"));
        assert_eq!(jacket[0].raw, "PUR, schwarz/black");

        let temps = n.specs_from_raw("temp", "-25 °C ... +85 °C", None);
        assert_eq!(temps.len(), 2);
        assert_eq!(temps[0].spec_key, "temp_min_c");
        assert_eq!(temps[1].spec_value_num, Some(85.0));

        let ip = n.specs_from_raw("ip_rating", "IP67", None);
        assert_eq!(ip[0].spec_value_text.as_deref(), Some("IP67"));

        let gauge = n.specs_from_raw("wire_gauge", "AWG 24", None);
        assert_eq!(gauge[0].spec_key, "wire_gauge_mm2");
        assert_eq!(gauge[0].spec_value_num, Some(0.205));

        assert!(n.specs_from_raw("anything", "   ", None).is_empty());
    }

    #[test]
    fn test_specs_from_raw_gauges() {
        let n = Normalizer::with_defaults().unwrap();

        let unknown = n.specs_from_raw("wire_gauge", "AWG 40", None);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].spec_key, "wire_gauge");
        assert_eq!(unknown[0].spec_value_num, None);
        assert_eq!(unknown[0].spec_value_text.as_deref(), Some("AWG 40"));
        assert_eq!(unknown[0].unit.as_deref(), Some("awg"));
        assert_eq!(unknown[0].raw, "AWG 40");

        let known = n.specs_from_raw("wire_gauge", "AWG 24", None);
        assert_eq!(known[0].spec_key, "wire_gauge_mm2");
        assert_eq!(known[0].spec_value_num, Some(0.205));
        assert_eq!(known[0].unit.as_deref(), Some("mm2_est"));
    }

    #[test]
    fn test_key_with_unit_is_idempotent() {
        assert_eq!(key_with_unit("rated_voltage", "V"), "rated_voltage_v");
        assert_eq!(key_with_unit("rated_voltage_v", "V"), "rated_voltage_v");
        assert_eq!(key_with_unit("cable_diameter", "mm"), "cable_diameter_mm");
    }
}
