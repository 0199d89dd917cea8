use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SpecError, SpecResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Ask the table backend for cell grids; false forces text-only heuristics
    pub enable_table_grid: bool,

    /// Minimum run of spaces treated as a column gap when rebuilding grids
    pub grid_min_gap: usize,

    /// File extensions (lowercase, no dot) picked up by the batch entrypoint
    pub document_extensions: Vec<String>,

    /// Emit nothing for unrecognized documents instead of a placeholder
    pub strict: bool,

    /// Largest plausible contact count; larger numbers are never contact counts
    pub max_contact_count: u8,

    /// Half-width (chars) of the window searched around a digit anchor
    pub anchor_window: usize,

    /// Brand names recognized on single-product sheets
    pub known_brands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of parallel document workers (1 = strictly sequential)
    pub parallel_workers: usize,
}

/// One irregular vendor layout: for this exact column set and a key starting
/// with `key_prefix`, `token_count` tokens are spread over `groups` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOverride {
    pub columns: Vec<u8>,
    pub key_prefix: String,
    pub token_count: usize,
    pub groups: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    pub overrides: Vec<LayoutOverride>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            overrides: vec![
                // 3/4/5 share one current rating, 8 and 12 have their own
                LayoutOverride {
                    columns: vec![3, 4, 5, 8, 12],
                    key_prefix: "rated_current".to_string(),
                    token_count: 3,
                    groups: vec![3, 1, 1],
                },
                LayoutOverride {
                    columns: vec![3, 4, 5, 8, 12],
                    key_prefix: "rated_voltage".to_string(),
                    token_count: 3,
                    groups: vec![2, 1, 2],
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub log_dir: PathBuf,
    pub enable_file_logging: bool,
    pub enable_json_format: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            enable_file_logging: false,
            enable_json_format: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig {
                enable_table_grid: true,
                grid_min_gap: 2,
                document_extensions: vec!["pdf".to_string(), "txt".to_string()],
                strict: false,
                max_contact_count: 24,
                anchor_window: 400,
                known_brands: vec!["BINDER".to_string()],
            },
            processing: ProcessingConfig { parallel_workers: 1 },
            matrix: MatrixConfig::default(),
            logging: LogSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SpecResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpecError::file_io(path.display().to_string(), e))?;

        let config: PipelineConfig = toml::from_str(&content)
            .map_err(|e| SpecError::configuration(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `PDSP_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(disable) = std::env::var("PDSP_DISABLE_TABLES") {
            if matches!(disable.to_lowercase().as_str(), "1" | "true" | "yes") {
                self.extraction.enable_table_grid = false;
            }
        }

        if let Ok(strict) = std::env::var("PDSP_STRICT") {
            self.extraction.strict = matches!(strict.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(workers) = std::env::var("PDSP_WORKERS") {
            if let Ok(value) = workers.parse::<usize>() {
                self.processing.parallel_workers = value.max(1);
            }
        }

        if let Ok(level) = std::env::var("PDSP_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SpecResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| SpecError::configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| SpecError::file_io(path.display().to_string(), e))?;

        Ok(())
    }

    pub fn validate(&self) -> SpecResult<()> {
        for rule in &self.matrix.overrides {
            let covered: usize = rule.groups.iter().sum();
            if rule.groups.len() != rule.token_count || covered != rule.columns.len() || rule.groups.contains(&0) {
                return Err(SpecError::configuration(format!(
                    "layout override for '{}' must have {} non-empty groups covering {} columns",
                    rule.key_prefix,
                    rule.token_count,
                    rule.columns.len()
                )));
            }
        }
        if self.extraction.max_contact_count == 0 {
            return Err(SpecError::configuration("max_contact_count must be at least 1"));
        }
        Ok(())
    }
}
