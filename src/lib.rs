//! Datasheet → canonical (product, spec) records.

pub mod assemble;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod provider;

pub use classify::{Classifier, ClassifierSignals, ScoreBreakdown};
pub use config::PipelineConfig;
pub use error::{SpecError, SpecResult};
pub use model::{AppliesTo, DocumentKind, Product, ProductBuilder, Spec};
pub use normalize::{Normalizer, NormalizerTables};
pub use pipeline::{extract_products, Pipeline};
pub use provider::{PageProvider, TableBackend};
