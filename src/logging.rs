use tracing::info;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LogSettings;
#[cfg(feature = "advanced_logging")]
use crate::error::SpecError;
use crate::error::SpecResult;

/// Keeps the non-blocking file writer alive; drop it last in `main`.
pub struct LogGuard {
    #[cfg(feature = "advanced_logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize the logging system
pub fn init_logging(config: &LogSettings) -> SpecResult<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdsp={},lopdf=warn,warn", config.level)));

    let registry = Registry::default().with(env_filter);

    #[cfg(feature = "advanced_logging")]
    {
        if config.enable_file_logging {
            std::fs::create_dir_all(&config.log_dir)
                .map_err(|e| SpecError::file_io(config.log_dir.to_string_lossy().to_string(), e))?;

            let file_appender = tracing_appender::rolling::daily(&config.log_dir, "pdsp.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = if config.enable_json_format {
                fmt::layer().json().with_writer(file_writer).boxed()
            } else {
                fmt::layer().with_writer(file_writer).with_ansi(false).boxed()
            };

            registry.with(file_layer).with(console_layer()).init();
            info!("Log level: {}", config.level);
            info!("File logging enabled: {}", config.log_dir.display());
            return Ok(LogGuard {
                _file_guard: Some(guard),
            });
        }
    }

    registry.with(console_layer()).init();
    info!("Log level: {}", config.level);

    Ok(LogGuard {
        #[cfg(feature = "advanced_logging")]
        _file_guard: None,
    })
}

/// Compact stderr layer shared by both setups
fn console_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .boxed()
}

/// Performance logging utilities
pub struct PerformanceTimer {
    start: std::time::Instant,
    operation: String,
}

impl PerformanceTimer {
    pub fn start(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        tracing::debug!("Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    pub fn checkpoint(&self, checkpoint: &str) {
        let elapsed = self.start.elapsed();
        tracing::debug!("{} - {}: {}ms", self.operation, checkpoint, elapsed.as_millis());
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::debug!("Completed {}: {}ms", self.operation, elapsed.as_millis());
    }
}

/// Macro for logging with context
#[macro_export]
macro_rules! log_error {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            recoverable = $error.is_recoverable(),
            "PDSP error occurred"
        );
    };
}

#[macro_export]
macro_rules! log_document_start {
    ($file:expr, $pages:expr) => {
        tracing::info!(
            file = %$file,
            pages = $pages,
            "Starting datasheet extraction"
        );
    };
}
