use crate::{
    config::{LogFormat, LogRotation, LoggingConfig},
    core::context::{RequestContext, UNKNOWN_LOG_ID},
    error::{AppError, Result},
};
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn, Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Initialize structured logging system
pub fn init_structured_logging() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NONE)
        .with_timer(fmt::time::ChronoUtc::rfc_3339())
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::config(format!("Failed to initialize logging: {}", e)))
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let level = match config.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    let env_filter = EnvFilter::new(level);

    let fmt_layer = match &config.file {
        Some(path) => file_layer(path, &config.rotation)?,
        None => match config.format {
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .json()
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .pretty()
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .with_target(true)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .compact()
                .boxed(),
        },
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::config(format!("Failed to initialize logging: {}", e)))?;

    info!(
        level = level,
        format = ?config.format,
        file = ?config.file,
        "Structured logging initialized with custom configuration"
    );
    Ok(())
}

/// JSON-lines layer writing to `path`, rotated by size.
///
/// The parent directory is created if needed. Once the active file passes
/// `rotation.max_bytes` it is renamed to `<path>.1` (older backups shift up)
/// and at most `rotation.max_backups` rotated files are kept.
pub fn file_layer<S>(
    path: &Path,
    rotation: &LogRotation,
) -> Result<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let compression = if rotation.compress {
        Compression::OnRotate(0)
    } else {
        Compression::None
    };
    let writer = FileRotate::new(
        path,
        AppendCount::new(rotation.max_backups),
        ContentLimit::BytesSurpassed(rotation.max_bytes),
        compression,
        #[cfg(unix)]
        None,
    );

    Ok(fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(writer))
        .with_timer(fmt::time::ChronoUtc::rfc_3339())
        .json()
        .boxed())
}

/// Field whose value is `value` serialized to a JSON string.
pub fn emplace_kv<T: Serialize + ?Sized>(key: &str, value: &T) -> (String, Value) {
    let rendered =
        serde_json::to_string(value).unwrap_or_else(|_| "failed to marshal".to_string());
    (key.to_string(), Value::String(rendered))
}

pub fn error_field(err: &dyn std::error::Error) -> (String, Value) {
    ("error".to_string(), Value::String(err.to_string()))
}

pub fn log_info<I>(ctx: &RequestContext, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, Value)>,
{
    emit(Level::INFO, ctx, message, fields);
}

pub fn log_warn<I>(ctx: &RequestContext, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, Value)>,
{
    emit(Level::WARN, ctx, message, fields);
}

pub fn log_error<I>(ctx: &RequestContext, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, Value)>,
{
    emit(Level::ERROR, ctx, message, fields);
}

fn emit<I>(level: Level, ctx: &RequestContext, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, Value)>,
{
    let log_id = ctx.log_id().unwrap_or(UNKNOWN_LOG_ID);
    let fields = render_fields(fields);

    if level == Level::ERROR {
        error!(log_id = log_id, fields = %fields, "{}", message);
    } else if level == Level::WARN {
        warn!(log_id = log_id, fields = %fields, "{}", message);
    } else {
        info!(log_id = log_id, fields = %fields, "{}", message);
    }
}

fn render_fields<I>(fields: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    Value::Object(fields.into_iter().collect::<Map<String, Value>>())
}
