//! Structured JSON logging.
//!
//! Every event becomes a single JSON object on its own line:
//!
//! ```text
//! {"timestamp":"2026-01-01T12:00:00.000000Z","level":"INFO","logger_name":"visitor_book::...","message":"...","event":"..."}
//! ```
//!
//! Event fields are merged in flat next to the four fixed keys, which they can never overwrite.
//! A field recorded as an error keeps its display text under its own name, and its full cause
//! chain is written under `exc_info`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Key holding an error's cause chain.
pub const EXC_INFO: &str = "exc_info";

const TIMESTAMP: &str = "timestamp";
const LEVEL: &str = "level";
const LOGGER_NAME: &str = "logger_name";
const MESSAGE: &str = "message";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("logger already initialised: {0}")]
    AlreadyInitialised(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Event formatter producing one JSON object per line.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormatter;

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut record = Map::new();
        record.insert(
            TIMESTAMP.to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        record.insert(LEVEL.to_string(), Value::String(meta.level().to_string()));
        record.insert(
            LOGGER_NAME.to_string(),
            Value::String(meta.target().to_string()),
        );
        record.insert(
            MESSAGE.to_string(),
            Value::String(fields.message.unwrap_or_default()),
        );
        for (key, value) in fields.values {
            record.entry(key).or_insert(value);
        }
        if let Some(chain) = fields.exc_info {
            record.entry(EXC_INFO.to_string()).or_insert(Value::String(chain));
        }

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: Map<String, Value>,
    exc_info: Option<String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == MESSAGE {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.values.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn StdError + 'static)) {
        self.put(field, Value::String(value.to_string()));
        self.exc_info = Some(cause_chain(value));
    }
}

fn cause_chain(err: &(dyn StdError + 'static)) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str("\nCaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

/// Builds the JSON subscriber over any writer. `filter` uses `EnvFilter` syntax.
pub fn subscriber<W>(
    make_writer: W,
    filter: &str,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(filter)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(JsonFormatter)
        .with_writer(make_writer)
        .finish())
}

/// Installs the process-wide stdout logger. Must run before any other component starts.
pub fn init(filter: &str) -> Result<(), LoggingError> {
    let subscriber = subscriber(std::io::stdout, filter)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
