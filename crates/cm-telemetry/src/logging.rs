//! Subscriber installation and structured logging helpers.
//!
//! Every log line emitted by the channel carries the same field names so
//! output from both ends of a call can be joined on `call_id`:
//! - `name`: call name
//! - `call_id`: unique call identifier
//! - `origin` / `target_origin`: document origins where relevant

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the filter from the configured directive.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::InvalidFilter {
        directive: config.log_level.clone(),
        reason: e.to_string(),
    })
}

fn fmt_layer(config: &TelemetryConfig) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer().with_target(true);

    match (config.json_logs, config.test_writer) {
        (true, false) => layer
            .json()
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (true, true) => layer.json().with_test_writer().boxed(),
        (false, false) => layer.with_ansi(config.ansi).boxed(),
        (false, true) => layer.with_ansi(false).with_test_writer().boxed(),
    }
}

/// Install the global subscriber.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Log a call-related event with the standard `name` / `call_id` fields.
///
/// For hosts and test harnesses embedding the channel. The channel crates
/// do not depend on this crate and write the same fields directly.
///
/// ```rust,ignore
/// log_call_event!(debug, "Request sent", "ping", call_id, target_origin = "*");
/// ```
#[macro_export]
macro_rules! log_call_event {
    ($level:ident, $msg:expr, $name:expr, $call_id:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            name = %$name,
            call_id = %$call_id,
            $($($field)*,)?
            $msg
        )
    };
}
