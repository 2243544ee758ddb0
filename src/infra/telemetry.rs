use std::{io, sync::Once};

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Output goes to stderr so that rendered screens on stdout stay clean.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "monk_query_cache_hit_total",
            Unit::Count,
            "Total number of queries answered from a fresh cache entry."
        );
        describe_counter!(
            "monk_query_cache_miss_total",
            Unit::Count,
            "Total number of queries that started a fetch."
        );
        describe_counter!(
            "monk_query_cache_dedup_total",
            Unit::Count,
            "Total number of queries that joined a fetch already in flight."
        );
        describe_counter!(
            "monk_query_cache_evict_total",
            Unit::Count,
            "Total number of cache entries evicted due to capacity."
        );
        describe_counter!(
            "monk_query_fetch_discarded_total",
            Unit::Count,
            "Total number of fetch results dropped because a newer one had settled."
        );
    });
}
